//! The style/asset plugin contract and its runners.

use strata_cache::Cache;
use strata_common::{InternalError, StrataResult};
use strata_config::ResolvedConfig;
use strata_diagnostics::{catch_error, Diagnostic};
use strata_fs::VirtualFs;

/// Everything a plugin may consult while running.
pub struct PluginOpts<'a> {
    /// The id (usually a file path) being processed.
    pub id: &'a str,
    /// The running code for transforms; empty for resolve and load.
    pub code: &'a str,
    /// The shared virtual filesystem.
    pub fs: &'a VirtualFs,
    /// The transformation cache.
    pub cache: &'a Cache,
    /// The resolved project configuration.
    pub config: &'a ResolvedConfig,
    /// Files changed by the triggering change set.
    pub files_changed: &'a [String],
}

/// A transform step's output. `None` fields leave the running value
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformResults {
    /// Replacement code, if the plugin rewrote it.
    pub code: Option<String>,
    /// Replacement id, if the plugin redirected it.
    pub id: Option<String>,
}

/// A pipeline plugin.
///
/// Each hook returns `None` when the plugin does not apply to the given
/// id, letting the runner move on to the next plugin.
pub trait Plugin: Send + Sync {
    /// Name used in diagnostics when this plugin fails.
    fn name(&self) -> &str;

    /// Maps an id to the id that should actually be loaded.
    fn resolve_id(&self, _opts: &PluginOpts<'_>) -> Option<String> {
        None
    }

    /// Produces the initial code for an id.
    fn load(&self, _opts: &PluginOpts<'_>) -> Option<StrataResult<String>> {
        None
    }

    /// Rewrites the running code and/or id.
    fn transform(&self, _opts: &PluginOpts<'_>) -> Option<StrataResult<TransformResults>> {
        None
    }
}

/// The plugin set plus the shared state its hooks run against.
pub struct PluginHost<'a> {
    /// Applicable plugins, in registration order.
    pub plugins: &'a [Box<dyn Plugin>],
    /// The shared virtual filesystem.
    pub fs: &'a VirtualFs,
    /// The transformation cache.
    pub cache: &'a Cache,
    /// The resolved project configuration.
    pub config: &'a ResolvedConfig,
    /// Files changed by the triggering change set.
    pub files_changed: &'a [String],
}

impl PluginHost<'_> {
    fn opts<'b>(&'b self, id: &'b str, code: &'b str) -> PluginOpts<'b> {
        PluginOpts {
            id,
            code,
            fs: self.fs,
            cache: self.cache,
            config: self.config,
            files_changed: self.files_changed,
        }
    }

    /// Resolves an id: the first plugin with an answer wins; an
    /// unresolved id passes through unchanged.
    pub fn run_resolve_id(&self, id: &str) -> String {
        let opts = self.opts(id, "");
        for plugin in self.plugins {
            if let Some(resolved) = plugin.resolve_id(&opts) {
                return resolved;
            }
        }
        id.to_string()
    }

    /// Loads the initial code for an id: the first plugin with an
    /// answer wins. A load failure is a real error, there is no code to
    /// fall back to.
    pub fn run_load(&self, id: &str) -> StrataResult<String> {
        let opts = self.opts(id, "");
        for plugin in self.plugins {
            if let Some(result) = plugin.load(&opts) {
                return result;
            }
        }
        Err(InternalError::new(format!("no plugin loaded {id}")))
    }

    /// Resolves, loads, and then chains every applicable transform in
    /// registration order. A failing transform is recorded as a
    /// diagnostic named after the plugin and the chain continues with
    /// the last good code.
    pub fn run_transforms(
        &self,
        diagnostics: &mut Vec<Diagnostic>,
        id: &str,
    ) -> StrataResult<TransformOutput> {
        let mut current_id = self.run_resolve_id(id);
        let mut code = self.run_load(&current_id)?;

        for plugin in self.plugins {
            let opts = self.opts(&current_id, &code);
            match plugin.transform(&opts) {
                None => {}
                Some(Ok(results)) => {
                    if let Some(new_code) = results.code {
                        code = new_code;
                    }
                    if let Some(new_id) = results.id {
                        current_id = new_id;
                    }
                }
                Some(Err(err)) => {
                    catch_error(diagnostics, plugin.name(), err);
                }
            }
        }

        Ok(TransformOutput {
            code,
            id: current_id,
        })
    }
}

/// The final code and id after the whole transform chain.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// The transformed code.
    pub code: String,
    /// The final id, possibly redirected by a plugin.
    pub id: String,
}
