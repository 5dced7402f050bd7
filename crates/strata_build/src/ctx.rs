//! The process-scoped compiler context.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use strata_cache::Cache;
use strata_config::ResolvedConfig;
use strata_diagnostics::Logger;
use strata_fs::{DiskFs, NativeFs, VirtualFs};

use crate::events::BuildEvents;

/// Component metadata extracted from a `@Component({...})` decorator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeta {
    /// The custom element tag name.
    pub tag: String,
    /// Path to an external stylesheet, relative to the source file.
    pub style_url: Option<String>,
    /// Inline styles declared directly in the decorator.
    pub styles: Option<String>,
}

/// One scanned and transpiled source module.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFile {
    /// Normalized absolute path of the source file.
    pub src_path: String,
    /// The transpiled module text.
    pub js_text: String,
    /// Component metadata, when the module declares a component.
    pub cmp_meta: Option<ComponentMeta>,
}

/// Long-lived state shared by every build in a session.
///
/// The context owns the virtual filesystem, the transformation cache,
/// the event bus, and the per-entry-key output caches that make rebuilds
/// cheap. It is constructed explicitly by the host and passed into each
/// [`build`](crate::build()); there is no module-level state.
pub struct CompilerCtx {
    /// The shared write-buffered filesystem.
    pub fs: Arc<VirtualFs>,
    /// The content-addressed transformation cache.
    pub cache: Cache,
    /// Build lifecycle events.
    pub events: BuildEvents,
    /// Progress and diagnostic logging.
    pub logger: Logger,
    /// Id of the most recently started build. Starts at -1; a build
    /// whose id falls behind this aborts at its next checkpoint.
    pub active_build_id: AtomicI64,
    /// Whether the current build was triggered by the watcher.
    pub is_rebuild: bool,
    /// Whether the previous build finished with an error diagnostic.
    /// Forces the next build to be a full build.
    pub last_build_had_error: AtomicBool,
    /// Scanned modules keyed by source path.
    pub module_files: HashMap<String, ModuleFile>,
    /// Generated bundle output keyed by entry key.
    pub compiled_module_text: HashMap<String, String>,
    /// Generated application files keyed by file name, used to count
    /// which app files actually changed between builds.
    pub app_files: HashMap<String, String>,
}

impl CompilerCtx {
    /// Creates a context over the native filesystem.
    pub fn new(config: &ResolvedConfig, logger: Logger) -> Self {
        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        Self::with_fs(config, logger, Arc::new(VirtualFs::new(disk)))
    }

    /// Creates a context over an existing virtual filesystem.
    pub fn with_fs(config: &ResolvedConfig, logger: Logger, fs: Arc<VirtualFs>) -> Self {
        let cache = Cache::new(fs.clone(), &config.cache_dir, config.enable_cache, logger);
        Self {
            fs,
            cache,
            events: BuildEvents::new(),
            logger,
            active_build_id: AtomicI64::new(-1),
            is_rebuild: false,
            last_build_had_error: AtomicBool::new(false),
            module_files: HashMap::new(),
            compiled_module_text: HashMap::new(),
            app_files: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use strata_config::load_config_from_str;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> ResolvedConfig {
        let parsed = load_config_from_str(
            r#"
[project]
name = "demo"
namespace = "Demo"
"#,
        )
        .unwrap();
        ResolvedConfig::new(&parsed, dir.path())
    }

    #[test]
    fn fresh_context_has_no_builds() {
        let tmp = TempDir::new().unwrap();
        let ctx = CompilerCtx::new(&test_config(&tmp), Logger::default());

        assert_eq!(ctx.active_build_id.load(Ordering::SeqCst), -1);
        assert!(!ctx.is_rebuild);
        assert!(ctx.module_files.is_empty());
        assert!(ctx.cache.enabled());
    }
}
