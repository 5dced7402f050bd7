//! Bundle resolution and module generation.

use std::collections::BTreeMap;

use rayon::prelude::*;

use strata_diagnostics::{build_error, Diagnostic};

use crate::build_ctx::BuildCtx;
use crate::ctx::{CompilerCtx, ModuleFile};
use crate::reconcile::can_skip_bundle;

/// A group of components generated as one output unit.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Stable identity: the sorted member tags joined by `.`.
    pub entry_key: String,
    /// The member modules, sorted by tag.
    pub module_files: Vec<ModuleFile>,
    /// The generated (or cache-reused) module text.
    pub compiled_module_text: String,
    /// Rendered CSS per member tag, filled in by the styles phase.
    pub styles: BTreeMap<String, String>,
}

/// Resolves the configured component groupings against the scanned
/// modules. Components not claimed by any configured bundle each get a
/// bundle of their own. A configured tag with no matching component is
/// a build error. The result is sorted by entry key.
pub fn resolve_bundles(
    config_bundles: &[Vec<String>],
    ctx: &CompilerCtx,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Bundle> {
    let mut by_tag: BTreeMap<String, ModuleFile> = BTreeMap::new();
    for module in ctx.module_files.values() {
        if let Some(meta) = &module.cmp_meta {
            by_tag.insert(meta.tag.clone(), module.clone());
        }
    }

    let mut claimed: Vec<String> = Vec::new();
    let mut bundles: Vec<Bundle> = Vec::new();

    for components in config_bundles {
        let mut module_files = Vec::new();
        for tag in components {
            match by_tag.get(tag) {
                Some(module) => {
                    module_files.push(module.clone());
                    claimed.push(tag.clone());
                }
                None => {
                    build_error(diagnostics).message = format!(
                        "component tag \"{tag}\" is defined in a bundle but no matching component was found"
                    );
                }
            }
        }
        if !module_files.is_empty() {
            bundles.push(new_bundle(module_files));
        }
    }

    for (tag, module) in &by_tag {
        if !claimed.contains(tag) {
            bundles.push(new_bundle(vec![module.clone()]));
        }
    }

    bundles.sort_by(|a, b| a.entry_key.cmp(&b.entry_key));
    bundles
}

fn new_bundle(mut module_files: Vec<ModuleFile>) -> Bundle {
    module_files.sort_by(|a, b| tag_of(a).cmp(tag_of(b)));
    let entry_key = module_files
        .iter()
        .map(|m| tag_of(m).to_string())
        .collect::<Vec<_>>()
        .join(".");

    Bundle {
        entry_key,
        module_files,
        compiled_module_text: String::new(),
        styles: BTreeMap::new(),
    }
}

fn tag_of(module: &ModuleFile) -> &str {
    module
        .cmp_meta
        .as_ref()
        .map(|m| m.tag.as_str())
        .unwrap_or(&module.src_path)
}

/// Generates the module text for every bundle, in parallel, reusing the
/// context cache for bundles the reconciliation step can skip.
pub fn generate_bundle_modules(
    ctx: &mut CompilerCtx,
    build_ctx: &mut BuildCtx,
    bundles: &mut [Bundle],
) {
    // reconciliation first, against the immutable context
    let skip: Vec<bool> = bundles
        .iter()
        .map(|bundle| can_skip_bundle(ctx, build_ctx, bundle))
        .collect();

    let generated: Vec<Option<String>> = bundles
        .par_iter()
        .zip(skip.par_iter())
        .map(|(bundle, skipped)| {
            if *skipped {
                None
            } else {
                Some(generate_module_text(bundle))
            }
        })
        .collect();

    for ((bundle, skipped), text) in bundles.iter_mut().zip(skip).zip(generated) {
        match text {
            Some(text) => {
                build_ctx.bundle_build_count += 1;
                ctx.compiled_module_text
                    .insert(bundle.entry_key.clone(), text.clone());
                bundle.compiled_module_text = text;
            }
            None => {
                debug_assert!(skipped);
                bundle.compiled_module_text = ctx
                    .compiled_module_text
                    .get(&bundle.entry_key)
                    .cloned()
                    .unwrap_or_default();
            }
        }
    }
}

fn generate_module_text(bundle: &Bundle) -> String {
    let mut text = format!("/* bundle: {} */\n", bundle.entry_key);
    for module in &bundle.module_files {
        text.push_str(&module.js_text);
    }
    text
}
