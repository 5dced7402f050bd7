//! Change-set reconciliation: deciding which bundles a rebuild can skip.

use strata_common::paths::{file_name, file_stem};

use crate::build_ctx::BuildCtx;
use crate::bundle::Bundle;
use crate::ctx::{CompilerCtx, ModuleFile};

/// Whether a path is a TypeScript source file, `.ts` or `.tsx`.
/// Declaration files and spec files are not sources.
pub fn is_ts_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let parts: Vec<&str> = lower.split('.').collect();
    if parts.len() < 2 {
        return false;
    }
    let ext = parts[parts.len() - 1];
    if ext != "ts" && ext != "tsx" {
        return false;
    }
    if parts.len() > 2 {
        let penultimate = parts[parts.len() - 2];
        if penultimate == "d" || penultimate == "spec" {
            return false;
        }
    }
    true
}

/// Whether a path is a TypeScript declaration file (`.d.ts`).
pub fn is_dts_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    let parts: Vec<&str> = lower.split('.').collect();
    parts.len() > 2 && parts[parts.len() - 2] == "d" && parts[parts.len() - 1] == "ts"
}

/// Whether a path is a plain CSS file.
pub fn is_css_file(path: &str) -> bool {
    matches!(
        path.rsplit('.').next().map(str::to_lowercase).as_deref(),
        Some("css")
    )
}

/// Whether a path is a Sass file.
pub fn is_sass_file(path: &str) -> bool {
    matches!(
        path.rsplit('.').next().map(str::to_lowercase).as_deref(),
        Some("scss") | Some("sass")
    )
}

/// Whether a rebuild can reuse the cached output for `bundle`.
///
/// Skipping is only legal when all of these hold:
/// - this is not a full build,
/// - a cached output exists for the bundle's entry key,
/// - no changed TypeScript file is unknown to the module map (an
///   unknown source could be a shared dependency of anything, so it
///   forces every bundle to regenerate),
/// - no changed file's base name matches a module in this bundle.
pub fn can_skip_bundle(ctx: &CompilerCtx, build_ctx: &BuildCtx, bundle: &Bundle) -> bool {
    if build_ctx.requires_full_build {
        return false;
    }

    if !ctx.compiled_module_text.contains_key(&bundle.entry_key) {
        return false;
    }

    let changed = build_ctx.files_changed();
    if !changed.iter().any(|f| is_ts_file(f)) {
        return true;
    }

    let unknown_ts_change = changed
        .iter()
        .any(|f| is_ts_file(f) && !ctx.module_files.contains_key(f.as_str()));
    if unknown_ts_change {
        return false;
    }

    !bundle_contains_changed_file(&bundle.module_files, changed)
}

/// Extension-insensitive stem match between a bundle's modules and the
/// changed files. Two unrelated files can share a stem; the worst case
/// is a redundant regeneration, never a stale one.
fn bundle_contains_changed_file(module_files: &[ModuleFile], changed: &[String]) -> bool {
    module_files.iter().any(|module| {
        let stem = file_stem(&module.src_path);
        changed.iter().any(|f| {
            let name = file_name(f);
            name == format!("{stem}.ts") || name == format!("{stem}.tsx")
        })
    })
}
