//! Output staging: destination dir resets, asset copying, and the final
//! commit of the write buffer to disk.

use strata_common::StrataResult;
use strata_common::paths::join;
use strata_config::ResolvedConfig;
use strata_diagnostics::build_error;

use crate::build_ctx::BuildCtx;
use crate::bundle::Bundle;
use crate::ctx::CompilerCtx;

/// Empties the enabled destination directories and commits the removal.
///
/// Runs at the start of full builds only; rebuilds write over the
/// previous output in place.
pub fn empty_dest_dirs(config: &ResolvedConfig, ctx: &CompilerCtx) {
    if config.generate_www && config.empty_www {
        ctx.fs.empty_dir(&config.build_dir);
    }
    if config.generate_dist && config.empty_dist {
        ctx.fs.empty_dir(&config.dist_dir);
    }
    ctx.fs.commit();
}

/// Queues a copy of `src/assets` into the www build output, when the
/// directory exists.
pub fn copy_assets(config: &ResolvedConfig, ctx: &CompilerCtx) -> StrataResult<()> {
    if !config.generate_www {
        return Ok(());
    }

    let assets_dir = join(&config.src_dir, "assets");
    if !ctx.fs.access(&assets_dir) {
        return Ok(());
    }

    ctx.fs
        .copy(&assets_dir, &join(&config.build_dir, "assets"), None)
        .map_err(|err| format!("asset copy failed: {err}").into())
}

/// Flushes the write buffer to disk and records the commit on the
/// build context.
///
/// When the distribution output is enabled, the committed www build
/// directory is then copied into `dist_dir` and committed in a second
/// pass. Individual commit failures become error diagnostics without
/// stopping sibling operations; the files that did land stay landed.
/// Ends by committing the cache for the next session.
pub fn write_build(
    config: &ResolvedConfig,
    ctx: &CompilerCtx,
    build_ctx: &mut BuildCtx,
    bundles: &[Bundle],
) {
    let mut components: Vec<String> = bundles
        .iter()
        .flat_map(|b| b.module_files.iter())
        .filter_map(|m| m.cmp_meta.as_ref().map(|meta| meta.tag.clone()))
        .collect();
    components.sort();
    components.dedup();
    build_ctx.components = components;

    let mut results = ctx.fs.commit();

    if config.generate_dist {
        match ctx.fs.copy(&config.build_dir, &config.dist_dir, None) {
            Ok(()) => {
                let dist = ctx.fs.commit();
                results.files_copied.extend(dist.files_copied);
                results.dirs_added.extend(dist.dirs_added);
                results.errors.extend(dist.errors);
            }
            Err(err) => results.errors.push(format!("distribution copy: {err}")),
        }
    }

    ctx.logger.debug(format!(
        "write build files finished, files written: {}",
        results.files_written.len()
    ));

    for error in &results.errors {
        let d = build_error(&mut build_ctx.diagnostics);
        d.header = "write error".to_string();
        d.message = error.clone();
    }

    build_ctx.files_written = results.files_written;
    build_ctx.files_copied = results.files_copied;
    build_ctx.files_deleted = results.files_deleted;
    build_ctx.dirs_deleted = results.dirs_deleted;
    build_ctx.dirs_added = results.dirs_added;

    ctx.cache.commit();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_ctx::BuildCtx;
    use std::sync::Arc;
    use strata_config::load_config_from_str;
    use strata_diagnostics::{has_error, Logger};
    use strata_fs::{DiskFs, NativeFs, VirtualFs};
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ResolvedConfig, CompilerCtx) {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        let parsed = load_config_from_str(
            r#"
[project]
name = "demo"
namespace = "Demo"
"#,
        )
        .unwrap();
        let config = ResolvedConfig::new(&parsed, tmp.path());

        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        let fs = Arc::new(VirtualFs::new(disk));
        let ctx = CompilerCtx::with_fs(&config, Logger::default(), fs);
        (tmp, config, ctx)
    }

    #[test]
    fn empty_dest_dirs_clears_stale_output() {
        let (tmp, config, ctx) = fixture();
        let stale = tmp.path().join("www/build/stale.js");
        std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
        std::fs::write(&stale, "old").unwrap();

        empty_dest_dirs(&config, &ctx);

        assert!(!stale.exists());
        assert!(tmp.path().join("www/build").exists());
    }

    #[test]
    fn copy_assets_is_a_no_op_without_assets_dir() {
        let (_tmp, config, ctx) = fixture();
        copy_assets(&config, &ctx).unwrap();
        let results = ctx.fs.commit();
        assert!(results.files_copied.is_empty());
    }

    #[test]
    fn copy_assets_lands_under_build_output() {
        let (tmp, config, ctx) = fixture();
        std::fs::create_dir_all(tmp.path().join("src/assets/icons")).unwrap();
        std::fs::write(tmp.path().join("src/assets/icons/logo.svg"), "<svg/>").unwrap();

        copy_assets(&config, &ctx).unwrap();
        let results = ctx.fs.commit();

        assert_eq!(results.files_copied.len(), 1);
        assert!(tmp.path().join("www/build/assets/icons/logo.svg").exists());
    }

    #[test]
    fn write_build_copies_into_distribution() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();
        let parsed = load_config_from_str(
            r#"
[project]
name = "demo"
namespace = "Demo"

[build]
generate_dist = true
"#,
        )
        .unwrap();
        let config = ResolvedConfig::new(&parsed, tmp.path());
        let disk: Arc<dyn DiskFs> = Arc::new(NativeFs);
        let fs = Arc::new(VirtualFs::new(disk));
        let mut ctx = CompilerCtx::with_fs(&config, Logger::default(), fs);

        ctx.fs
            .write_file(&join(&config.build_dir, "demo.core.js"), "// core");

        let mut build_ctx = BuildCtx::new(&mut ctx, None);
        write_build(&config, &ctx, &mut build_ctx, &[]);

        assert!(tmp.path().join("dist/demo.core.js").exists());
        assert_eq!(build_ctx.files_copied, vec![join(&config.dist_dir, "demo.core.js")]);
    }

    #[test]
    fn commit_write_failure_is_a_build_error() {
        let (tmp, config, mut ctx) = fixture();
        std::fs::write(tmp.path().join("www"), "in the way").unwrap();

        ctx.fs
            .write_file(&join(&config.build_dir, "demo.core.js"), "// core");

        let mut build_ctx = BuildCtx::new(&mut ctx, None);
        write_build(&config, &ctx, &mut build_ctx, &[]);

        assert!(build_ctx.files_written.is_empty());
        assert!(!tmp.path().join("www/build/demo.core.js").exists());
        assert!(has_error(&build_ctx.diagnostics));
    }

    #[test]
    fn write_build_records_commit_results() {
        let (tmp, config, mut ctx) = fixture();
        ctx.fs
            .write_file(&join(&config.build_dir, "demo.core.js"), "// core");

        let mut build_ctx = BuildCtx::new(&mut ctx, None);
        write_build(&config, &ctx, &mut build_ctx, &[]);

        assert_eq!(build_ctx.files_written.len(), 1);
        assert!(tmp.path().join("www/build/demo.core.js").exists());
        assert!(build_ctx.diagnostics.is_empty());
    }
}
