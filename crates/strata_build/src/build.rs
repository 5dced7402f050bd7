//! The build orchestrator: runs every phase in order with abort checks
//! between them, so a newer build or a hard error stops the pipeline at
//! the next phase boundary instead of mid-phase.

use strata_config::ResolvedConfig;
use strata_diagnostics::catch_error;

use crate::app::generate_app_files;
use crate::build_ctx::{finish_build, should_abort, BuildCtx, BuildResults};
use crate::bundle::{generate_bundle_modules, resolve_bundles};
use crate::ctx::CompilerCtx;
use crate::plugins::builtin_plugins;
use crate::scan::scan;
use crate::style::generate_styles;
use crate::watch::WatcherResults;
use crate::write::{copy_assets, empty_dest_dirs, write_build};

/// Runs one build from source scan to committed output.
///
/// Never returns `Err` and never panics: phase failures become
/// diagnostics on the result, and the result's `aborted` flag reports
/// whether a newer build superseded this one. Pass `watcher` results
/// to run an incremental rebuild; `None` is a cold full build.
pub fn build(
    config: &ResolvedConfig,
    ctx: &mut CompilerCtx,
    watcher: Option<WatcherResults>,
) -> BuildResults {
    let mut build_ctx = BuildCtx::new(ctx, watcher);

    if build_ctx.build_id == 0 {
        ctx.logger.info(format!(
            "{} v{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ));
    }

    let plugins = builtin_plugins();

    if build_ctx.requires_full_build {
        empty_dest_dirs(config, ctx);
    }

    if let Err(err) = scan(config, ctx, &mut build_ctx) {
        catch_error(&mut build_ctx.diagnostics, "scan", err);
    }
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    let mut bundles = resolve_bundles(&config.bundles, ctx, &mut build_ctx.diagnostics);
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    generate_bundle_modules(ctx, &mut build_ctx, &mut bundles);
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    if let Err(err) = generate_styles(config, ctx, &mut build_ctx, &mut bundles, &plugins) {
        catch_error(&mut build_ctx.diagnostics, "style", err);
    }
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    if let Err(err) = generate_app_files(config, ctx, &mut build_ctx, &bundles) {
        catch_error(&mut build_ctx.diagnostics, "app", err);
    }
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    if build_ctx.requires_full_build {
        if let Err(err) = copy_assets(config, ctx) {
            catch_error(&mut build_ctx.diagnostics, "assets", err);
        }
    }
    if should_abort(ctx, &mut build_ctx) {
        return finish_build(config, ctx, build_ctx);
    }

    write_build(config, ctx, &mut build_ctx, &bundles);

    finish_build(config, ctx, build_ctx)
}
