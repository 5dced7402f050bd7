//! Per-build state and the build result surface.

use std::sync::atomic::Ordering;
use std::time::Instant;

use serde::Serialize;

use strata_config::ResolvedConfig;
use strata_diagnostics::{clean_diagnostics, has_error, Diagnostic};

use crate::ctx::CompilerCtx;
use crate::events::BuildEvent;
use crate::watch::WatcherResults;

/// State for one build, created fresh each time and discarded when the
/// build finishes or aborts.
pub struct BuildCtx {
    /// This build's id; compared against the context's active id at
    /// every phase checkpoint.
    pub build_id: i64,
    /// Full builds skip change-set reconciliation entirely. True for
    /// non-watcher builds, after a config change, and after an errored
    /// build.
    pub requires_full_build: bool,
    /// Diagnostics accumulated across all phases.
    pub diagnostics: Vec<Diagnostic>,
    /// Modules actually transpiled, excluding cache hits.
    pub transpile_build_count: usize,
    /// Styles actually rendered, excluding cache hits.
    pub style_build_count: usize,
    /// Bundles actually generated, excluding reconciliation skips.
    pub bundle_build_count: usize,
    /// Application files whose content changed this build.
    pub app_file_build_count: usize,
    /// Set when the build stopped at a checkpoint.
    pub aborted: bool,
    /// When the build started.
    pub start: Instant,
    /// The change set that triggered this build, if it is a rebuild.
    pub watcher: Option<WatcherResults>,
    /// Tags of the components this build produced.
    pub components: Vec<String>,
    /// Files written by the final commit.
    pub files_written: Vec<String>,
    /// Files copied by the final commit.
    pub files_copied: Vec<String>,
    /// Files deleted by the final commit.
    pub files_deleted: Vec<String>,
    /// Directories deleted by the final commit.
    pub dirs_deleted: Vec<String>,
    /// Directories created by the final commit.
    pub dirs_added: Vec<String>,
}

impl BuildCtx {
    /// Starts a new build on the context: bumps the active build id,
    /// decides whether a full build is needed, and marks the context as
    /// rebuilding when a watcher change set is present.
    pub fn new(ctx: &mut CompilerCtx, watcher: Option<WatcherResults>) -> Self {
        let previous_errored = ctx.last_build_had_error.swap(false, Ordering::SeqCst);
        let requires_full_build = watcher
            .as_ref()
            .map_or(true, |w| w.config_updated)
            || previous_errored;

        ctx.is_rebuild = watcher.is_some();
        let build_id = ctx.active_build_id.fetch_add(1, Ordering::SeqCst) + 1;

        Self {
            build_id,
            requires_full_build,
            diagnostics: Vec::new(),
            transpile_build_count: 0,
            style_build_count: 0,
            bundle_build_count: 0,
            app_file_build_count: 0,
            aborted: false,
            start: Instant::now(),
            watcher,
            components: Vec::new(),
            files_written: Vec::new(),
            files_copied: Vec::new(),
            files_deleted: Vec::new(),
            dirs_deleted: Vec::new(),
            dirs_added: Vec::new(),
        }
    }

    /// The files changed by the triggering change set, or an empty list
    /// for non-watcher builds.
    pub fn files_changed(&self) -> &[String] {
        self.watcher
            .as_ref()
            .map(|w| w.files_changed.as_slice())
            .unwrap_or(&[])
    }
}

/// Checked after every phase. Returns `true` (and marks the build
/// aborted) when a newer build has started, last build wins, or when an
/// error diagnostic is present. An error also flags the context so the
/// next build runs full.
pub fn should_abort(ctx: &CompilerCtx, build_ctx: &mut BuildCtx) -> bool {
    if ctx.active_build_id.load(Ordering::SeqCst) > build_ctx.build_id {
        build_ctx.aborted = true;
        return true;
    }

    if has_error(&build_ctx.diagnostics) {
        ctx.last_build_had_error.store(true, Ordering::SeqCst);
        build_ctx.aborted = true;
        return true;
    }

    false
}

/// What a finished (or aborted) build hands back to the host.
#[derive(Debug, Clone, Serialize)]
pub struct BuildResults {
    /// Id of the build that produced these results.
    pub build_id: i64,
    /// Deduplicated diagnostics from all phases.
    pub diagnostics: Vec<Diagnostic>,
    /// Whether any non-runtime error diagnostic is present.
    pub has_error: bool,
    /// Whether the build stopped at a checkpoint.
    pub aborted: bool,
    /// Detailed stats, present when `build_stats` is enabled.
    pub stats: Option<BuildStats>,
}

/// Detailed per-build stats, useful for testing and debugging.
#[derive(Debug, Clone, Serialize)]
pub struct BuildStats {
    /// Wall-clock build duration in milliseconds.
    pub duration_ms: u64,
    /// Whether this was a watcher-triggered rebuild.
    pub is_rebuild: bool,
    /// Sorted tags of the produced components.
    pub components: Vec<String>,
    /// Modules actually transpiled.
    pub transpile_build_count: usize,
    /// Bundles actually generated.
    pub bundle_build_count: usize,
    /// Styles actually rendered.
    pub style_build_count: usize,
    /// Application files whose content changed.
    pub app_file_build_count: usize,
    /// Sorted files written by the final commit.
    pub files_written: Vec<String>,
    /// Sorted changed files from the triggering change set.
    pub files_changed: Vec<String>,
    /// Sorted updated files from the triggering change set.
    pub files_updated: Vec<String>,
    /// Sorted added files from the triggering change set.
    pub files_added: Vec<String>,
    /// Sorted deleted files from the triggering change set.
    pub files_deleted: Vec<String>,
    /// Sorted added directories from the triggering change set.
    pub dirs_added: Vec<String>,
    /// Sorted deleted directories from the triggering change set.
    pub dirs_deleted: Vec<String>,
    /// Whether the configuration file changed.
    pub config_updated: bool,
}

/// Closes out a build: cleans and prints diagnostics, logs the outcome,
/// assembles the results, and emits the lifecycle events.
pub fn finish_build(
    config: &ResolvedConfig,
    ctx: &CompilerCtx,
    mut build_ctx: BuildCtx,
) -> BuildResults {
    build_ctx.diagnostics = clean_diagnostics(std::mem::take(&mut build_ctx.diagnostics));
    ctx.logger.print_diagnostics(&build_ctx.diagnostics);

    let duration_ms = build_ctx.start.elapsed().as_millis() as u64;
    let build_text = if ctx.is_rebuild { "rebuild" } else { "build" };

    if build_ctx.aborted {
        ctx.logger.debug(format!("{build_text} aborted"));
    } else if has_error(&build_ctx.diagnostics) {
        ctx.logger
            .info(format!("{build_text} failed in {duration_ms} ms"));
    } else {
        ctx.logger
            .info(format!("{build_text} finished in {duration_ms} ms"));
    }

    let stats = config.build_stats.then(|| {
        let sorted = |mut v: Vec<String>| {
            v.sort();
            v
        };
        let watcher = build_ctx.watcher.take().unwrap_or_default();
        BuildStats {
            duration_ms,
            is_rebuild: ctx.is_rebuild,
            components: sorted(std::mem::take(&mut build_ctx.components)),
            transpile_build_count: build_ctx.transpile_build_count,
            bundle_build_count: build_ctx.bundle_build_count,
            style_build_count: build_ctx.style_build_count,
            app_file_build_count: build_ctx.app_file_build_count,
            files_written: sorted(std::mem::take(&mut build_ctx.files_written)),
            files_changed: sorted(watcher.files_changed),
            files_updated: sorted(watcher.files_updated),
            files_added: sorted(watcher.files_added),
            files_deleted: sorted(watcher.files_deleted),
            dirs_added: sorted(watcher.dirs_added),
            dirs_deleted: sorted(watcher.dirs_deleted),
            config_updated: watcher.config_updated,
        }
    });

    let failed = has_error(&build_ctx.diagnostics);
    if failed {
        // covers errors raised after the last phase checkpoint, such as
        // commit-time write failures
        ctx.last_build_had_error.store(true, Ordering::SeqCst);
    }

    let results = BuildResults {
        build_id: build_ctx.build_id,
        has_error: failed,
        diagnostics: build_ctx.diagnostics,
        aborted: build_ctx.aborted,
        stats,
    };

    ctx.events.emit(BuildEvent::Build, &results);
    if ctx.is_rebuild {
        ctx.events.emit(BuildEvent::Rebuild, &results);
    }

    results
}
