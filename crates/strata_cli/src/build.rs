//! `strata build` — runs one full build of the current project.

use strata_build::{build, CompilerCtx};
use strata_diagnostics::Logger;

use crate::pipeline::{load_resolved_config, resolve_project_root};
use crate::{BuildArgs, GlobalArgs};

/// Runs the `strata build` command.
///
/// Returns exit code 0 when the build succeeds and 1 when it reports
/// any error diagnostic.
pub fn run(args: &BuildArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let mut config = load_resolved_config(&root)?;

    if args.no_cache {
        config.enable_cache = false;
    }
    if args.stats {
        config.build_stats = true;
    }

    let logger = Logger::new(global.log_level());
    let mut ctx = CompilerCtx::new(&config, logger);

    let results = build(&config, &mut ctx, None);

    if args.stats {
        if let Some(stats) = &results.stats {
            println!("{}", serde_json::to_string_pretty(stats)?);
        }
    }

    Ok(if results.has_error { 1 } else { 0 })
}
