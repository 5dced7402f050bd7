//! Strata CLI — the command-line interface for the Strata component
//! compiler.
//!
//! Provides `strata init` for project scaffolding and `strata build`
//! for running a build of the current project.

#![warn(missing_docs)]

mod build;
mod init;
mod pipeline;

use std::process;

use clap::{Parser, Subcommand};

use strata_diagnostics::LogLevel;

/// Strata — an incremental web-component compiler.
#[derive(Parser, Debug)]
#[command(name = "strata", version, about = "Strata component compiler")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `strata.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new Strata project.
    Init {
        /// Project name (creates a subdirectory). If omitted,
        /// initializes in the current directory.
        name: Option<String>,
    },
    /// Build the current project.
    Build(BuildArgs),
}

/// Arguments for the `strata build` subcommand.
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Print per-phase build statistics after the build.
    #[arg(long)]
    pub stats: bool,

    /// Disable the on-disk cache for this build.
    #[arg(long)]
    pub no_cache: bool,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

impl GlobalArgs {
    /// The log level implied by the quiet/verbose flags.
    pub fn log_level(&self) -> LogLevel {
        if self.quiet {
            LogLevel::Error
        } else if self.verbose {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let result = match cli.command {
        Command::Init { name } => init::run(name),
        Command::Build(ref args) => build::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
