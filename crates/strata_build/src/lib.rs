//! The incremental build pipeline.
//!
//! A build runs as a sequence of phases over a process-scoped
//! [`CompilerCtx`]: scan and transpile component sources, resolve and
//! generate bundles, render styles, assemble the application files, and
//! finally commit everything through the virtual filesystem in one
//! write-elided pass. Rebuilds reuse the caches on the context and a
//! change-set reconciliation step to skip work that cannot have been
//! affected.
//!
//! Builds never fail outward: every phase error becomes a diagnostic on
//! the [`BuildResults`], and a build superseded by a newer one simply
//! stops at the next phase checkpoint.

#![warn(missing_docs)]

mod app;
mod build;
mod build_ctx;
mod bundle;
mod ctx;
mod events;
mod plugin;
mod plugins;
mod reconcile;
mod scan;
mod style;
mod watch;
mod write;

pub use build::build;
pub use build_ctx::{should_abort, BuildCtx, BuildResults, BuildStats};
pub use bundle::Bundle;
pub use ctx::{CompilerCtx, ComponentMeta, ModuleFile};
pub use events::{BuildEvent, BuildEvents, SubscriptionId};
pub use plugin::{Plugin, PluginHost, PluginOpts, TransformOutput, TransformResults};
pub use plugins::builtin_plugins;
pub use reconcile::{can_skip_bundle, is_css_file, is_dts_file, is_sass_file, is_ts_file};
pub use watch::{WatchEvent, WatcherResults};
