//! Parsing and validation of `strata.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a
//! strongly-typed [`ProjectConfig`], then resolves it against the project
//! directory into a [`ResolvedConfig`] of normalized absolute paths.
//!
//! Configuration problems are fatal: they are reported before any build
//! context exists and are never retried.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str};
pub use resolve::ResolvedConfig;
pub use types::*;
