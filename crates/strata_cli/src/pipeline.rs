//! Shared helpers for CLI commands: project root resolution and
//! configuration loading.

use std::path::{Path, PathBuf};

use strata_config::{load_config, ResolvedConfig};

use crate::GlobalArgs;

/// Walks up from `start` looking for the nearest directory containing
/// `strata.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join("strata.toml").exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find strata.toml in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir,
/// dir → itself). Otherwise walks up from the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|parent| parent.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else if p.is_dir() {
            Ok(p)
        } else {
            Err(format!("config path '{config_path}' does not exist").into())
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Loads and resolves the project configuration from the given root.
pub fn load_resolved_config(root: &Path) -> Result<ResolvedConfig, Box<dyn std::error::Error>> {
    let config = load_config(root)?;
    Ok(ResolvedConfig::new(&config, root))
}
