//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::HashSet;
use std::path::Path;

/// Loads and validates a `strata.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join("strata.toml");
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `strata.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and bundle groupings are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.namespace.is_empty() {
        return Err(ConfigError::MissingField("project.namespace".to_string()));
    }

    let mut seen = HashSet::new();
    for bundle in &config.bundles {
        if bundle.components.is_empty() {
            return Err(ConfigError::ValidationError(
                "bundle with empty component list".to_string(),
            ));
        }
        for tag in &bundle.components {
            if !seen.insert(tag.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "component '{tag}' appears in more than one bundle"
                )));
            }
        }
    }

    Ok(())
}
