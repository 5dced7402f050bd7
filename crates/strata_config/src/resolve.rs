//! Resolution of a parsed configuration against the project directory.

use crate::types::ProjectConfig;
use std::path::Path;
use strata_common::paths::{is_under, join, normalize_path};

/// A fully resolved configuration with normalized absolute directories.
///
/// This is the view the build pipeline works against; the raw
/// [`ProjectConfig`] is only an intermediate parse result.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The project name.
    pub name: String,
    /// Namespace prefix for emitted application files.
    pub namespace: String,
    /// Normalized absolute project root.
    pub project_dir: String,
    /// Normalized absolute source directory.
    pub src_dir: String,
    /// Normalized absolute web root.
    pub www_dir: String,
    /// Normalized absolute build output directory.
    pub build_dir: String,
    /// Normalized absolute distribution directory.
    pub dist_dir: String,
    /// Normalized absolute cache directory.
    pub cache_dir: String,
    /// Whether to emit web root output.
    pub generate_www: bool,
    /// Whether to empty the build directory on the first build.
    pub empty_www: bool,
    /// Whether to emit a distribution copy.
    pub generate_dist: bool,
    /// Whether to empty the distribution directory on the first build.
    pub empty_dist: bool,
    /// Whether the transformation cache is enabled.
    pub enable_cache: bool,
    /// Whether to minify compiled CSS.
    pub minify_css: bool,
    /// Whether to attach detailed stats to build results.
    pub build_stats: bool,
    /// Explicit component groupings; each inner vec is one bundle.
    pub bundles: Vec<Vec<String>>,
}

impl ResolvedConfig {
    /// Resolves a parsed configuration against the given project directory.
    pub fn new(config: &ProjectConfig, project_dir: &Path) -> Self {
        let root = normalize_path(&project_dir.to_string_lossy());
        Self {
            name: config.project.name.clone(),
            namespace: config.project.namespace.clone(),
            src_dir: absolutize(&root, &config.paths.src_dir),
            www_dir: absolutize(&root, &config.paths.www_dir),
            build_dir: absolutize(&root, &config.paths.build_dir),
            dist_dir: absolutize(&root, &config.paths.dist_dir),
            cache_dir: absolutize(&root, &config.build.cache_dir),
            project_dir: root,
            generate_www: config.build.generate_www,
            empty_www: config.build.empty_www,
            generate_dist: config.build.generate_dist,
            empty_dist: config.build.empty_dist,
            enable_cache: config.build.enable_cache,
            minify_css: config.build.minify_css,
            build_stats: config.build.build_stats,
            bundles: config.bundles.iter().map(|b| b.components.clone()).collect(),
        }
    }

    /// Returns `path` relative to the project root when it lies beneath it.
    pub fn rel_path(&self, path: &str) -> Option<String> {
        strata_common::paths::rel_from(&self.project_dir, path)
    }
}

/// Joins a possibly-relative configured path onto the project root.
fn absolutize(root: &str, configured: &str) -> String {
    let normalized = normalize_path(configured);
    if normalized.starts_with('/') || normalized.contains(":/") || is_under(root, &normalized) {
        normalized
    } else {
        join(root, &normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    fn resolved() -> ResolvedConfig {
        let config = load_config_from_str(
            r#"
[project]
name = "my-app"
namespace = "App"
"#,
        )
        .unwrap();
        ResolvedConfig::new(&config, Path::new("/projects/my-app"))
    }

    #[test]
    fn directories_are_absolutized() {
        let rc = resolved();
        assert_eq!(rc.project_dir, "/projects/my-app");
        assert_eq!(rc.src_dir, "/projects/my-app/src");
        assert_eq!(rc.build_dir, "/projects/my-app/www/build");
        assert_eq!(rc.cache_dir, "/projects/my-app/.strata/cache");
    }

    #[test]
    fn absolute_configured_paths_kept() {
        let config = load_config_from_str(
            r#"
[project]
name = "my-app"
namespace = "App"

[paths]
src_dir = "/elsewhere/src"
"#,
        )
        .unwrap();
        let rc = ResolvedConfig::new(&config, Path::new("/projects/my-app"));
        assert_eq!(rc.src_dir, "/elsewhere/src");
    }

    #[test]
    fn rel_path_under_root() {
        let rc = resolved();
        assert_eq!(
            rc.rel_path("/projects/my-app/src/a.tsx"),
            Some("src/a.tsx".to_string())
        );
        assert_eq!(rc.rel_path("/other/a.tsx"), None);
    }
}
