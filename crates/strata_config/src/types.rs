//! Configuration types deserialized from `strata.toml`.

use serde::Deserialize;

/// The top-level project configuration parsed from `strata.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, namespace).
    pub project: ProjectMeta,
    /// Source and output directory layout.
    #[serde(default)]
    pub paths: PathsConfig,
    /// Build behavior settings.
    #[serde(default)]
    pub build: BuildSettings,
    /// Explicit component groupings compiled into single output bundles.
    /// Components not listed in any bundle get a bundle of their own.
    #[serde(default)]
    pub bundles: Vec<BundleConfig>,
}

/// Core project metadata required in every `strata.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// Namespace prefix for the emitted application files
    /// (`<namespace>.js`, `<namespace>.core.js`, ...).
    pub namespace: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Source and output directory layout, relative to the project root.
#[derive(Debug, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for component sources.
    #[serde(default = "default_src_dir")]
    pub src_dir: String,
    /// Web root the application is served from.
    #[serde(default = "default_www_dir")]
    pub www_dir: String,
    /// Directory the compiled app files are written to.
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    /// Directory the distribution copy is written to.
    #[serde(default = "default_dist_dir")]
    pub dist_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            www_dir: default_www_dir(),
            build_dir: default_build_dir(),
            dist_dir: default_dist_dir(),
        }
    }
}

fn default_src_dir() -> String {
    "src".to_string()
}

fn default_www_dir() -> String {
    "www".to_string()
}

fn default_build_dir() -> String {
    "www/build".to_string()
}

fn default_dist_dir() -> String {
    "dist".to_string()
}

/// Build behavior settings.
#[derive(Debug, Deserialize)]
pub struct BuildSettings {
    /// Whether to emit the web root output at all.
    #[serde(default = "default_true")]
    pub generate_www: bool,
    /// Whether to empty the build directory on the first build.
    #[serde(default = "default_true")]
    pub empty_www: bool,
    /// Whether to emit a distribution copy.
    #[serde(default)]
    pub generate_dist: bool,
    /// Whether to empty the distribution directory on the first build.
    #[serde(default = "default_true")]
    pub empty_dist: bool,
    /// Whether the content-addressed transformation cache is enabled.
    #[serde(default = "default_true")]
    pub enable_cache: bool,
    /// Directory holding persisted cache entries, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Whether to minify compiled CSS.
    #[serde(default)]
    pub minify_css: bool,
    /// Whether to attach detailed stats to build results.
    #[serde(default)]
    pub build_stats: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            generate_www: true,
            empty_www: true,
            generate_dist: false,
            empty_dist: true,
            enable_cache: true,
            cache_dir: default_cache_dir(),
            minify_css: false,
            build_stats: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    ".strata/cache".to_string()
}

/// A named grouping of components compiled together into one bundle.
#[derive(Debug, Deserialize)]
pub struct BundleConfig {
    /// Component tags belonging to this bundle.
    pub components: Vec<String>,
}
