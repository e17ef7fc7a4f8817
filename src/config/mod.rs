//! Configuration handling
//!
//! `Config` is the build configuration handed to the bundler. It starts from
//! the reader app's base settings, optionally overridden by a `reader.toml`
//! project file, and is then reshaped by the target overlay and the
//! configuration stages.

mod error;
mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use error::ConfigError;
pub use schema::*;

use crate::plugins::StageName;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source extensions recognized as pages
    #[serde(default = "default_page_extensions")]
    pub page_extensions: Vec<String>,

    /// Chunk splitting and minification
    #[serde(default)]
    pub optimization: OptimizationConfig,

    /// Size ceilings for build warnings
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Localized routing table
    #[serde(default)]
    pub i18n: I18nConfig,

    /// Packaging mode, set by the containerized target
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputMode>,

    /// Set by the containerized target
    #[serde(skip_deserializing)]
    pub experimental: ExperimentalConfig,

    /// Inputs for the configuration stages
    #[serde(default)]
    pub plugins: PluginSettings,

    /// Dependencies compiled from source
    #[serde(default)]
    pub transpile_modules: Vec<String>,

    // Stage output, never read from the project file
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub bundle_analyzer: Option<AnalyzerConfig>,

    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub pwa: Option<PwaConfig>,

    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringConfig>,

    /// Stages applied so far, in order
    #[serde(skip_deserializing)]
    pub applied_stages: Vec<StageName>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// The reader app's base configuration rooted at `root`
    pub fn base(root: impl Into<PathBuf>) -> Self {
        Self {
            page_extensions: default_page_extensions(),
            optimization: OptimizationConfig::default(),
            performance: PerformanceConfig::default(),
            i18n: I18nConfig::default(),
            output: None,
            experimental: ExperimentalConfig::default(),
            plugins: PluginSettings::default(),
            transpile_modules: Vec::new(),
            bundle_analyzer: None,
            pwa: None,
            monitoring: None,
            applied_stages: Vec::new(),
            root: root.into(),
        }
    }

    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = absolute(path.as_ref())?;

        let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut config: Config = toml::from_str(&content)?;

        // Set root directory to the directory containing the config file
        config.root = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;

        Ok(config)
    }

    /// Load the project file if it exists, else the base configuration rooted
    /// at the current directory
    pub fn load_or_base<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.is_file() {
            return Self::load(path);
        }

        debug!("No project file at {}, using base configuration", path.display());
        let root = std::env::current_dir().map_err(|source| ConfigError::Read {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::base(root))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_extensions.is_empty() {
            return Err(ConfigError::NoPageExtensions);
        }

        if !self.i18n.supports(&self.i18n.default_locale) {
            return Err(ConfigError::UnknownDefaultLocale(self.i18n.default_locale.clone()));
        }

        let split = &self.optimization.split_chunks;
        if split.max_initial_requests == 0 {
            return Err(ConfigError::NoInitialRequests);
        }
        check_bounds("split_chunks", split.min_size, split.max_size)?;

        let mut names = HashSet::new();
        for group in &split.cache_groups {
            if !names.insert(group.name.as_str()) {
                return Err(ConfigError::DuplicateCacheGroup(group.name.clone()));
            }
            check_bounds(
                &group.name,
                group.min_size.unwrap_or(split.min_size),
                group.max_size.unwrap_or(split.max_size),
            )?;
        }

        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })
}

fn check_bounds(scope: &str, min_size: usize, max_size: usize) -> Result<(), ConfigError> {
    if min_size > max_size {
        return Err(ConfigError::InvalidSizeBounds {
            scope: scope.to_string(),
            min_size,
            max_size,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::ChunkScope;
    use crate::evaluate::evaluate;
    use crate::target::EnvSignals;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_base_config() {
        let config = Config::base("/repo/apps/reader");

        assert_eq!(config.page_extensions, vec!["ts", "tsx"]);
        assert_eq!(config.i18n.locales, vec!["en-US", "zh-CN", "ja-JP"]);
        assert_eq!(config.i18n.default_locale, "en-US");
        assert!(config.optimization.minimize);
        assert_eq!(config.optimization.runtime_chunk.name, "runtime");
        assert_eq!(config.performance.max_asset_size, 15_000_000);
        assert_eq!(config.performance.max_entrypoint_size, 15_000_000);

        let split = &config.optimization.split_chunks;
        assert_eq!(split.chunks, ChunkScope::All);
        assert_eq!(split.max_initial_requests, 25);
        assert_eq!(split.min_size, 20_000);
        assert_eq!(split.max_size, 15_000_000);
        let groups: Vec<(&str, i32)> = split
            .cache_groups
            .iter()
            .map(|g| (g.name.as_str(), g.priority))
            .collect();
        assert_eq!(groups, vec![("framework", 40), ("lib", 30), ("commons", 20)]);

        assert!(config.output.is_none());
        assert!(config.applied_stages.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_load_overrides_and_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(
            &path,
            r#"
page_extensions = ["ts", "tsx", "mdx"]

[optimization.split_chunks]
min_size = 30000

[plugins]
pwa_dest = "static"
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.root, dir.path());
        assert_eq!(config.page_extensions, vec!["ts", "tsx", "mdx"]);
        assert_eq!(config.optimization.split_chunks.min_size, 30_000);
        assert_eq!(config.optimization.split_chunks.cache_groups.len(), 3);
        assert_eq!(config.plugins.pwa_dest, "static");
        assert_eq!(config.plugins.transpile_modules.len(), 3);
        assert_eq!(config.i18n, I18nConfig::default());
    }

    #[test]
    fn test_load_ignores_evaluation_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(
            &path,
            r#"
output = "standalone"
applied_stages = ["monitoring"]

[experimental]
output_file_tracing_root = "/elsewhere"

[bundle_analyzer]
enabled = true

[pwa]
dest = "static"
sw = "sw.js"
scope = "/"

[monitoring]
silent = false
observed_stages = []
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.output.is_none());
        assert!(config.experimental.output_file_tracing_root.is_none());
        assert!(config.bundle_analyzer.is_none());
        assert!(config.pwa.is_none());
        assert!(config.monitoring.is_none());
        assert!(config.applied_stages.is_empty());

        let signals = EnvSignals {
            analyze: false,
            development: true,
            containerized: false,
        };
        let development = evaluate(config.clone(), &signals).unwrap().config;
        assert!(development.monitoring.is_none());
        assert!(development.output.is_none());
        assert_eq!(
            development.applied_stages,
            vec![
                StageName::TranspileModules,
                StageName::BundleAnalyzer,
                StageName::OfflineCache,
            ]
        );

        let production = evaluate(config, &EnvSignals::default()).unwrap().config;
        assert_eq!(
            production.monitoring.unwrap().observed_stages,
            vec![
                StageName::TranspileModules,
                StageName::BundleAnalyzer,
                StageName::OfflineCache,
            ]
        );
        assert_eq!(production.applied_stages.len(), 4);
    }

    #[test]
    fn test_load_custom_cache_group() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(
            &path,
            r#"
[[optimization.split_chunks.cache_groups]]
name = "vendor"
priority = 10
test = { kind = "third-party" }
chunk_name = { kind = "static", name = "vendor" }
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        let groups = &config.optimization.split_chunks.cache_groups;
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].name, "vendor");
        assert_eq!(groups[0].min_chunks, 1);
        assert!(!groups[0].enforce);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_base() {
        let config = Config::load_or_base("/definitely/not/here/reader.toml").unwrap();
        assert_eq!(config.page_extensions, default_page_extensions());
        assert!(config.root.is_absolute());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::base(".");
        config.i18n.default_locale = "fr-FR".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::UnknownDefaultLocale(l)) if l == "fr-FR"));

        let mut config = Config::base(".");
        config.page_extensions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::NoPageExtensions)));

        let mut config = Config::base(".");
        config.optimization.split_chunks.min_size = 20_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSizeBounds { .. })));

        let mut config = Config::base(".");
        config.optimization.split_chunks.cache_groups[1].min_size = Some(16_000_000);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSizeBounds { scope, .. }) if scope == "lib"
        ));

        let mut config = Config::base(".");
        let twin = config.optimization.split_chunks.cache_groups[0].clone();
        config.optimization.split_chunks.cache_groups.push(twin);
        assert!(matches!(config.validate(), Err(ConfigError::DuplicateCacheGroup(n)) if n == "framework"));

        let mut config = Config::base(".");
        config.optimization.split_chunks.max_initial_requests = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoInitialRequests)));
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reader.toml");
        fs::write(&path, "page_extensions = 5").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }
}
