//! Configuration schema definitions

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bundler::{CacheGroup, ChunkScope};
use crate::plugins::StageName;

/// Localized routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct I18nConfig {
    /// Supported locale tags
    #[serde(default = "default_locales")]
    pub locales: Vec<String>,

    /// Locale used when the request carries none
    #[serde(default = "default_locale")]
    pub default_locale: String,
}

impl I18nConfig {
    /// Whether `locale` is one of the declared locales
    pub fn supports(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locales: default_locales(),
            default_locale: default_locale(),
        }
    }
}

fn default_locales() -> Vec<String> {
    vec!["en-US".to_string(), "zh-CN".to_string(), "ja-JP".to_string()]
}

fn default_locale() -> String {
    "en-US".to_string()
}

/// Bundle optimization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationConfig {
    /// Chunk splitting rule table
    #[serde(default)]
    pub split_chunks: SplitChunksConfig,

    /// Loader bootstrap chunk
    #[serde(default)]
    pub runtime_chunk: RuntimeChunkConfig,

    /// Minify emitted chunks
    #[serde(default = "default_true")]
    pub minimize: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            split_chunks: SplitChunksConfig::default(),
            runtime_chunk: RuntimeChunkConfig::default(),
            minimize: true,
        }
    }
}

/// Global split policy plus the ordered cache groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitChunksConfig {
    /// Which references the default policy may satisfy
    #[serde(default = "default_scope")]
    pub chunks: ChunkScope,

    /// Maximum number of parallel requests at an entry point
    #[serde(default = "default_max_initial_requests")]
    pub max_initial_requests: usize,

    /// Smallest chunk worth emitting on its own, in bytes
    #[serde(default = "default_min_size")]
    pub min_size: usize,

    /// Size above which a chunk is split along module boundaries
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Cache groups in declaration order
    #[serde(default = "CacheGroup::defaults")]
    pub cache_groups: Vec<CacheGroup>,
}

impl Default for SplitChunksConfig {
    fn default() -> Self {
        Self {
            chunks: default_scope(),
            max_initial_requests: default_max_initial_requests(),
            min_size: default_min_size(),
            max_size: default_max_size(),
            cache_groups: CacheGroup::defaults(),
        }
    }
}

fn default_scope() -> ChunkScope {
    ChunkScope::All
}

fn default_max_initial_requests() -> usize {
    25
}

fn default_min_size() -> usize {
    20_000
}

fn default_max_size() -> usize {
    15_000_000
}

/// Runtime chunk configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeChunkConfig {
    #[serde(default = "default_runtime_name")]
    pub name: String,
}

impl Default for RuntimeChunkConfig {
    fn default() -> Self {
        Self {
            name: default_runtime_name(),
        }
    }
}

fn default_runtime_name() -> String {
    "runtime".to_string()
}

/// Size ceilings that only produce build warnings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceConfig {
    #[serde(default = "default_max_size")]
    pub max_entrypoint_size: usize,

    #[serde(default = "default_max_size")]
    pub max_asset_size: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_entrypoint_size: default_max_size(),
            max_asset_size: default_max_size(),
        }
    }
}

/// Packaging mode of the emitted server output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Self-contained runnable tree for container images
    Standalone,
}

/// Settings the framework still treats as experimental
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentalConfig {
    /// Root from which server file tracing starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file_tracing_root: Option<PathBuf>,
}

/// Bundle analyzer report settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub enabled: bool,
}

/// Offline caching (service worker) settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PwaConfig {
    /// Directory the service worker is written to
    pub dest: String,

    /// Service worker file name
    pub sw: String,

    /// Scope the service worker controls
    pub scope: String,
}

/// Error monitoring instrumentation settings
///
/// Release, org, project and auth token are filled in by the monitoring
/// toolchain and are never set here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Suppress the instrumentation's own build logs
    pub silent: bool,

    /// Stages that had run when instrumentation was attached
    pub observed_stages: Vec<StageName>,
}

/// Project inputs consumed by the configuration stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Dependencies compiled from source instead of used prebuilt
    #[serde(default = "default_transpile_modules")]
    pub transpile_modules: Vec<String>,

    /// Output directory of the offline caching service worker
    #[serde(default = "default_pwa_dest")]
    pub pwa_dest: String,

    /// Keep the monitoring instrumentation quiet during builds
    #[serde(default = "default_true")]
    pub monitoring_silent: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            transpile_modules: default_transpile_modules(),
            pwa_dest: default_pwa_dest(),
            monitoring_silent: true,
        }
    }
}

fn default_transpile_modules() -> Vec<String> {
    vec![
        "@flow/internal".to_string(),
        "@flow/epubjs".to_string(),
        "@material/material-color-utilities".to_string(),
    ]
}

fn default_pwa_dest() -> String {
    "public".to_string()
}

fn default_true() -> bool {
    true
}

pub(crate) fn default_page_extensions() -> Vec<String> {
    vec!["ts".to_string(), "tsx".to_string()]
}
