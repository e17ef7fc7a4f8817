//! Error types for configuration loading and validation

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("at least one page extension must be configured")]
    NoPageExtensions,

    #[error("default locale '{0}' is not one of the configured locales")]
    UnknownDefaultLocale(String),

    #[error("cache group '{0}' is declared more than once")]
    DuplicateCacheGroup(String),

    #[error("{scope}: min_size {min_size} exceeds max_size {max_size}")]
    InvalidSizeBounds {
        scope: String,
        min_size: usize,
        max_size: usize,
    },

    #[error("max_initial_requests must be at least 1")]
    NoInitialRequests,
}
