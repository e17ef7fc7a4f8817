//! Deployment target selection
//!
//! The environment is read once into [`EnvSignals`]; everything downstream
//! works from those plain booleans.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::config::{Config, OutputMode};
use crate::utils::normalize_path;

/// The final configuration variant produced by one build invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BuildTarget {
    /// Local development, base configuration only
    Development,
    /// Standalone output for container images
    Containerized,
    /// Production build with error monitoring attached
    Production,
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildTarget::Development => "development",
            BuildTarget::Containerized => "containerized",
            BuildTarget::Production => "production",
        };
        f.write_str(name)
    }
}

/// Environment inputs of a build invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnvSignals {
    /// `ANALYZE=true`
    pub analyze: bool,
    /// `NODE_ENV=development`
    pub development: bool,
    /// `DOCKER` set to any non-empty value
    pub containerized: bool,
}

impl EnvSignals {
    /// Read the signals from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the signals through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            analyze: lookup("ANALYZE").as_deref() == Some("true"),
            development: lookup("NODE_ENV").as_deref() == Some("development"),
            containerized: lookup("DOCKER").map(|v| !v.is_empty()).unwrap_or(false),
        }
    }

    /// Target these signals select
    pub fn target(&self) -> BuildTarget {
        select_target(self.development, self.containerized)
    }
}

/// Pick the build target; development takes precedence over containerized
pub fn select_target(development: bool, containerized: bool) -> BuildTarget {
    if development {
        BuildTarget::Development
    } else if containerized {
        BuildTarget::Containerized
    } else {
        BuildTarget::Production
    }
}

impl BuildTarget {
    /// Apply the target-specific output fields
    pub fn apply_overlay(self, mut config: Config) -> Config {
        if self == BuildTarget::Containerized {
            config.output = Some(OutputMode::Standalone);
            config.experimental.output_file_tracing_root = Some(tracing_root(&config.root));
        }
        config
    }

    /// Whether the production monitoring stage runs for this target
    pub fn is_instrumented(self) -> bool {
        self == BuildTarget::Production
    }
}

/// Repository root two levels above the app directory
fn tracing_root(root: &Path) -> std::path::PathBuf {
    normalize_path(&root.join("../.."))
}
