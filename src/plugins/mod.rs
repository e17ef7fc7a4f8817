//! Configuration stages
//!
//! Each stage takes the configuration and returns it with its own fields
//! added. The pipeline runs stages in a fixed order, records every applied
//! stage on the configuration, and rejects a stage that removes a field an
//! earlier step had established.

mod stages;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{Config, PluginSettings};
use crate::target::{BuildTarget, EnvSignals};

pub use stages::{BundleAnalyzer, Monitoring, OfflineCache, TranspileModules};

/// Stage identifiers, in pipeline order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageName {
    TranspileModules,
    BundleAnalyzer,
    OfflineCache,
    Monitoring,
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageName::TranspileModules => "transpile-modules",
            StageName::BundleAnalyzer => "bundle-analyzer",
            StageName::OfflineCache => "offline-cache",
            StageName::Monitoring => "monitoring",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage '{stage}' removed configuration field '{field}'")]
    FieldDropped { stage: StageName, field: String },

    #[error("stage '{stage}' must run after '{missing}'")]
    StageOrder { stage: StageName, missing: StageName },

    #[error("failed to inspect configuration around stage '{stage}': {source}")]
    Inspect {
        stage: StageName,
        #[source]
        source: serde_json::Error,
    },
}

/// A configuration transform
pub trait ConfigStage {
    /// Stage name for logging and ordering checks
    fn name(&self) -> StageName;

    /// Stages that must already be applied
    fn requires(&self) -> &[StageName] {
        &[]
    }

    /// Transform the configuration
    fn apply(&self, config: Config) -> Config;
}

/// Ordered list of configuration stages
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn ConfigStage>>,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed stage order for a build target
    ///
    /// Monitoring is only attached for production and always runs last.
    pub fn for_target(target: BuildTarget, signals: &EnvSignals, settings: &PluginSettings) -> Self {
        let mut pipeline = Self::new()
            .stage(TranspileModules::new(settings.transpile_modules.clone()))
            .stage(BundleAnalyzer::new(signals.analyze))
            .stage(OfflineCache::new(settings.pwa_dest.clone()));

        if target.is_instrumented() {
            pipeline = pipeline.stage(Monitoring::new(settings.monitoring_silent));
        }

        pipeline
    }

    /// Append a stage
    pub fn stage(mut self, stage: impl ConfigStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Names of the stages in run order
    pub fn stage_names(&self) -> Vec<StageName> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order
    pub fn run(&self, mut config: Config) -> Result<Config, PipelineError> {
        for stage in &self.stages {
            let name = stage.name();

            for &required in stage.requires() {
                if !config.applied_stages.contains(&required) {
                    return Err(PipelineError::StageOrder {
                        stage: name,
                        missing: required,
                    });
                }
            }

            let before = snapshot(&config, name)?;
            config = stage.apply(config);
            let after = snapshot(&config, name)?;

            if let Some(field) = first_dropped_field(&before, &after, "") {
                return Err(PipelineError::FieldDropped { stage: name, field });
            }

            config.applied_stages.push(name);
            debug!("Applied stage {}", name);
        }

        Ok(config)
    }
}

fn snapshot(config: &Config, stage: StageName) -> Result<Value, PipelineError> {
    serde_json::to_value(config).map_err(|source| PipelineError::Inspect { stage, source })
}

/// First object key present in `before` but missing from `after`, as a dotted path
///
/// Arrays and scalars are leaves: their contents may change, their presence may not.
fn first_dropped_field(before: &Value, after: &Value, prefix: &str) -> Option<String> {
    let Value::Object(before) = before else {
        return None;
    };

    for (key, old) in before {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        let Some(new) = after.get(key) else {
            return Some(path);
        };
        if old.is_object() && !new.is_object() {
            return Some(path);
        }
        if let Some(field) = first_dropped_field(old, new, &path) {
            return Some(field);
        }
    }

    None
}
