//! Configuration evaluation
//!
//! base config -> target overlay -> configuration stages

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::plugins::{Pipeline, PipelineError};
use crate::target::{BuildTarget, EnvSignals};

/// Outcome of evaluating the configuration once
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub target: BuildTarget,
    pub config: Config,
}

/// Evaluate the configuration for the target the signals select
pub fn evaluate(base: Config, signals: &EnvSignals) -> Result<Evaluation, PipelineError> {
    evaluate_for(signals.target(), base, signals)
}

/// Evaluate the configuration for an explicit target
pub fn evaluate_for(
    target: BuildTarget,
    base: Config,
    signals: &EnvSignals,
) -> Result<Evaluation, PipelineError> {
    info!("Evaluating configuration for {} target", target);

    let config = target.apply_overlay(base);
    let pipeline = Pipeline::for_target(target, signals, &config.plugins);
    let config = pipeline.run(config)?;

    Ok(Evaluation { target, config })
}
