//! Command-line interface for reader-build
//!
//! Provides the main CLI structure using clap with subcommands for:
//! - `config`: Evaluated build configuration
//! - `split`: Chunk partitioning of a module graph

mod show;
mod split;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::config::Config;
use crate::evaluate::{evaluate, evaluate_for, Evaluation};
use crate::target::{BuildTarget, EnvSignals};

pub use show::ShowCommand;
pub use split::SplitCommand;

/// Evaluate the reader app's build configuration
#[derive(Parser, Debug)]
#[command(name = "reader-build")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to reader.toml project file
    #[arg(short, long, global = true, default_value = "reader.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the configuration for the selected deployment target
    Config(ShowCommand),

    /// Partition a module graph into output chunks
    Split(SplitCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Config(cmd) => cmd.execute(&self.config),
            Commands::Split(cmd) => cmd.execute(&self.config),
        }
    }
}

/// Load the project configuration and run it through target selection and
/// the configuration stages
///
/// The process environment is read here and nowhere else.
fn evaluate_project(config_path: &Path, target: Option<BuildTarget>) -> Result<Evaluation> {
    info!("Loading configuration from {}", config_path.display());
    let base = Config::load_or_base(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;

    let signals = EnvSignals::from_env();
    let evaluation = match target {
        Some(target) => evaluate_for(target, base, &signals),
        None => evaluate(base, &signals),
    }
    .context("Failed to evaluate build configuration")?;

    Ok(evaluation)
}

/// Print the reader-build banner
fn print_banner() {
    eprintln!(
        "\n{} {}\n",
        "reader-build".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}
