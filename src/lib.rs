//! reader-build library
//!
//! Build configuration for the reader web app: deployment target selection,
//! ordered configuration stages, and the chunk partitioning policy the
//! bundler runs with.

pub mod bundler;
pub mod cli;
pub mod config;
pub mod evaluate;
pub mod plugins;
pub mod target;
pub mod utils;

pub use bundler::{ChunkPartitioner, ChunkPlan, ModuleGraph};
pub use cli::Cli;
pub use config::Config;
pub use evaluate::{evaluate, evaluate_for, Evaluation};
pub use target::{select_target, BuildTarget, EnvSignals};
