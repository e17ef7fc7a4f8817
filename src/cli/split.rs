//! Split command implementation

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use super::{evaluate_project, print_banner};
use crate::bundler::{ChunkPartitioner, ChunkPlan, ChunkType, ModuleGraph, PerformanceReport};
use crate::target::BuildTarget;
use crate::utils::{format_duration, format_size};

/// Partition a module graph into output chunks
#[derive(Args, Debug)]
pub struct SplitCommand {
    /// Module graph manifest (JSON)
    pub manifest: PathBuf,

    /// Force a target instead of reading NODE_ENV / DOCKER
    #[arg(short, long, value_enum)]
    pub target: Option<BuildTarget>,

    /// Print the chunk plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct SplitOutput<'a> {
    target: BuildTarget,
    plan: &'a ChunkPlan,
    report: &'a PerformanceReport,
}

impl SplitCommand {
    pub fn execute(&self, config_path: &Path) -> Result<()> {
        let start = Instant::now();

        let evaluation = evaluate_project(config_path, self.target)?;
        let config = &evaluation.config;

        let graph = ModuleGraph::load(&self.manifest)
            .with_context(|| format!("Failed to load module graph {}", self.manifest.display()))?;

        let plan = ChunkPartitioner::new(&config.optimization).partition(&graph);
        let report = PerformanceReport::analyze(
            &plan,
            &graph,
            &config.performance,
            config.optimization.split_chunks.max_initial_requests,
        );

        if self.json {
            let output = SplitOutput {
                target: evaluation.target,
                plan: &plan,
                report: &report,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        print_banner();

        println!(
            "{} {} module(s) into {} chunk(s) for {} in {}\n",
            "✓".green().bold(),
            plan.assignments.len(),
            plan.chunks.len(),
            evaluation.target.to_string().cyan(),
            format_duration(start.elapsed())
        );

        for chunk in &plan.chunks {
            let kind = match chunk.chunk_type {
                ChunkType::Entry => "entry",
                ChunkType::Async => "async",
                ChunkType::Shared => "shared",
                ChunkType::Runtime => "runtime",
            };
            println!(
                "  {} {} {} {}",
                "•".dimmed(),
                chunk.name.cyan(),
                format!("[{}]", kind).dimmed(),
                format_size(chunk.size).dimmed()
            );
            for module in &chunk.modules {
                println!("      {}", module.dimmed());
            }
        }

        if !report.is_clean() {
            println!();
            for warning in &report.warnings {
                println!("  {} {}", "!".yellow().bold(), warning);
            }
        }

        println!();

        Ok(())
    }
}
