//! Config command implementation

use std::path::Path;

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use super::{evaluate_project, print_banner};
use crate::bundler::evaluation_order;
use crate::target::BuildTarget;
use crate::utils::{format_size, relative_path};

/// Print the configuration for the selected deployment target
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// Force a target instead of reading NODE_ENV / DOCKER
    #[arg(short, long, value_enum)]
    pub target: Option<BuildTarget>,

    /// Print the configuration as JSON
    #[arg(long)]
    pub json: bool,
}

impl ShowCommand {
    pub fn execute(&self, config_path: &Path) -> Result<()> {
        let evaluation = evaluate_project(config_path, self.target)?;
        let config = &evaluation.config;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&evaluation)?);
            return Ok(());
        }

        print_banner();

        println!("{} {}", "target".bold(), evaluation.target.to_string().cyan());

        let stages: Vec<String> = config.applied_stages.iter().map(|s| s.to_string()).collect();
        println!("{} {}", "stages".bold(), stages.join(" → "));

        if let Some(output) = config.output {
            println!("{} {:?}", "output".bold(), output);
        }
        if let Some(root) = &config.experimental.output_file_tracing_root {
            let shown = relative_path(&config.root, root).unwrap_or_else(|| root.display().to_string());
            println!("{} {}", "tracing root".bold(), shown);
        }

        println!(
            "{} {} (default {})",
            "locales".bold(),
            config.i18n.locales.join(", "),
            config.i18n.default_locale
        );
        println!("{} {}", "pages".bold(), config.page_extensions.join(", "));

        let split = &config.optimization.split_chunks;
        println!(
            "\n{} min {} · max {} · {} initial requests",
            "split chunks".bold(),
            format_size(split.min_size),
            format_size(split.max_size),
            split.max_initial_requests
        );
        for group in evaluation_order(&split.cache_groups) {
            println!(
                "  {} {} {}",
                "•".dimmed(),
                group.name.cyan(),
                format!("priority {}", group.priority).dimmed()
            );
        }
        println!(
            "  {} {} {}",
            "•".dimmed(),
            config.optimization.runtime_chunk.name.cyan(),
            "loader bootstrap".dimmed()
        );

        Ok(())
    }
}
