//! Size warnings computed after partitioning
//!
//! None of these affect which chunk a module lands in.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::{Chunk, ChunkPlan, ChunkType, ModuleGraph, ModuleId};
use crate::config::PerformanceConfig;
use crate::utils::format_size;

/// A size ceiling that was exceeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PerformanceWarning {
    AssetTooLarge {
        chunk: String,
        size: usize,
        limit: usize,
    },
    EntrypointTooLarge {
        entry: String,
        size: usize,
        limit: usize,
    },
    TooManyInitialRequests {
        entry: String,
        requests: usize,
        limit: usize,
    },
}

impl fmt::Display for PerformanceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PerformanceWarning::AssetTooLarge { chunk, size, limit } => write!(
                f,
                "chunk '{}' is {} (limit {})",
                chunk,
                format_size(*size),
                format_size(*limit)
            ),
            PerformanceWarning::EntrypointTooLarge { entry, size, limit } => write!(
                f,
                "entry point '{}' loads {} up front (limit {})",
                entry,
                format_size(*size),
                format_size(*limit)
            ),
            PerformanceWarning::TooManyInitialRequests { entry, requests, limit } => write!(
                f,
                "entry point '{}' needs {} initial requests (limit {})",
                entry, requests, limit
            ),
        }
    }
}

/// Warnings for one chunk plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerformanceReport {
    pub warnings: Vec<PerformanceWarning>,
}

impl PerformanceReport {
    /// Check a plan against the asset, entry point and request ceilings
    pub fn analyze(
        plan: &ChunkPlan,
        graph: &ModuleGraph,
        performance: &PerformanceConfig,
        max_initial_requests: usize,
    ) -> Self {
        let mut warnings = Vec::new();

        for chunk in &plan.chunks {
            if chunk.size > performance.max_asset_size {
                warnings.push(PerformanceWarning::AssetTooLarge {
                    chunk: chunk.name.clone(),
                    size: chunk.size,
                    limit: performance.max_asset_size,
                });
            }
        }

        for (name, &entry) in graph.entries() {
            let initial = initial_chunks(plan, graph, entry);
            let size: usize = initial.iter().map(|c| c.size).sum();

            if size > performance.max_entrypoint_size {
                warnings.push(PerformanceWarning::EntrypointTooLarge {
                    entry: name.clone(),
                    size,
                    limit: performance.max_entrypoint_size,
                });
            }
            if initial.len() > max_initial_requests {
                warnings.push(PerformanceWarning::TooManyInitialRequests {
                    entry: name.clone(),
                    requests: initial.len(),
                    limit: max_initial_requests,
                });
            }
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Self { warnings }
    }

    /// No ceiling was exceeded
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Runtime plus every chunk holding a module the entry imports statically
fn initial_chunks<'p>(plan: &'p ChunkPlan, graph: &ModuleGraph, entry: ModuleId) -> Vec<&'p Chunk> {
    let names: BTreeSet<&str> = graph
        .get_reachable_modules(entry, false)
        .into_iter()
        .filter_map(|id| graph.get_module(id))
        .filter_map(|module| plan.chunk_of(&module.identifier))
        .collect();

    plan.chunks
        .iter()
        .filter(|c| c.chunk_type == ChunkType::Runtime || names.contains(c.name.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{ChunkPartitioner, ImportKind};
    use crate::config::OptimizationConfig;
    use pretty_assertions::assert_eq;

    fn reader_graph() -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        let index = graph.add_module("src/pages/index.tsx", 40_000);
        let react = graph.add_module("/app/node_modules/react/index.js", 8_000);
        let viewer = graph.add_module("src/components/Viewer.tsx", 60_000);
        graph.add_dependency(index, react, ImportKind::Static);
        graph.add_dependency(index, viewer, ImportKind::Dynamic);
        graph.add_entry("index", index);
        graph
    }

    #[test]
    fn test_clean_report_with_default_ceilings() {
        let graph = reader_graph();
        let optimization = OptimizationConfig::default();
        let plan = ChunkPartitioner::new(&optimization).partition(&graph);

        let report = PerformanceReport::analyze(&plan, &graph, &PerformanceConfig::default(), 25);
        assert!(report.is_clean());
    }

    #[test]
    fn test_ceilings_produce_warnings() {
        let graph = reader_graph();
        let optimization = OptimizationConfig::default();
        let plan = ChunkPartitioner::new(&optimization).partition(&graph);
        let performance = PerformanceConfig {
            max_entrypoint_size: 45_000,
            max_asset_size: 50_000,
        };

        let report = PerformanceReport::analyze(&plan, &graph, &performance, 2);
        let index_size = plan.chunk("index").unwrap().size;
        let initial_size = index_size + 8_000 + plan.runtime().unwrap().size;

        assert_eq!(
            report.warnings,
            vec![
                PerformanceWarning::AssetTooLarge {
                    chunk: "index".to_string(),
                    size: index_size,
                    limit: 50_000,
                },
                PerformanceWarning::EntrypointTooLarge {
                    entry: "index".to_string(),
                    size: initial_size,
                    limit: 45_000,
                },
                PerformanceWarning::TooManyInitialRequests {
                    entry: "index".to_string(),
                    requests: 3,
                    limit: 2,
                },
            ]
        );
    }

    #[test]
    fn test_warning_display() {
        let warning = PerformanceWarning::TooManyInitialRequests {
            entry: "index".to_string(),
            requests: 30,
            limit: 25,
        };
        assert_eq!(
            warning.to_string(),
            "entry point 'index' needs 30 initial requests (limit 25)"
        );
    }
}
