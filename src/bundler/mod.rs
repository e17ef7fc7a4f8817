//! Chunk partitioning
//!
//! Assigns every module reachable from an entry point to exactly one output
//! chunk. Cache groups are tried in priority order; a group only keeps the
//! modules it matched when the resulting chunk is large enough to stand on its
//! own, otherwise they are offered to the next group. Leftovers land in the
//! default chunk of the entry point that reaches them, and a separate runtime
//! chunk always carries the module loader.

mod cache_group;
mod chunk;
mod graph;
mod report;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{OptimizationConfig, SplitChunksConfig};
use crate::utils::hash_content;

pub use cache_group::{evaluation_order, CacheGroup, ChunkName, ChunkScope, GroupTest};
pub use chunk::{Chunk, ChunkType, RUNTIME_BOOTSTRAP};
pub use graph::{
    GraphError, GraphManifest, ImportKind, ManifestImport, ManifestModule, Module, ModuleGraph,
    ModuleId,
};
pub use report::{PerformanceReport, PerformanceWarning};

/// Result of partitioning a module graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    /// Emitted chunks, runtime last
    pub chunks: Vec<Chunk>,

    /// Module identifier -> chunk name
    pub assignments: BTreeMap<String, String>,
}

impl ChunkPlan {
    /// Name of the chunk a module was assigned to
    pub fn chunk_of(&self, identifier: &str) -> Option<&str> {
        self.assignments.get(identifier).map(String::as_str)
    }

    /// Look up a chunk by name
    pub fn chunk(&self, name: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.name == name)
    }

    /// The loader bootstrap chunk
    pub fn runtime(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.chunk_type == ChunkType::Runtime)
    }
}

/// A committed chunk waiting for the max-size pass
struct PendingChunk {
    name: String,
    chunk_type: ChunkType,
    group: Option<String>,
    module_ids: Vec<ModuleId>,
    /// `None` when the chunk must never be split
    max_size: Option<usize>,
}

/// Runs the split-chunks policy against a module graph
pub struct ChunkPartitioner<'a> {
    split_chunks: &'a SplitChunksConfig,
    runtime_name: &'a str,
}

impl<'a> ChunkPartitioner<'a> {
    /// Create a partitioner for the given optimization settings
    pub fn new(optimization: &'a OptimizationConfig) -> Self {
        Self {
            split_chunks: &optimization.split_chunks,
            runtime_name: &optimization.runtime_chunk.name,
        }
    }

    /// Partition the graph into chunks
    pub fn partition(&self, graph: &ModuleGraph) -> ChunkPlan {
        let reach = entry_reach(graph);
        let mut unassigned: BTreeSet<ModuleId> = reach.keys().copied().collect();
        let mut pending: Vec<PendingChunk> = Vec::new();

        for group in evaluation_order(&self.split_chunks.cache_groups) {
            let mut candidates: BTreeMap<String, Vec<ModuleId>> = BTreeMap::new();

            for &id in &unassigned {
                let Some(module) = graph.get_module(id) else {
                    continue;
                };
                if group.accepts(&module.identifier, reach[&id].len()) {
                    candidates
                        .entry(group.chunk_name.resolve(&module.identifier))
                        .or_default()
                        .push(id);
                }
            }

            let min_size = group.min_size.unwrap_or(self.split_chunks.min_size);

            for (name, module_ids) in candidates {
                let size: usize = module_ids.iter().map(|&id| graph.module_size(id)).sum();
                if !group.enforce && size < min_size {
                    debug!(
                        "Cache group {} leaves {} unclaimed ({} < {} bytes)",
                        group.name, name, size, min_size
                    );
                    continue;
                }

                debug!("Cache group {} claims {} module(s) as {}", group.name, module_ids.len(), name);
                for id in &module_ids {
                    unassigned.remove(id);
                }

                let chunk_type = match group.scope.unwrap_or(self.split_chunks.chunks) {
                    ChunkScope::Async => ChunkType::Async,
                    ChunkScope::All | ChunkScope::Initial => ChunkType::Shared,
                };
                let max_size = if group.enforce {
                    None
                } else {
                    Some(group.max_size.unwrap_or(self.split_chunks.max_size))
                };

                push_pending(
                    &mut pending,
                    self.runtime_name,
                    PendingChunk {
                        name,
                        chunk_type,
                        group: Some(group.name.clone()),
                        module_ids,
                        max_size,
                    },
                );
            }
        }

        let mut defaults: BTreeMap<String, Vec<ModuleId>> = BTreeMap::new();
        for id in unassigned {
            if let Some(entry) = reach[&id].iter().next() {
                defaults.entry(entry.clone()).or_default().push(id);
            }
        }
        for (name, module_ids) in defaults {
            push_pending(
                &mut pending,
                self.runtime_name,
                PendingChunk {
                    name,
                    chunk_type: ChunkType::Entry,
                    group: None,
                    module_ids,
                    max_size: Some(self.split_chunks.max_size),
                },
            );
        }

        let mut chunks: Vec<Chunk> = pending
            .into_iter()
            .flat_map(|p| split_oversized(p, graph))
            .collect();
        chunks.push(Chunk::runtime(self.runtime_name.to_string()));

        let mut assignments = BTreeMap::new();
        for chunk in &chunks {
            for module in &chunk.modules {
                assignments.insert(module.clone(), chunk.name.clone());
            }
        }

        info!(
            "Partitioned {} module(s) into {} chunk(s)",
            assignments.len(),
            chunks.len()
        );

        ChunkPlan { chunks, assignments }
    }
}

/// For every reachable module, the names of the entry points that reach it
fn entry_reach(graph: &ModuleGraph) -> BTreeMap<ModuleId, BTreeSet<String>> {
    let mut reach: BTreeMap<ModuleId, BTreeSet<String>> = BTreeMap::new();

    for (name, &entry) in graph.entries() {
        for id in graph.get_reachable_modules(entry, true) {
            reach.entry(id).or_default().insert(name.clone());
        }
    }

    reach
}

/// Add a chunk under a name no other chunk holds
///
/// Group chunks and default entry chunks share one namespace with the runtime
/// chunk. A clashing name gets the group name (or `entry`) appended, so an
/// entry called `framework` never folds its modules into the framework group.
fn push_pending(pending: &mut Vec<PendingChunk>, runtime_name: &str, mut chunk: PendingChunk) {
    let taken = |name: &str| name == runtime_name || pending.iter().any(|p| p.name == name);

    if taken(&chunk.name) {
        let base = format!("{}-{}", chunk.name, chunk.group.as_deref().unwrap_or("entry"));
        let mut name = base.clone();
        let mut n = 2;
        while taken(&name) {
            name = format!("{}-{}", base, n);
            n += 1;
        }
        warn!("Chunk name {} is already in use, emitting {}", chunk.name, name);
        chunk.name = name;
    }

    pending.push(chunk);
}

/// Split a chunk above its max size along module boundaries
///
/// Modules are packed greedily in identifier order. Each part is named after
/// the chunk plus a hash of its module identifiers, so the same modules always
/// produce the same part names. A single module larger than the limit still
/// gets emitted as its own part.
fn split_oversized(pending: PendingChunk, graph: &ModuleGraph) -> Vec<Chunk> {
    let mut modules: Vec<(&str, usize)> = pending
        .module_ids
        .iter()
        .filter_map(|&id| graph.get_module(id))
        .map(|m| (m.identifier.as_str(), m.size))
        .collect();
    modules.sort();

    let total: usize = modules.iter().map(|(_, size)| size).sum();

    let parts = match pending.max_size {
        Some(max_size) if total > max_size => pack(&modules, max_size),
        _ => vec![modules],
    };

    let build = |name: String, part: &[(&str, usize)]| {
        let chunk = Chunk::new(
            name,
            pending.chunk_type,
            part.iter().map(|(id, _)| id.to_string()).collect(),
            part.iter().map(|(_, size)| size).sum(),
        );
        match &pending.group {
            Some(group) => chunk.with_group(group),
            None => chunk,
        }
    };

    if parts.len() == 1 {
        return vec![build(pending.name.clone(), parts[0].as_slice())];
    }

    debug!("Splitting {} into {} parts", pending.name, parts.len());

    parts
        .iter()
        .map(|part| {
            let key: Vec<&str> = part.iter().map(|(id, _)| *id).collect();
            let hash = hash_content(key.join("\n").as_bytes());
            build(format!("{}-{}", pending.name, &hash[..8]), part.as_slice())
        })
        .collect()
}

fn pack<'m>(modules: &[(&'m str, usize)], max_size: usize) -> Vec<Vec<(&'m str, usize)>> {
    let mut parts = Vec::new();
    let mut current: Vec<(&str, usize)> = Vec::new();
    let mut current_size = 0;

    for &(id, size) in modules {
        if !current.is_empty() && current_size + size > max_size {
            parts.push(std::mem::take(&mut current));
            current_size = 0;
        }
        current.push((id, size));
        current_size += size;
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}
