//! Module graph data structures

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Unique identifier for a module
pub type ModuleId = usize;

/// How one module references another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    /// Loaded together with the importer
    Static,
    /// Loaded on demand through `import()`
    Dynamic,
}

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Stable identifier, normally the module path
    pub identifier: String,

    /// Compiled size in bytes
    pub size: usize,
}

/// Errors raised while loading a graph manifest
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to read module graph {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse module graph: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("module '{0}' is listed more than once")]
    DuplicateModule(String),

    #[error("entry point '{name}' refers to unknown module '{id}'")]
    UnknownEntry { name: String, id: String },
}

/// On-disk description of a module graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphManifest {
    /// Entry point name -> module identifier
    #[serde(default)]
    pub entries: BTreeMap<String, String>,

    #[serde(default)]
    pub modules: Vec<ManifestModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestModule {
    pub id: String,

    #[serde(default)]
    pub size: usize,

    #[serde(default)]
    pub imports: Vec<ManifestImport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestImport {
    pub id: String,

    #[serde(default)]
    pub dynamic: bool,
}

/// The module dependency graph
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules indexed by their ID
    modules: HashMap<ModuleId, Module>,

    /// Map from identifier to module ID
    identifier_to_id: HashMap<String, ModuleId>,

    /// Dependency edges: module ID -> dependency ID -> import kind
    edges: HashMap<ModuleId, BTreeMap<ModuleId, ImportKind>>,

    /// Entry point name -> module ID
    entries: BTreeMap<String, ModuleId>,

    /// Next available module ID
    next_id: ModuleId,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON graph manifest from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GraphError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| GraphError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: GraphManifest = serde_json::from_str(&content)?;
        Self::from_manifest(manifest)
    }

    /// Build a graph from a parsed manifest
    pub fn from_manifest(manifest: GraphManifest) -> Result<Self, GraphError> {
        let mut graph = Self::new();

        for module in &manifest.modules {
            if graph.get_module_id(&module.id).is_some() {
                return Err(GraphError::DuplicateModule(module.id.clone()));
            }
            graph.add_module(&module.id, module.size);
        }

        for module in &manifest.modules {
            let from = graph.identifier_to_id[&module.id];
            for import in &module.imports {
                let Some(to) = graph.get_module_id(&import.id) else {
                    debug!("Ignoring import of unknown module {} from {}", import.id, module.id);
                    continue;
                };
                let kind = if import.dynamic {
                    ImportKind::Dynamic
                } else {
                    ImportKind::Static
                };
                graph.add_dependency(from, to, kind);
            }
        }

        for (name, id) in manifest.entries {
            let Some(module_id) = graph.get_module_id(&id) else {
                return Err(GraphError::UnknownEntry { name, id });
            };
            graph.add_entry(name, module_id);
        }

        Ok(graph)
    }

    /// Add a module to the graph, returning the existing ID for a known identifier
    pub fn add_module(&mut self, identifier: &str, size: usize) -> ModuleId {
        if let Some(&id) = self.identifier_to_id.get(identifier) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.identifier_to_id.insert(identifier.to_string(), id);
        self.modules.insert(
            id,
            Module {
                identifier: identifier.to_string(),
                size,
            },
        );
        self.edges.insert(id, BTreeMap::new());

        id
    }

    /// Add a dependency edge between modules
    ///
    /// A static edge is never downgraded to a dynamic one.
    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId, kind: ImportKind) {
        if let Some(deps) = self.edges.get_mut(&from) {
            let existing = deps.entry(to).or_insert(kind);
            if kind == ImportKind::Static {
                *existing = ImportKind::Static;
            }
        }
    }

    /// Register a module as a named entry point
    pub fn add_entry(&mut self, name: impl Into<String>, id: ModuleId) {
        self.entries.insert(name.into(), id);
    }

    /// Get module ID from identifier
    pub fn get_module_id(&self, identifier: &str) -> Option<ModuleId> {
        self.identifier_to_id.get(identifier).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Size of a module, zero for unknown IDs
    pub fn module_size(&self, id: ModuleId) -> usize {
        self.modules.get(&id).map(|m| m.size).unwrap_or(0)
    }

    /// Get all modules reachable from a given module (BFS)
    ///
    /// With `include_dynamic` unset only static imports are followed.
    pub fn get_reachable_modules(&self, start: ModuleId, include_dynamic: bool) -> Vec<ModuleId> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        queue.push_back(start);
        visited.insert(start);

        while let Some(id) = queue.pop_front() {
            result.push(id);

            if let Some(deps) = self.edges.get(&id) {
                for (&dep_id, &kind) in deps {
                    if kind == ImportKind::Dynamic && !include_dynamic {
                        continue;
                    }
                    if visited.insert(dep_id) {
                        queue.push_back(dep_id);
                    }
                }
            }
        }

        result
    }

    /// Get direct dependencies of a module
    pub fn get_dependencies(&self, id: ModuleId) -> Vec<(ModuleId, ImportKind)> {
        self.edges
            .get(&id)
            .map(|deps| deps.iter().map(|(&dep, &kind)| (dep, kind)).collect())
            .unwrap_or_default()
    }

    /// Entry points by name
    pub fn entries(&self) -> &BTreeMap<String, ModuleId> {
        &self.entries
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
