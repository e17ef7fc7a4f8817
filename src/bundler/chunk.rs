//! Chunk generation for code splitting

use serde::{Deserialize, Serialize};

/// Module loader bootstrap carried by the runtime chunk
pub const RUNTIME_BOOTSTRAP: &str = r#"(function() {
  var modules = {};
  var cache = {};

  function require(moduleId) {
    if (cache[moduleId]) {
      return cache[moduleId].exports;
    }

    var module = { exports: {} };
    cache[moduleId] = module;

    var moduleFn = modules[moduleId];
    if (moduleFn) {
      moduleFn(module, module.exports, require);
    }

    return module.exports;
  }

  self.__chunk_modules__ = modules;
  self.__chunk_require__ = require;
})();
"#;

/// Type of chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    /// Default chunk of an entry point - loaded immediately
    Entry,
    /// Async chunk - loaded on demand via dynamic import
    Async,
    /// Shared chunk - may be loaded eagerly or on demand
    Shared,
    /// Module loader bootstrap only
    Runtime,
}

/// A chunk is a group of modules that will be bundled together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk name (used for output filename)
    pub name: String,

    /// Type of chunk
    pub chunk_type: ChunkType,

    /// Identifiers of the modules included in this chunk, sorted
    pub modules: Vec<String>,

    /// Total size in bytes
    pub size: usize,

    /// Cache group that produced the chunk, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(name: String, chunk_type: ChunkType, mut modules: Vec<String>, size: usize) -> Self {
        modules.sort();
        Self {
            name,
            chunk_type,
            modules,
            size,
            group: None,
        }
    }

    /// Create the runtime chunk
    pub fn runtime(name: String) -> Self {
        Self {
            name,
            chunk_type: ChunkType::Runtime,
            modules: Vec::new(),
            size: RUNTIME_BOOTSTRAP.len(),
            group: None,
        }
    }

    /// Tag the chunk with the cache group that produced it
    pub fn with_group(mut self, group: &str) -> Self {
        self.group = Some(group.to_string());
        self
    }

    /// Check if chunk is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Number of modules in chunk
    pub fn len(&self) -> usize {
        self.modules.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_chunk() {
        let chunk = Chunk::runtime("runtime".to_string());
        assert!(chunk.is_empty());
        assert_eq!(chunk.size, RUNTIME_BOOTSTRAP.len());
    }

    #[test]
    fn test_modules_are_sorted() {
        let chunk = Chunk::new(
            "commons".to_string(),
            ChunkType::Shared,
            vec!["b.js".to_string(), "a.js".to_string()],
            2,
        );
        assert_eq!(chunk.modules, vec!["a.js", "b.js"]);
        assert_eq!(chunk.len(), 2);
    }
}
