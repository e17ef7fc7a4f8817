//! Cache groups: the rules that decide chunk membership

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A `node_modules` directory segment, at the start of the path or after a separator
static NODE_MODULES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[\\/])node_modules[\\/]").unwrap()
});

/// Script extensions stripped from computed chunk names
static SCRIPT_EXTENSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.(js|ts)x?$").unwrap()
});

/// Which kinds of references a chunk may satisfy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkScope {
    All,
    Async,
    Initial,
}

/// Module predicate of a cache group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum GroupTest {
    /// The package directly under the outermost `node_modules` is one of `packages`
    Framework { packages: Vec<String> },
    /// Anything inside a `node_modules` tree
    ThirdParty,
    /// Every module
    Any,
}

impl GroupTest {
    /// Test a module identifier
    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            GroupTest::Framework { packages } => top_level_package(identifier)
                .map(|pkg| packages.iter().any(|p| p == pkg))
                .unwrap_or(false),
            GroupTest::ThirdParty => NODE_MODULES.is_match(identifier),
            GroupTest::Any => true,
        }
    }
}

/// First path segment after the outermost `node_modules`, if another segment follows it
///
/// Only the first `node_modules` occurrence is considered, so a package that is
/// itself nested inside another dependency's tree never counts as top level.
fn top_level_package(identifier: &str) -> Option<&str> {
    let found = NODE_MODULES.find(identifier)?;
    let rest = &identifier[found.end()..];
    let end = rest.find(is_separator)?;
    Some(&rest[..end])
}

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// How a cache group names the chunk a module lands in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ChunkName {
    /// Every module of the group shares one chunk
    Static { name: String },
    /// `<prefix><terminal path segment without script extension>`
    FromModule { prefix: String },
}

impl ChunkName {
    /// Resolve the chunk name for a module
    ///
    /// Depends only on the identifier, so an unchanged module always maps to
    /// the same chunk name across builds.
    pub fn resolve(&self, identifier: &str) -> String {
        match self {
            ChunkName::Static { name } => name.clone(),
            ChunkName::FromModule { prefix } => {
                let file_name = identifier.rsplit(is_separator).next().unwrap_or(identifier);
                format!("{}{}", prefix, SCRIPT_EXTENSION.replace(file_name, ""))
            }
        }
    }
}

/// A named partitioning rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGroup {
    /// Group name
    pub name: String,

    /// Module predicate
    pub test: GroupTest,

    /// Higher priorities are evaluated first
    #[serde(default)]
    pub priority: i32,

    /// Reference scope, inherited from the global policy when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ChunkScope>,

    /// Naming strategy
    pub chunk_name: ChunkName,

    /// Minimum chunk size override, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<usize>,

    /// Maximum chunk size override, in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<usize>,

    /// Minimum number of distinct entry points that must reach the module
    #[serde(default = "default_min_chunks")]
    pub min_chunks: usize,

    /// Emit the chunk regardless of size bounds
    #[serde(default)]
    pub enforce: bool,
}

fn default_min_chunks() -> usize {
    1
}

impl CacheGroup {
    /// The reader app's rule table: framework, lib, commons
    pub fn defaults() -> Vec<CacheGroup> {
        vec![
            CacheGroup {
                name: "framework".to_string(),
                test: GroupTest::Framework {
                    packages: ["@next", "react", "react-dom", "scheduler"]
                        .iter()
                        .map(|p| p.to_string())
                        .collect(),
                },
                priority: 40,
                scope: Some(ChunkScope::All),
                chunk_name: ChunkName::Static {
                    name: "framework".to_string(),
                },
                min_size: None,
                max_size: None,
                min_chunks: 1,
                enforce: true,
            },
            CacheGroup {
                name: "lib".to_string(),
                test: GroupTest::ThirdParty,
                priority: 30,
                scope: Some(ChunkScope::Async),
                chunk_name: ChunkName::FromModule {
                    prefix: "lib-".to_string(),
                },
                min_size: Some(10_000),
                max_size: Some(15_000_000),
                min_chunks: 1,
                enforce: false,
            },
            CacheGroup {
                name: "commons".to_string(),
                test: GroupTest::Any,
                priority: 20,
                scope: None,
                chunk_name: ChunkName::Static {
                    name: "commons".to_string(),
                },
                min_size: None,
                max_size: None,
                min_chunks: 2,
                enforce: false,
            },
        ]
    }

    /// Whether this group may claim a module reached from `entry_count` entry points
    pub fn accepts(&self, identifier: &str, entry_count: usize) -> bool {
        entry_count >= self.min_chunks && self.test.matches(identifier)
    }
}

/// Groups in evaluation order: priority descending, then declaration order
///
/// The sort is stable, so of two groups with equal priority the one declared
/// first is always tried first.
pub fn evaluation_order(groups: &[CacheGroup]) -> Vec<&CacheGroup> {
    let mut ordered: Vec<&CacheGroup> = groups.iter().collect();
    ordered.sort_by(|a, b| b.priority.cmp(&a.priority));
    ordered
}
