//! # Shard set.
//!
//! [`ShardSet`] is the ordered, duplicate-free list of shard names the
//! supervisor starts. It is immutable once built and also knows how to render
//! the aligned output label of each shard.

use crate::error::ClusterError;

/// Ordered set of unique shard names.
///
/// ## Example
/// ```
/// use shardvisor::ShardSet;
///
/// let shards = ShardSet::new(["Master", "Caves"]).unwrap();
/// assert_eq!(shards.len(), 2);
/// assert_eq!(shards.label("Master"), "[Master] ");
/// assert_eq!(shards.label("Caves"), "[Caves ] ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSet {
    names: Vec<String>,
    width: usize,
}

impl ShardSet {
    /// Builds a set, keeping the given order.
    ///
    /// Names are trimmed. Fails on an empty list, an empty name, or a duplicate.
    pub fn new<I, S>(names: I) -> Result<Self, ClusterError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for name in names {
            let name: String = name.into();
            let name = name.trim();
            if name.is_empty() {
                return Err(ClusterError::EmptyShardName);
            }
            if out.iter().any(|n| n == name) {
                return Err(ClusterError::DuplicateShard(name.to_string()));
            }
            out.push(name.to_string());
        }
        if out.is_empty() {
            return Err(ClusterError::NoShards);
        }
        let width = out.iter().map(|n| n.chars().count()).max().unwrap_or(0);
        Ok(Self { names: out, width })
    }

    /// Shard names in launch order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates over shard names in launch order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Output label for `name`, padded to the longest shard name.
    pub fn label(&self, name: &str) -> String {
        format!("[{name:<width$}] ", width = self.width)
    }
}
