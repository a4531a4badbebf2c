//! Node types - Named vertices of the graph
//!
//! A node is an integer id assigned by the store plus a free-text name.
//! Names are trimmed and must not be empty, but they are not unique.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned node identifier, stable for the lifetime of the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub i64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated node name: trimmed, never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeName(String);

impl NodeName {
    /// Trim the input and reject it if nothing is left
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidName("node name must not be empty".to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A node row as persisted in the `nodes` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Generated identifier
    pub id: NodeId,
    /// Trimmed, non-empty display name
    pub name: String,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}
