//! Edge types - Directed links between nodes
//!
//! Edges point from `start_node` to `end_node`. They carry a `name`
//! column for schema compatibility, which is always blank today.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned edge identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge row as persisted in the `edges` table.
///
/// Endpoints are expected to reference existing nodes, but the store does
/// not enforce it: readers must tolerate edges whose endpoints are gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Generated identifier
    pub id: EdgeId,
    /// Node the edge starts at
    pub start_node: NodeId,
    /// Node the edge points to
    pub end_node: NodeId,
    /// Always blank
    pub name: String,
}

impl Edge {
    pub fn new(id: EdgeId, start_node: NodeId, end_node: NodeId) -> Self {
        Self {
            id,
            start_node,
            end_node,
            name: String::new(),
        }
    }

    /// The `(start, end)` pair used for listing and rendering
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.start_node, self.end_node)
    }

    /// Check if either endpoint is the given node
    pub fn touches(&self, node: NodeId) -> bool {
        self.start_node == node || self.end_node == node
    }
}
