//! Graph snapshot - In-memory view of the whole graph
//!
//! A snapshot is the `(nodes, edges)` pair read at one point in time.
//! It is rebuilt from the store on every interaction and never cached.

use std::collections::{BTreeMap, HashSet};
use serde::{Deserialize, Serialize};
use crate::edge::Edge;
use crate::node::{Node, NodeId};

/// Full node and edge set as read from the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    /// Ids of every node in the snapshot
    pub fn node_ids(&self) -> HashSet<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Edges with at least one endpoint missing from the node list
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        let ids = self.node_ids();
        self.edges
            .iter()
            .filter(|e| !ids.contains(&e.start_node) || !ids.contains(&e.end_node))
            .collect()
    }

    /// Build the name to id index for this node set
    pub fn name_index(&self) -> NameIndex {
        NameIndex::from_nodes(&self.nodes)
    }

    /// Get statistics about the snapshot
    pub fn stats(&self) -> GraphStats {
        let index = self.name_index();
        GraphStats {
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            distinct_names: index.len(),
            dangling_edges: self.dangling_edges().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Lookup from node name to node id.
///
/// Names are not unique. When several nodes share a name the lowest id
/// wins, independent of the order the nodes were read in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameIndex {
    by_name: BTreeMap<String, NodeId>,
}

impl NameIndex {
    pub fn from_nodes<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut by_name: BTreeMap<String, NodeId> = BTreeMap::new();
        for node in nodes {
            by_name
                .entry(node.name.clone())
                .and_modify(|id| {
                    if node.id < *id {
                        *id = node.id;
                    }
                })
                .or_insert(node.id);
        }
        Self { by_name }
    }

    /// Look up a (trimmed) name
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate `(name, id)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.by_name.iter().map(|(name, id)| (name.as_str(), *id))
    }
}

/// Statistics about a graph snapshot
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub distinct_names: usize,
    pub dangling_edges: usize,
}

impl std::fmt::Display for GraphStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Graph Statistics:")?;
        writeln!(f, "  Nodes: {} ({} distinct names)", self.nodes, self.distinct_names)?;
        writeln!(f, "  Edges: {} (dangling: {})", self.edges, self.dangling_edges)
    }
}
