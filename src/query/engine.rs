//! Graph access implementation
//!
//! Provides the operations the editor page is built from:
//! - Name to id resolution (lowest id wins on duplicate names)
//! - Edge creation by node names
//! - Whole-graph snapshots for rendering

use serde::Serialize;
use crate::{Error, Result};
use crate::edge::Edge;
use crate::graph::{GraphSnapshot, NameIndex};
use crate::node::{Node, NodeId, NodeName};
use crate::storage::{SqliteStore, Tables};

/// Debug view of the graph: raw rows plus the index names resolve through
#[derive(Debug, Clone, Serialize)]
pub struct GraphState {
    pub nodes: Vec<Node>,
    pub name_index: NameIndex,
    pub edges: Vec<Edge>,
}

/// Graph access layer over a store
pub struct GraphAccess<'a> {
    store: &'a SqliteStore,
}

impl<'a> GraphAccess<'a> {
    /// Create a new access layer
    pub fn new(store: &'a SqliteStore) -> Self {
        Self { store }
    }

    /// Resolve a user-entered name to a node id
    ///
    /// Reads the node list fresh. When several nodes share the name the
    /// lowest id is returned.
    pub fn resolve_name_to_id(&self, name: &str) -> Result<NodeId> {
        let name = NodeName::parse(name)?;
        self.store.read(|tables| resolve(tables, &name))
    }

    /// Add an edge between two nodes given by name
    ///
    /// Resolution and insertion share one write transaction, so either both
    /// names resolve and the edge is stored, or nothing is written.
    pub fn add_edge_by_name(&self, start_name: &str, end_name: &str) -> Result<Edge> {
        let start_name = NodeName::parse(start_name)?;
        let end_name = NodeName::parse(end_name)?;

        let edge = self.store.write(|tables| {
            let index = NameIndex::from_nodes(&tables.list_nodes()?);
            let start = lookup(&index, &start_name)?;
            let end = lookup(&index, &end_name)?;
            tables.insert_edge(start, end)
        });

        match &edge {
            Ok(edge) => tracing::info!(
                id = %edge.id, start = %start_name, end = %end_name,
                start_id = %edge.start_node, end_id = %edge.end_node,
                "edge added by name"
            ),
            Err(e) if e.is_validation() => tracing::warn!(start = %start_name, end = %end_name, error = %e, "edge rejected"),
            Err(_) => {}
        }
        edge
    }

    /// Read nodes and edges together for rendering
    pub fn snapshot(&self) -> Result<GraphSnapshot> {
        let snapshot = self
            .store
            .read(|tables| Ok(GraphSnapshot::new(tables.list_nodes()?, tables.list_edges()?)))?;
        tracing::debug!(nodes = snapshot.nodes.len(), edges = snapshot.edges.len(), "snapshot loaded");
        Ok(snapshot)
    }

    /// Nodes, the resolved name index and edges, for troubleshooting
    pub fn state(&self) -> Result<GraphState> {
        let snapshot = self.snapshot()?;
        let name_index = snapshot.name_index();
        Ok(GraphState {
            nodes: snapshot.nodes,
            name_index,
            edges: snapshot.edges,
        })
    }
}

fn resolve(tables: &Tables<'_>, name: &NodeName) -> Result<NodeId> {
    let index = NameIndex::from_nodes(&tables.list_nodes()?);
    lookup(&index, name)
}

fn lookup(index: &NameIndex, name: &NodeName) -> Result<NodeId> {
    index
        .get(name.as_str())
        .ok_or_else(|| Error::NameNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_local(dir.path(), "access").unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_edge_by_name() {
        let (_dir, store) = store();
        let a = store.insert_node("A").unwrap();
        let b = store.insert_node("B").unwrap();
        let access = GraphAccess::new(&store);

        let edge = access.add_edge_by_name(" A", "B ").unwrap();
        assert_eq!(edge.endpoints(), (a.id, b.id));

        let pairs: Vec<_> = store.list_edges().unwrap().iter().map(Edge::endpoints).collect();
        assert_eq!(pairs, vec![(NodeId(1), NodeId(2))]);
    }

    #[test]
    fn test_unknown_name_inserts_nothing() {
        let (_dir, store) = store();
        store.insert_node("A").unwrap();
        let access = GraphAccess::new(&store);

        let err = access.add_edge_by_name("A", "Z").unwrap_err();
        assert!(matches!(err, Error::NameNotFound(ref name) if name == "Z"));
        assert!(store.list_edges().unwrap().is_empty());

        let err = access.add_edge_by_name("Q", "A").unwrap_err();
        assert!(matches!(err, Error::NameNotFound(ref name) if name == "Q"));
        assert!(store.list_edges().unwrap().is_empty());
    }

    #[test]
    fn test_resolve_name() {
        let (_dir, store) = store();
        store.insert_node("A").unwrap();
        let b = store.insert_node("B").unwrap();
        let access = GraphAccess::new(&store);

        assert_eq!(access.resolve_name_to_id("B").unwrap(), b.id);
        assert!(matches!(access.resolve_name_to_id("C"), Err(Error::NameNotFound(_))));
        assert!(matches!(access.resolve_name_to_id("  "), Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_duplicate_names_resolve_to_lowest_id() {
        let (_dir, store) = store();
        let first = store.insert_node("A").unwrap();
        let second = store.insert_node("A").unwrap();
        let target = store.insert_node("T").unwrap();
        assert!(first.id < second.id);

        let access = GraphAccess::new(&store);
        assert_eq!(access.resolve_name_to_id("A").unwrap(), first.id);

        // Still the lowest id after the first duplicate is gone and a new one appears
        store.delete_node("A").unwrap();
        let third = store.insert_node("A").unwrap();
        let fourth = store.insert_node("A").unwrap();
        let edge = access.add_edge_by_name("A", "T").unwrap();
        assert_eq!(edge.endpoints(), (third.id, target.id));
        assert_ne!(edge.start_node, fourth.id);
    }

    #[test]
    fn test_snapshot_is_repeatable() {
        let (_dir, store) = store();
        store.insert_node("A").unwrap();
        store.insert_node("B").unwrap();
        let access = GraphAccess::new(&store);
        access.add_edge_by_name("A", "B").unwrap();

        let first = access.snapshot().unwrap();
        let second = access.snapshot().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.nodes.len(), 2);
        assert_eq!(first.edges.len(), 1);
    }

    #[test]
    fn test_node_delete_leaves_no_dangling_edges() {
        let (_dir, store) = store();
        for name in ["A", "B", "C"] {
            store.insert_node(name).unwrap();
        }
        let access = GraphAccess::new(&store);
        access.add_edge_by_name("A", "B").unwrap();
        access.add_edge_by_name("B", "C").unwrap();
        access.add_edge_by_name("C", "A").unwrap();

        let removed = store.delete_node("B").unwrap();
        assert_eq!(removed.edges, 2);
        let snapshot = access.snapshot().unwrap();
        assert!(snapshot.dangling_edges().is_empty());
        assert!(!snapshot.edges.iter().any(|e| e.touches(NodeId(2))));
        assert_eq!(snapshot.edges.len(), 1);
    }

    #[test]
    fn test_state_exposes_name_index() {
        let (_dir, store) = store();
        store.insert_node("A").unwrap();
        store.insert_node("A").unwrap();
        let state = GraphAccess::new(&store).state().unwrap();
        assert_eq!(state.nodes.len(), 2);
        assert_eq!(state.name_index.len(), 1);
        assert_eq!(state.name_index.get("A"), Some(NodeId(1)));
    }
}
