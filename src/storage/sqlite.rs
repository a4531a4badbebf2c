//! SQLite storage implementation

use std::path::Path;
use std::sync::Arc;
use rusqlite::{Connection, Transaction, TransactionBehavior, params};
use crate::Result;
use crate::edge::{Edge, EdgeId};
use crate::node::{Node, NodeId, NodeName};
use super::credential::{CredentialSource, StaticCredential};
use super::pool::{ConnectionManager, ConnectionParams, PoolStatus, SqliteConnector};
use super::schema::{self, Namespace};

/// Storage gateway for the graph: nodes and edges inside one namespace.
///
/// Every public method acquires its own connection and is its own
/// implicit transaction, except where noted.
pub struct SqliteStore {
    manager: Arc<ConnectionManager>,
    namespace: Namespace,
}

impl SqliteStore {
    /// Connect with explicit parameters and credential source, then ensure the schema
    pub fn connect(params: &ConnectionParams, credentials: Box<dyn CredentialSource>) -> Result<Self> {
        let connector = SqliteConnector::new(params)?;
        let namespace = connector.namespace().clone();
        let manager = ConnectionManager::new(connector, credentials, params)?;

        let store = Self {
            manager: Arc::new(manager),
            namespace,
        };
        store.ensure_schema()?;
        tracing::info!(namespace = %store.namespace, database = ?params.database_path(), "store ready");
        Ok(store)
    }

    /// Open a local store under `data_dir` (creates it if it doesn't exist)
    pub fn open_local(data_dir: &Path, user: &str) -> Result<Self> {
        let params = ConnectionParams::local(data_dir, user);
        Self::connect(&params, Box::new(StaticCredential::new("local")))
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Create the namespace tables if they are absent (idempotent)
    pub fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.manager.acquire()?;
        let tx = conn.transaction()?;
        for stmt in schema::all_schema_statements(&self.namespace) {
            tx.execute(&stmt, [])?;
        }
        tx.commit()?;
        Ok(())
    }

    // ========== Node Operations ==========

    /// Append a node; duplicate names are allowed
    pub fn insert_node(&self, name: &str) -> Result<Node> {
        let name = NodeName::parse(name)?;
        let conn = self.manager.acquire()?;
        let node = Tables::new(&conn, &self.namespace).insert_node(&name)?;
        tracing::info!(id = %node.id, name = %node.name, "node added");
        Ok(node)
    }

    /// Get all nodes ordered by id
    pub fn list_nodes(&self) -> Result<Vec<Node>> {
        let conn = self.manager.acquire()?;
        Tables::new(&conn, &self.namespace).list_nodes()
    }

    /// Remove every node with this name and every edge touching one of them.
    ///
    /// Runs as a single write transaction.
    pub fn delete_node(&self, name: &str) -> Result<NodeRemoval> {
        let name = NodeName::parse(name)?;
        let removal = self.write(|tables| {
            let ids = tables.node_ids_named(&name)?;
            let mut removal = NodeRemoval::default();
            for id in &ids {
                removal.edges += tables.delete_edges_touching(*id)?;
            }
            removal.nodes = tables.delete_nodes_named(&name)?;
            Ok(removal)
        })?;
        tracing::info!(name = %name, nodes = removal.nodes, edges = removal.edges, "node deleted");
        Ok(removal)
    }

    // ========== Edge Operations ==========

    /// Append an edge; endpoints are not checked against the nodes table
    pub fn insert_edge(&self, start: NodeId, end: NodeId) -> Result<Edge> {
        let conn = self.manager.acquire()?;
        let edge = Tables::new(&conn, &self.namespace).insert_edge(start, end)?;
        tracing::info!(id = %edge.id, start = %start, end = %end, "edge added");
        Ok(edge)
    }

    /// Get all edges ordered by id
    pub fn list_edges(&self) -> Result<Vec<Edge>> {
        let conn = self.manager.acquire()?;
        Tables::new(&conn, &self.namespace).list_edges()
    }

    /// Remove every edge from `start` to `end`; returns how many went
    pub fn delete_edge(&self, start: NodeId, end: NodeId) -> Result<usize> {
        let conn = self.manager.acquire()?;
        let removed = Tables::new(&conn, &self.namespace).delete_edge(start, end)?;
        tracing::info!(start = %start, end = %end, removed, "edge deleted");
        Ok(removed)
    }

    // ========== Transactions ==========

    /// Run `f` inside a read transaction so every query sees the same state
    pub fn read<T>(&self, f: impl FnOnce(&Tables<'_>) -> Result<T>) -> Result<T> {
        self.in_transaction(TransactionBehavior::Deferred, f)
    }

    /// Run `f` inside a write transaction; rolled back if `f` fails
    pub fn write<T>(&self, f: impl FnOnce(&Tables<'_>) -> Result<T>) -> Result<T> {
        self.in_transaction(TransactionBehavior::Immediate, f)
    }

    fn in_transaction<T>(
        &self,
        behavior: TransactionBehavior,
        f: impl FnOnce(&Tables<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.manager.acquire()?;
        let tx: Transaction<'_> = conn.transaction_with_behavior(behavior)?;
        let value = f(&Tables::new(&tx, &self.namespace))?;
        tx.commit()?;
        Ok(value)
    }

    // ========== Bookkeeping ==========

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        let (nodes, edges) = self.read(|tables| Ok((tables.count_nodes()?, tables.count_edges()?)))?;
        Ok(DbStats {
            namespace: self.namespace.to_string(),
            nodes,
            edges,
            pool: self.manager.status()?,
        })
    }

    /// Close the connection pool; the store is unusable afterwards
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }
}

/// Statement layer over one connection or transaction.
pub struct Tables<'c> {
    conn: &'c Connection,
    ns: &'c Namespace,
}

impl<'c> Tables<'c> {
    pub fn new(conn: &'c Connection, ns: &'c Namespace) -> Self {
        Self { conn, ns }
    }

    fn sql(&self, template: &str) -> String {
        self.ns.qualify(template)
    }

    pub fn insert_node(&self, name: &NodeName) -> Result<Node> {
        self.conn.execute(
            &self.sql("INSERT INTO {ns}.nodes (name) VALUES (?1)"),
            [name.as_str()],
        )?;
        Ok(Node::new(NodeId(self.conn.last_insert_rowid()), name.as_str()))
    }

    pub fn list_nodes(&self) -> Result<Vec<Node>> {
        let mut stmt = self.conn.prepare(&self.sql("SELECT id, name FROM {ns}.nodes ORDER BY id"))?;
        let nodes = stmt
            .query_map([], |row| Ok(Node::new(NodeId(row.get(0)?), row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(nodes)
    }

    pub fn node_ids_named(&self, name: &NodeName) -> Result<Vec<NodeId>> {
        let mut stmt = self
            .conn
            .prepare(&self.sql("SELECT id FROM {ns}.nodes WHERE name = ?1 ORDER BY id"))?;
        let ids = stmt
            .query_map([name.as_str()], |row| Ok(NodeId(row.get(0)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    pub fn delete_nodes_named(&self, name: &NodeName) -> Result<usize> {
        let removed = self
            .conn
            .execute(&self.sql("DELETE FROM {ns}.nodes WHERE name = ?1"), [name.as_str()])?;
        Ok(removed)
    }

    pub fn insert_edge(&self, start: NodeId, end: NodeId) -> Result<Edge> {
        self.conn.execute(
            &self.sql("INSERT INTO {ns}.edges (start_node, end_node, name) VALUES (?1, ?2, '')"),
            params![start.0, end.0],
        )?;
        Ok(Edge::new(EdgeId(self.conn.last_insert_rowid()), start, end))
    }

    pub fn list_edges(&self) -> Result<Vec<Edge>> {
        let mut stmt = self.conn.prepare(&self.sql(
            "SELECT id, start_node, end_node, name FROM {ns}.edges ORDER BY id",
        ))?;
        let edges = stmt
            .query_map([], |row| {
                Ok(Edge {
                    id: EdgeId(row.get(0)?),
                    start_node: NodeId(row.get(1)?),
                    end_node: NodeId(row.get(2)?),
                    name: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(edges)
    }

    pub fn delete_edge(&self, start: NodeId, end: NodeId) -> Result<usize> {
        let removed = self.conn.execute(
            &self.sql("DELETE FROM {ns}.edges WHERE start_node = ?1 AND end_node = ?2"),
            params![start.0, end.0],
        )?;
        Ok(removed)
    }

    pub fn delete_edges_touching(&self, node: NodeId) -> Result<usize> {
        let removed = self.conn.execute(
            &self.sql("DELETE FROM {ns}.edges WHERE start_node = ?1 OR end_node = ?1"),
            [node.0],
        )?;
        Ok(removed)
    }

    pub fn count_nodes(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&self.sql("SELECT COUNT(*) FROM {ns}.nodes"), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn count_edges(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(&self.sql("SELECT COUNT(*) FROM {ns}.edges"), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// What a node deletion removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct NodeRemoval {
    pub nodes: usize,
    pub edges: usize,
}

/// Database statistics
#[derive(Debug, Clone, serde::Serialize)]
pub struct DbStats {
    pub namespace: String,
    pub nodes: usize,
    pub edges: usize,
    pub pool: PoolStatus,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Namespace: {}", self.namespace)?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Edges: {}", self.edges)?;
        writeln!(
            f,
            "  Pool: generation {}, {}/{} open, {} idle",
            self.pool.generation, self.pool.open, self.pool.max, self.pool.idle
        )
    }
}
