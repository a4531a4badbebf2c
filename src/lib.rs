//! # graph-editor - Browser-based directed graph editor
//!
//! Named nodes, unlabeled edges, persisted in two relational tables and
//! rendered as an interactive network view.
//!
//! graph-editor provides:
//! - A storage gateway over SQLite with a per application/user namespace
//! - A connection manager that rebuilds its pool when the credential ages out
//! - Name to id resolution for edge creation and full graph snapshots
//! - A vis-network renderer and an axum web surface around it

pub mod node;
pub mod edge;
pub mod graph;
pub mod storage;
pub mod query;
pub mod render;
pub mod server;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use node::{Node, NodeId, NodeName};
pub use edge::{Edge, EdgeId};
pub use graph::{GraphSnapshot, NameIndex};
pub use storage::SqliteStore;
pub use query::GraphAccess;

/// Result type alias for graph-editor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for graph-editor operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid node name: {0}")]
    InvalidName(String),

    #[error("Node not found: {0}")]
    NameNotFound(String),

    #[error("Invalid namespace: {0}")]
    InvalidNamespace(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl Error {
    /// True for errors caused by what the user typed rather than by the system
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidName(_) | Error::NameNotFound(_))
    }
}
