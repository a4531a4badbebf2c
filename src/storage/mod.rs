//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with two tables inside a per-user namespace:
//! - nodes(id, name)
//! - edges(id, start_node, end_node, name)
//!
//! Connections come from a [`ConnectionManager`] that rebuilds its pool
//! whenever the store credential goes stale.

pub mod credential;
pub mod pool;
pub mod schema;
pub mod sqlite;

pub use credential::{Credential, CredentialSource, CommandCredential, EnvCredential, StaticCredential};
pub use pool::{ConnectionManager, ConnectionParams, PoolStatus, PooledConnection, SqliteConnector};
pub use schema::Namespace;
pub use sqlite::{SqliteStore, Tables, NodeRemoval, DbStats};
