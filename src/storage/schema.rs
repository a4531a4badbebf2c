//! Database schema definitions
//!
//! Tables live in a namespace attached to every connection, so each
//! statement is a template with a `{ns}` placeholder that is replaced by
//! the quoted namespace name.

use std::fmt;
use crate::{Error, Result};

/// SQL to create the nodes table
pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {ns}.nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the edges table
/// Endpoints are plain integers; referential integrity is kept by callers.
pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS {ns}.edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_node INTEGER NOT NULL,
    end_node INTEGER NOT NULL,
    name TEXT NOT NULL DEFAULT ''
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS {ns}.idx_nodes_name ON nodes(name)",
    "CREATE INDEX IF NOT EXISTS {ns}.idx_edges_start ON edges(start_node)",
    "CREATE INDEX IF NOT EXISTS {ns}.idx_edges_end ON edges(end_node)",
];

/// All schema creation statements for a namespace
pub fn all_schema_statements(ns: &Namespace) -> Vec<String> {
    let mut stmts = vec![ns.qualify(CREATE_NODES_TABLE), ns.qualify(CREATE_EDGES_TABLE)];
    stmts.extend(CREATE_INDEXES.iter().map(|stmt| ns.qualify(stmt)));
    stmts
}

/// The isolated set of tables owned by one application/user pair.
///
/// Format: `<app_name>_schema_<user>` where every non-alphanumeric
/// character has been stripped from the user identifier. Unicode letters
/// and digits are kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    /// Derive the namespace for an application and user
    pub fn derive(app_name: &str, user: &str) -> Result<Self> {
        let app_name = app_name.trim();
        if app_name.is_empty() {
            return Err(Error::InvalidNamespace("application name must not be empty".to_string()));
        }
        if let Some(bad) = app_name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
        {
            return Err(Error::InvalidNamespace(format!(
                "application name {:?} contains {:?}; only ASCII letters, digits, '_' and '-' are allowed",
                app_name, bad
            )));
        }

        let user: String = user.chars().filter(|c| c.is_alphanumeric()).collect();
        Ok(Self(format!("{}_schema_{}", app_name, user)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Quoted identifier, safe to splice into SQL
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0.replace('"', "\"\""))
    }

    /// Replace the `{ns}` placeholder in a statement template
    pub fn qualify(&self, template: &str) -> String {
        template.replace("{ns}", &self.quoted())
    }

    /// File name the namespace is stored under inside the data directory
    pub fn file_name(&self) -> String {
        format!("{}.db", self.0)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
