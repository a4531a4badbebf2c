//! graph-editor CLI - Edit, inspect and serve a directed graph of named nodes

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::Overrides;

#[derive(Parser)]
#[command(name = "graph-editor")]
#[command(version)]
#[command(about = "Browser-based directed graph editor backed by SQLite")]
#[command(long_about = r#"
graph-editor keeps named nodes and directed edges in two tables and serves
an editing page with an interactive network view.

Example usage:
  graph-editor init
  graph-editor add-node Paris
  graph-editor add-edge Paris Rome
  graph-editor serve --port 8501
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./graph-editor.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the database files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// User the graph namespace is derived from
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the schema
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Serve the editing page and JSON API
    Serve {
        /// Port to listen on (overrides [server] port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Add a node
    AddNode {
        /// Node name (trimmed, must not be empty)
        name: String,
    },

    /// Add an edge between two nodes, looked up by name
    AddEdge {
        /// Name of the start node
        start: String,
        /// Name of the end node
        end: String,
    },

    /// Delete every node with this name and the edges touching them
    DeleteNode {
        /// Node name
        name: String,
    },

    /// Delete every edge from START_ID to END_ID
    DeleteEdge {
        /// Start node id
        start_id: i64,
        /// End node id
        end_id: i64,
    },

    /// List nodes
    Nodes {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputMode,
    },

    /// List edges
    Edges {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputMode,
    },

    /// Show nodes, the name index and edges
    State {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputMode,
    },

    /// Show statistics about the stored graph
    Stats {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputMode,
    },
}

/// How a command prints its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputMode {
    #[default]
    Text,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Text
    }
}

/// Print a machine-readable success envelope
pub fn emit_success(output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    if output_mode.is_human() {
        return Ok(());
    }
    let envelope = serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(err) = run(cli) {
        graph_editor::ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = Overrides {
        config: cli.config,
        data_dir: cli.data_dir,
        user: cli.user,
    };

    match cli.command {
        Commands::Init { force } => commands::run_init(&overrides, force),
        Commands::Serve { port } => commands::run_serve(&overrides, port),
        Commands::AddNode { name } => commands::run_add_node(&overrides, &name),
        Commands::AddEdge { start, end } => commands::run_add_edge(&overrides, &start, &end),
        Commands::DeleteNode { name } => commands::run_delete_node(&overrides, &name),
        Commands::DeleteEdge { start_id, end_id } => commands::run_delete_edge(&overrides, start_id, end_id),
        Commands::Nodes { format } => commands::run_nodes(&overrides, format),
        Commands::Edges { format } => commands::run_edges(&overrides, format),
        Commands::State { format } => commands::run_state(&overrides, format),
        Commands::Stats { format } => commands::run_stats(&overrides, format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "graph-editor", "add-edge", "Paris", "Rome", "--user", "alice@example.com", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.user.as_deref(), Some("alice@example.com"));
        match cli.command {
            Commands::AddEdge { start, end } => {
                assert_eq!(start, "Paris");
                assert_eq!(end, "Rome");
            }
            _ => panic!("expected add-edge"),
        }
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["graph-editor", "state", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::State { format: OutputMode::Json }));

        let cli = Cli::try_parse_from(["graph-editor", "nodes"]).unwrap();
        assert!(matches!(cli.command, Commands::Nodes { format: OutputMode::Text }));
    }
}
