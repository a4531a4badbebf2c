use crate::{emit_success, OutputMode};
use anyhow::Context;
use graph_editor::config::{self, GraphEditorConfig};
use graph_editor::query::GraphAccess;
use graph_editor::server::{self, AppState};
use graph_editor::storage::SqliteStore;
use graph_editor::ui::{self, theme, Icons};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Global CLI flags layered over the file and environment config
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub user: Option<String>,
}

impl Overrides {
    fn apply(&self, config: &mut GraphEditorConfig) {
        if let Some(dir) = &self.data_dir {
            config.store.data_dir = dir.clone();
        }
        if let Some(user) = &self.user {
            config.store.user = user.clone();
        }
    }

    pub fn resolve(&self) -> anyhow::Result<GraphEditorConfig> {
        let mut config = config::resolve_config(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config::default_config_path)
    }
}

fn open_store(config: &GraphEditorConfig) -> anyhow::Result<SqliteStore> {
    let params = config.store.connection_params();
    let credentials = config.credential.build()?;
    tracing::debug!(source = %credentials.describe(), "using credential source");

    SqliteStore::connect(&params, credentials)
        .with_context(|| format!("failed to open graph store at {}", params.database_path().display()))
}

fn node_name(name: &str) -> String {
    name.style(theme().node).to_string()
}

pub fn run_init(overrides: &Overrides, force: bool) -> anyhow::Result<()> {
    let path = overrides.config_path();
    let mut config = GraphEditorConfig::default();
    overrides.apply(&mut config);

    config::write_config(&path, &config, force)?;
    let store = open_store(&config)?;

    ui::success("Initialized graph editor");
    ui::status(Icons::GEAR, "Config", &path.display().to_string());
    ui::status(
        Icons::DATABASE,
        "Database",
        &config.store.connection_params().database_path().display().to_string(),
    );
    ui::status(Icons::PERSON, "Namespace", store.namespace().as_str());
    store.shutdown();
    Ok(())
}

pub fn run_serve(overrides: &Overrides, port: Option<u16>) -> anyhow::Result<()> {
    let config = overrides.resolve()?;
    let port = port.unwrap_or(config.server.port);
    let store = open_store(&config)?;

    ui::header("Graph Editor");
    ui::status(Icons::PERSON, "Namespace", store.namespace().as_str());

    let state = Arc::new(AppState::new(Arc::new(store), config.render.clone()));
    let rt = Runtime::new()?;
    rt.block_on(server::start_server(port, state))
}

pub fn run_add_node(overrides: &Overrides, name: &str) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let node = store.insert_node(name)?;
    ui::success(&format!("Node {} added (id {})", node_name(&node.name), node.id));
    Ok(())
}

pub fn run_add_edge(overrides: &Overrides, start: &str, end: &str) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let edge = GraphAccess::new(&store).add_edge_by_name(start, end)?;
    ui::success(&format!(
        "Edge {} {} {} added ({} -> {})",
        node_name(start.trim()),
        Icons::EDGE,
        node_name(end.trim()),
        edge.start_node,
        edge.end_node
    ));
    Ok(())
}

pub fn run_delete_node(overrides: &Overrides, name: &str) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let removal = store.delete_node(name)?;
    if removal.nodes == 0 {
        ui::warn(&format!("No node named {}", name.trim()));
        return Ok(());
    }
    ui::success(&format!(
        "{} Removed {} node(s) named {} and {} edge(s)",
        Icons::DEL,
        removal.nodes,
        node_name(name.trim()),
        removal.edges
    ));
    Ok(())
}

pub fn run_delete_edge(overrides: &Overrides, start_id: i64, end_id: i64) -> anyhow::Result<()> {
    use graph_editor::NodeId;

    let store = open_store(&overrides.resolve()?)?;
    let removed = store.delete_edge(NodeId(start_id), NodeId(end_id))?;
    if removed == 0 {
        ui::warn(&format!("No edge from {} to {}", start_id, end_id));
        return Ok(());
    }
    ui::success(&format!("{} Removed {} edge(s) {} -> {}", Icons::DEL, removed, start_id, end_id));
    Ok(())
}

pub fn run_nodes(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let nodes = store.list_nodes()?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "nodes", serde_json::to_value(&nodes)?);
    }

    ui::section(&format!("Nodes ({})", nodes.len()));
    if nodes.is_empty() {
        println!("{}", ui::muted("  no nodes yet"));
    } else {
        println!("{}", ui::nodes_table(&nodes));
    }
    Ok(())
}

pub fn run_edges(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let edges = store.list_edges()?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "edges", serde_json::to_value(&edges)?);
    }

    ui::section(&format!("Edges ({})", edges.len()));
    if edges.is_empty() {
        println!("{}", ui::muted("  no edges yet"));
    } else {
        println!("{}", ui::edges_table(&edges));
    }
    Ok(())
}

pub fn run_state(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let state = GraphAccess::new(&store).state()?;

    if !output_mode.is_human() {
        return emit_success(output_mode, "state", serde_json::to_value(&state)?);
    }

    ui::section("Nodes");
    println!("{}", ui::nodes_table(&state.nodes));

    ui::section("Name Index");
    for (name, id) in state.name_index.iter() {
        ui::summary_row(&format!("{}:", name), &id.to_string());
    }

    ui::section("Edges");
    println!("{}", ui::edges_table(&state.edges));
    Ok(())
}

pub fn run_stats(overrides: &Overrides, output_mode: OutputMode) -> anyhow::Result<()> {
    let store = open_store(&overrides.resolve()?)?;
    let db = store.stats()?;
    let graph = GraphAccess::new(&store).snapshot()?.stats();

    if !output_mode.is_human() {
        let data = serde_json::json!({
            "database": db,
            "graph": graph,
        });
        return emit_success(output_mode, "stats", data);
    }

    let nodes = db.nodes.to_string();
    let edges = db.edges.to_string();
    let distinct = graph.distinct_names.to_string();
    let dangling = graph.dangling_edges.to_string();
    let pool = format!("gen {}, {}/{} open, {} idle", db.pool.generation, db.pool.open, db.pool.max, db.pool.idle);

    ui::section(&format!("{} Graph Statistics", Icons::STATS));
    ui::info("Namespace", &db.namespace);
    println!(
        "{}",
        ui::stats_table(&[
            ("Nodes", nodes.as_str()),
            ("Distinct names", distinct.as_str()),
            ("Edges", edges.as_str()),
            ("Dangling edges", dangling.as_str()),
            ("Pool", pool.as_str()),
        ])
    );
    if graph.dangling_edges > 0 {
        ui::warn(&format!("{} edge(s) reference missing nodes and are hidden in the view", dangling));
    }
    Ok(())
}
