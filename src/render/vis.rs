//! vis-network renderer
//!
//! Emits a self-contained HTML document that loads vis-network, feeds it
//! the node and edge data as JSON and, when enabled, mounts the physics
//! configuration panel under the canvas.

use std::collections::HashSet;
use serde::Serialize;
use serde_json::json;
use crate::Result;
use crate::graph::GraphSnapshot;
use crate::node::NodeId;
use super::{GraphRenderer, RenderOptions};

/// Script URL for the standalone vis-network bundle
pub const VIS_NETWORK_SCRIPT: &str = "https://unpkg.com/vis-network@9.1.9/standalone/umd/vis-network.min.js";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<script src="__SCRIPT__"></script>
<style>
  body { margin: 0; font-family: sans-serif; }
  #graph { width: 100%; height: __HEIGHT__px; border: 1px solid #ddd; }
  #config { width: 100%; }
</style>
</head>
<body>
<div id="graph"></div>
<div id="config"></div>
<script>
  var graph = __GRAPH__;
  var nodes = new vis.DataSet(graph.nodes);
  var edges = new vis.DataSet(graph.edges);
  var options = graph.options;
  options.configure.container = document.getElementById("config");
  var network = new vis.Network(document.getElementById("graph"), { nodes: nodes, edges: edges }, options);
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct VisNode<'a> {
    id: NodeId,
    label: &'a str,
    title: String,
}

#[derive(Serialize)]
struct VisEdge {
    from: NodeId,
    to: NodeId,
}

#[derive(Serialize)]
struct VisGraph<'a> {
    nodes: Vec<VisNode<'a>>,
    edges: Vec<VisEdge>,
    options: serde_json::Value,
}

/// Renders snapshots with vis-network
#[derive(Debug, Clone)]
pub struct VisNetworkRenderer {
    script_url: String,
}

impl Default for VisNetworkRenderer {
    fn default() -> Self {
        Self {
            script_url: VIS_NETWORK_SCRIPT.to_string(),
        }
    }
}

impl VisNetworkRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn options(options: &RenderOptions) -> serde_json::Value {
        json!({
            "edges": { "arrows": { "to": { "enabled": true } } },
            "physics": {
                "enabled": options.physics,
                "solver": "barnesHut",
                "stabilization": { "iterations": 200 }
            },
            "configure": {
                "enabled": options.physics_controls,
                "filter": "physics"
            },
            "interaction": { "hover": true }
        })
    }
}

impl GraphRenderer for VisNetworkRenderer {
    fn render(&self, snapshot: &GraphSnapshot, options: &RenderOptions) -> Result<String> {
        let ids: HashSet<NodeId> = snapshot.node_ids();

        let nodes: Vec<VisNode<'_>> = snapshot
            .nodes
            .iter()
            .map(|n| VisNode {
                id: n.id,
                label: &n.name,
                title: format!("#{} {}", n.id, n.name),
            })
            .collect();

        let mut edges = Vec::with_capacity(snapshot.edges.len());
        for edge in &snapshot.edges {
            if ids.contains(&edge.start_node) && ids.contains(&edge.end_node) {
                edges.push(VisEdge {
                    from: edge.start_node,
                    to: edge.end_node,
                });
            } else {
                tracing::warn!(id = %edge.id, start = %edge.start_node, end = %edge.end_node, "skipping edge with missing endpoint");
            }
        }

        let payload = script_json(&VisGraph {
            nodes,
            edges,
            options: Self::options(options),
        })?;

        // User data goes in last so no other placeholder is searched inside it
        Ok(TEMPLATE
            .replace("__SCRIPT__", &self.script_url)
            .replace("__HEIGHT__", &options.height.to_string())
            .replace("__GRAPH__", &payload))
    }
}

/// JSON that is safe inside a `<script>` element
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Edge, EdgeId};
    use crate::node::Node;

    fn snapshot() -> GraphSnapshot {
        GraphSnapshot::new(
            vec![Node::new(NodeId(1), "A"), Node::new(NodeId(2), "B")],
            vec![
                Edge::new(EdgeId(1), NodeId(1), NodeId(2)),
                Edge::new(EdgeId(2), NodeId(2), NodeId(99)),
            ],
        )
    }

    #[test]
    fn test_render_includes_data_and_options() {
        let html = VisNetworkRenderer::new().render(&snapshot(), &RenderOptions::default()).unwrap();
        assert!(html.contains(VIS_NETWORK_SCRIPT));
        assert!(html.contains(r#""label":"A""#));
        assert!(html.contains(r#"{"from":1,"to":2}"#));
        assert!(html.contains(r#""filter":"physics""#));
        assert!(html.contains("height: 1000px"));
        assert!(!html.contains("__GRAPH__"));
    }

    #[test]
    fn test_render_skips_dangling_edges() {
        let html = VisNetworkRenderer::new().render(&snapshot(), &RenderOptions::default()).unwrap();
        assert!(!html.contains(r#""to":99"#));
    }

    #[test]
    fn test_labels_cannot_close_the_script() {
        let snapshot = GraphSnapshot::new(vec![Node::new(NodeId(1), "</script><b>x</b>")], vec![]);
        let html = VisNetworkRenderer::new().render(&snapshot, &RenderOptions::default()).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
        assert!(html.contains("\\u003c/script\\u003e"));
    }

    #[test]
    fn test_placeholder_names_are_kept_verbatim() {
        let names = ["__GRAPH__", "__HEIGHT__", "__SCRIPT__", "__NODES__", "__EDGES__", "__OPTIONS__"];
        let nodes = names
            .iter()
            .enumerate()
            .map(|(i, name)| Node::new(NodeId(i as i64 + 1), *name))
            .collect();
        let snapshot = GraphSnapshot::new(nodes, vec![Edge::new(EdgeId(1), NodeId(1), NodeId(2))]);
        let html = VisNetworkRenderer::new().render(&snapshot, &RenderOptions::default()).unwrap();

        for name in names {
            assert!(html.contains(&format!(r#""label":"{}""#, name)), "label {} was rewritten", name);
        }
        assert!(html.contains(r#""edges":[{"from":1,"to":2}]"#));
        assert_eq!(html.matches(VIS_NETWORK_SCRIPT).count(), 1);
    }

    #[test]
    fn test_physics_can_be_disabled() {
        let options = RenderOptions {
            height: 400,
            physics: false,
            physics_controls: false,
        };
        let html = VisNetworkRenderer::new().render(&GraphSnapshot::default(), &options).unwrap();
        assert!(html.contains(r#""enabled":false,"filter":"physics""#));
        assert!(html.contains("height: 400px"));
    }
}
