//! Editor page - forms for adding nodes and edges above the graph view
//!
//! Every request reloads the whole graph and renders it again; there is no
//! client-side state to keep in sync.

use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::Html,
};
use serde::Deserialize;
use std::sync::Arc;
use crate::graph::GraphSnapshot;
use crate::query::GraphAccess;
use crate::server::{ApiError, AppState};

#[derive(Deserialize)]
pub struct NodeForm {
    #[serde(default)]
    pub name: String,
}

#[derive(Deserialize)]
pub struct EdgeForm {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Message shown above the forms after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

type PageResponse = (StatusCode, Html<String>);

pub async fn index(State(state): State<Arc<AppState>>) -> PageResponse {
    render_page(&state, StatusCode::OK, None).await
}

pub async fn add_node(State(state): State<Arc<AppState>>, Form(form): Form<NodeForm>) -> PageResponse {
    let name = form.name;
    let result = state.blocking(move |store| store.insert_node(&name)).await;
    match result {
        Ok(node) => {
            let notice = Notice::Success(format!("Node \"{}\" added successfully!", node.name));
            render_page(&state, StatusCode::OK, Some(notice)).await
        }
        Err(e) => render_page(&state, e.status, Some(Notice::Error(e.message))).await,
    }
}

pub async fn add_edge(State(state): State<Arc<AppState>>, Form(form): Form<EdgeForm>) -> PageResponse {
    let result = state
        .blocking(move |store| GraphAccess::new(store).add_edge_by_name(&form.start, &form.end))
        .await;
    match result {
        Ok(edge) => {
            let notice = Notice::Success(format!(
                "Edge {} \u{2192} {} added successfully!",
                edge.start_node, edge.end_node
            ));
            render_page(&state, StatusCode::OK, Some(notice)).await
        }
        Err(e) => render_page(&state, e.status, Some(Notice::Error(e.message))).await,
    }
}

async fn render_page(state: &Arc<AppState>, status: StatusCode, notice: Option<Notice>) -> PageResponse {
    let renderer = Arc::clone(&state.renderer);
    let options = state.render.clone();
    let graph = state
        .blocking(move |store| {
            let snapshot = GraphAccess::new(store).snapshot()?;
            let document = renderer.render(&snapshot, &options)?;
            Ok((snapshot, document))
        })
        .await;

    match graph {
        Ok((snapshot, document)) => (status, Html(page_html(notice.as_ref(), &snapshot, &document, state.render.height))),
        Err(ApiError { status: load_status, message }) => {
            tracing::error!(error = %message, "failed to load graph for page");
            let notice = Notice::Error(format!("Could not load the graph: {}", message));
            let status = if status.is_success() { load_status } else { status };
            (status, Html(page_html(Some(&notice), &GraphSnapshot::default(), "", state.render.height)))
        }
    }
}

fn page_html(notice: Option<&Notice>, snapshot: &GraphSnapshot, document: &str, height: u32) -> String {
    let notice_html = match notice {
        Some(Notice::Success(msg)) => format!("<div class=\"notice success\">\u{2705} {}</div>", escape_html(msg)),
        Some(Notice::Error(msg)) => format!("<div class=\"notice error\">\u{274c} {}</div>", escape_html(msg)),
        None => String::new(),
    };

    let graph_html = if document.is_empty() {
        String::new()
    } else {
        format!(
            "<iframe title=\"graph\" srcdoc=\"{}\" style=\"width:100%;height:{}px;border:0\"></iframe>",
            escape_html(document),
            height.saturating_add(40)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Graph Editing App</title>
<style>
  body {{ font-family: sans-serif; margin: 2rem; }}
  form {{ margin-bottom: 1rem; }}
  input {{ margin-right: .5rem; }}
  .notice {{ padding: .5rem 1rem; margin-bottom: 1rem; border-radius: 4px; }}
  .success {{ background: #e6f4ea; }}
  .error {{ background: #fce8e6; }}
</style>
</head>
<body>
<h1>&#x1F4DD; Graph Editor</h1>
<hr>
{notice}
<h3>Add New Node</h3>
<form method="post" action="/nodes">
  <input type="text" name="name" placeholder="name" aria-label="Enter a new node name">
  <button type="submit">Add Node</button>
</form>
<hr>
<h3>Add New Edge</h3>
<form method="post" action="/edges">
  <input type="text" name="start" placeholder="Start Node" aria-label="Enter a start node">
  <input type="text" name="end" placeholder="End Node" aria-label="Enter an end node">
  <button type="submit">Add Edge</button>
</form>
<hr>
<h3>Interactive Visualization</h3>
<p>{nodes} nodes, {edges} edges</p>
{graph}
</body>
</html>
"#,
        notice = notice_html,
        nodes = snapshot.nodes.len(),
        edges = snapshot.edges.len(),
        graph = graph_html,
    )
}

/// Escape text for HTML element content and double-quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;
    use crate::server::create_router;
    use crate::storage::SqliteStore;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> (tempfile::TempDir, Arc<AppState>) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_local(dir.path(), "page").unwrap();
        let state = Arc::new(AppState::new(Arc::new(store), RenderOptions::default()));
        (dir, state)
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, String) {
        let response = create_router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn test_iframe_height_saturates() {
        let html = page_html(None, &GraphSnapshot::default(), "<p>graph</p>", u32::MAX);
        assert!(html.contains(&format!("height:{}px", u32::MAX)));

        let html = page_html(None, &GraphSnapshot::default(), "<p>graph</p>", 600);
        assert!(html.contains("height:640px"));
    }

    #[tokio::test]
    async fn test_index_has_forms_and_graph() {
        let (_dir, state) = app();
        let (status, html) = send(&state, Request::get("/").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("action=\"/nodes\""));
        assert!(html.contains("action=\"/edges\""));
        assert!(html.contains("<iframe"));
        assert!(html.contains("0 nodes, 0 edges"));
    }

    #[tokio::test]
    async fn test_form_submissions_reload_graph() {
        let (_dir, state) = app();

        let (status, html) = send(&state, post_form("/nodes", "name=+Alpha+")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Node &quot;Alpha&quot; added successfully!"));
        send(&state, post_form("/nodes", "name=Beta")).await;

        let (status, html) = send(&state, post_form("/edges", "start=Alpha&end=Beta")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("added successfully!"));
        assert!(html.contains("2 nodes, 1 edges"));
    }

    #[tokio::test]
    async fn test_unknown_name_shows_validation_message() {
        let (_dir, state) = app();
        send(&state, post_form("/nodes", "name=Alpha")).await;

        let (status, html) = send(&state, post_form("/edges", "start=Alpha&end=Zeta")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(html.contains("notice error"));
        assert!(html.contains("Node not found: Zeta"));
        assert!(html.contains("1 nodes, 0 edges"));
    }

    #[tokio::test]
    async fn test_blank_node_form_is_rejected() {
        let (_dir, state) = app();
        let (status, html) = send(&state, post_form("/nodes", "name=++")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("must not be empty"));
        assert!(state.store.list_nodes().unwrap().is_empty());
    }
}
