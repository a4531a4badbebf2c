use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::edge::Edge;
use crate::graph::GraphSnapshot;
use crate::node::{Node, NodeId};
use crate::query::{GraphAccess, GraphState};
use crate::server::{ApiError, AppState};
use crate::storage::NodeRemoval;

#[derive(Deserialize)]
pub struct NewNode {
    pub name: String,
}

#[derive(Deserialize)]
pub struct NewEdge {
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct EdgePairParams {
    pub start: i64,
    pub end: i64,
}

#[derive(Serialize)]
pub struct EdgeRemoval {
    pub removed: usize,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "graph-editor"
    }))
}

pub async fn get_graph(State(state): State<Arc<AppState>>) -> Result<Json<GraphSnapshot>, ApiError> {
    let snapshot = state.blocking(|store| GraphAccess::new(store).snapshot()).await?;
    Ok(Json(snapshot))
}

pub async fn get_state(State(state): State<Arc<AppState>>) -> Result<Json<GraphState>, ApiError> {
    let graph_state = state.blocking(|store| GraphAccess::new(store).state()).await?;
    Ok(Json(graph_state))
}

pub async fn create_node(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewNode>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    let node = state.blocking(move |store| store.insert_node(&payload.name)).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

pub async fn delete_node(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<NodeRemoval>, ApiError> {
    let removal = state.blocking(move |store| store.delete_node(&name)).await?;
    Ok(Json(removal))
}

pub async fn create_edge(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewEdge>,
) -> Result<(StatusCode, Json<Edge>), ApiError> {
    let edge = state
        .blocking(move |store| GraphAccess::new(store).add_edge_by_name(&payload.start, &payload.end))
        .await?;
    Ok((StatusCode::CREATED, Json(edge)))
}

pub async fn delete_edge(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EdgePairParams>,
) -> Result<Json<EdgeRemoval>, ApiError> {
    let removed = state
        .blocking(move |store| store.delete_edge(NodeId(params.start), NodeId(params.end)))
        .await?;
    Ok(Json(EdgeRemoval { removed }))
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
        let store = SqliteStore::open_local(dir.path(), "api").unwrap();
        let state = Arc::new(AppState::new(Arc::new(store), RenderOptions::default()));
        (dir, state)
    }

    async fn send(state: &Arc<AppState>, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = create_router(Arc::clone(state)).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_node_and_edge_lifecycle() {
        let (_dir, state) = app();

        let (status, node) = send(&state, post_json("/api/nodes", serde_json::json!({"name": " A "}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(node, serde_json::json!({"id": 1, "name": "A"}));
        send(&state, post_json("/api/nodes", serde_json::json!({"name": "B"}))).await;

        let (status, edge) = send(&state, post_json("/api/edges", serde_json::json!({"start": "A", "end": "B"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(edge["start_node"], 1);
        assert_eq!(edge["end_node"], 2);

        let (status, graph) = send(&state, Request::get("/api/graph").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(graph["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(graph["edges"].as_array().unwrap().len(), 1);

        let (status, removal) = send(&state, Request::delete("/api/nodes/B").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(removal, serde_json::json!({"nodes": 1, "edges": 1}));
    }

    #[tokio::test]
    async fn test_unknown_endpoint_name_is_rejected() {
        let (_dir, state) = app();
        send(&state, post_json("/api/nodes", serde_json::json!({"name": "A"}))).await;

        let (status, body) = send(&state, post_json("/api/edges", serde_json::json!({"start": "A", "end": "Z"}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("Z"));
        assert!(state.store.list_edges().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_node_is_bad_request() {
        let (_dir, state) = app();
        let (status, _) = send(&state, post_json("/api/nodes", serde_json::json!({"name": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_edge_by_pair() {
        let (_dir, state) = app();
        state.store.insert_edge(NodeId(1), NodeId(2)).unwrap();

        let request = Request::delete("/api/edges?start=1&end=2").body(Body::empty()).unwrap();
        let (status, body) = send(&state, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"removed": 1}));
    }

    #[tokio::test]
    async fn test_state_and_health() {
        let (_dir, state) = app();
        state.store.insert_node("A").unwrap();

        let (status, body) = send(&state, Request::get("/api/state").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name_index"]["A"], 1);

        let (status, body) = send(&state, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}
