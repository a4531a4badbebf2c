use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use crate::render::{GraphRenderer, RenderOptions, VisNetworkRenderer};
use crate::storage::SqliteStore;

pub mod error;
pub mod page;
pub mod routes;

pub use error::ApiError;

/// Server state
pub struct AppState {
    pub store: Arc<SqliteStore>,
    pub renderer: Arc<dyn GraphRenderer>,
    pub render: RenderOptions,
}

impl AppState {
    pub fn new(store: Arc<SqliteStore>, render: RenderOptions) -> Self {
        Self {
            store,
            renderer: Arc::new(VisNetworkRenderer::new()),
            render,
        }
    }

    /// Run store work off the async runtime
    pub async fn blocking<T, F>(&self, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&SqliteStore) -> crate::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| ApiError::internal(format!("store task failed: {}", e)))?
            .map_err(ApiError::from)
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(page::index))
        .route("/nodes", post(page::add_node))
        .route("/edges", post(page::add_edge))
        .route("/health", get(routes::health))
        .route("/api/graph", get(routes::get_graph))
        .route("/api/state", get(routes::get_state))
        .route("/api/nodes", post(routes::create_node))
        .route("/api/nodes/{name}", delete(routes::delete_node))
        .route("/api/edges", post(routes::create_edge).delete(routes::delete_edge))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(Arc::clone(&state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);
    crate::ui::status(crate::ui::Icons::GLOBE, "Listening", &format!("http://{}", addr));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.store.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
