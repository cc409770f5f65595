//! Axum HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::types::{MockBehavior, MockState};

pub fn create_router(state: Arc<MockState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Block-explorer API
        .route("/api", get(explorer_api))

        // JSON-RPC node
        .route("/rpc", post(json_rpc))

        // Test control endpoints
        .route("/mock/behavior", get(get_behavior).post(set_behavior))
        .route("/mock/transactions", get(get_transactions))

        // Shared state
        .with_state(state)

        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(state: Arc<MockState>, host: String, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("RPC mock server listening on http://{}", addr);
    log::info!("Explorer gas endpoint: GET /api?module=proxy&action=eth_gasPrice");
    log::info!("JSON-RPC endpoint: POST /rpc");

    axum::serve(listener, app).await?;

    Ok(())
}

/// In-process mock bound to an ephemeral local port
pub struct MockServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockServer {
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_with(MockBehavior::default()).await
    }

    pub async fn start_with(behavior: MockBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(MockState::new(behavior));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let app = create_router(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                log::error!("Mock server stopped: {}", e);
            }
        });

        Ok(Self { addr, state, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Explorer API base, as configured in `*_API_URL`
    pub fn explorer_url(&self) -> String {
        format!("{}/api", self.base_url())
    }

    /// JSON-RPC endpoint, as configured in `*_RPC_URL`
    pub fn rpc_url(&self) -> String {
        format!("{}/rpc", self.base_url())
    }

    pub fn state(&self) -> &MockState {
        &self.state
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        self.state.set_behavior(behavior);
    }

    pub fn transactions(&self) -> Vec<String> {
        self.state.transactions()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
