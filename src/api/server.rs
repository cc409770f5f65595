use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedReceiver;
use tower_http::cors::{Any, CorsLayer};

use super::handlers;
use crate::bridge::{Bridge, HostEvent, PageContext, ScriptSink};
use crate::config::BridgeConfig;
use crate::storage::{FileStore, SecureStore};

type ScriptQueues = Arc<Mutex<HashMap<String, Vec<String>>>>;

/// Queues scripts for a page until the shell polls for them
struct QueueSink {
    host: String,
    queues: ScriptQueues,
}

impl ScriptSink for QueueSink {
    fn evaluate(&self, script: &str) {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(self.host.clone())
            .or_default()
            .push(script.to_string());
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bridge: Bridge,
    pub store: Arc<dyn SecureStore>,
    scripts: ScriptQueues,
    events: Arc<tokio::sync::Mutex<UnboundedReceiver<HostEvent>>>,
}

impl AppState {
    pub fn new(bridge: Bridge, store: Arc<dyn SecureStore>, events: UnboundedReceiver<HostEvent>) -> Self {
        Self {
            bridge,
            store,
            scripts: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(tokio::sync::Mutex::new(events)),
        }
    }

    pub fn page(&self, host: &str) -> PageContext {
        PageContext::new(
            host,
            Arc::new(QueueSink {
                host: host.to_string(),
                queues: self.scripts.clone(),
            }),
        )
    }

    pub fn drain_scripts(&self, host: &str) -> Vec<String> {
        let mut queues = self.scripts.lock().unwrap_or_else(PoisonError::into_inner);
        queues.remove(host).unwrap_or_default()
    }

    pub async fn drain_events(&self) -> Vec<HostEvent> {
        let mut receiver = self.events.lock().await;
        let mut drained = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            drained.push(event);
        }
        drained
    }
}

pub fn router(state: AppState) -> Router {
    // Set ALLOWED_ORIGINS="https://shell.example,https://other.example" to restrict;
    // unset allows any origin (development mode)
    let cors = match std::env::var("ALLOWED_ORIGINS") {
        Ok(origins) if !origins.is_empty() => {
            log::info!("CORS configured for origins: {}", origins);
            let origin_list: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| match s.trim().parse() {
                    Ok(origin) => Some(origin),
                    Err(_) => {
                        log::warn!("Ignoring invalid CORS origin '{}'", s.trim());
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origin_list)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        _ => {
            log::warn!("CORS: Allowing all origins (development mode). Set ALLOWED_ORIGINS env var for production.");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/wallet/setup", post(handlers::setup_wallet_handler))
        .route(
            "/api/wallet/prices/:ticker",
            post(handlers::set_token_price_handler),
        )
        .route("/api/bridge/message", post(handlers::bridge_message_handler))
        .route("/api/bridge/:id", get(handlers::status_handler))
        .route("/api/bridge/:id/pin", post(handlers::submit_pin_handler))
        .route("/api/bridge/:id/cancel", post(handlers::cancel_handler))
        .route(
            "/api/bridge/:id/gas-price",
            post(handlers::refresh_gas_price_handler),
        )
        .route(
            "/api/pages/:host/loaded",
            post(handlers::page_loaded_handler),
        )
        .route(
            "/api/pages/:host/scripts",
            get(handlers::page_scripts_handler),
        )
        .route("/api/events", get(handlers::events_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_server(config: BridgeConfig) -> anyhow::Result<()> {
    let addr = config.bind_address.clone();
    let store: Arc<dyn SecureStore> = Arc::new(FileStore::new(config.storage_dir.clone()));
    let (bridge, events) = Bridge::new(config, store.clone())?;
    let app = router(AppState::new(bridge, store, events));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            log::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            log::info!("Received SIGTERM signal");
        },
    }

    log::info!("Shutdown signal received, exiting gracefully...");
}
