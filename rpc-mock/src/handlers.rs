//! Axum HTTP handlers for the explorer, JSON-RPC and control endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::types::*;

/// Shared application state
pub type AppState = Arc<MockState>;

const WEI_PER_GWEI: u128 = 1_000_000_000;

fn status_or_500(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

async fn delay(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /api?module=...&action=...
/// Block-explorer gas endpoints: `proxy/eth_gasPrice` and `gastracker/gasoracle`
pub async fn explorer_api(
    State(state): State<AppState>,
    Query(query): Query<ExplorerQuery>,
) -> Response {
    state.record_gas_request();
    let behavior = state.behavior();
    delay(behavior.gas_delay_ms).await;

    let status = status_or_500(behavior.gas_status);
    if !status.is_success() {
        return (status, "explorer unavailable").into_response();
    }
    log::debug!(
        "Explorer request module={:?} action={:?} apikey set: {}",
        query.module,
        query.action,
        query.apikey.as_deref().is_some_and(|key| !key.is_empty())
    );

    match (query.module.as_deref(), query.action.as_deref()) {
        (Some("proxy"), Some("eth_gasPrice")) => Json(json!({
            "jsonrpc": "2.0",
            "id": 73,
            "result": behavior.gas_price,
        }))
        .into_response(),
        (Some("gastracker"), Some("gasoracle")) => {
            let wei = u128::from_str_radix(behavior.gas_price.trim_start_matches("0x"), 16).unwrap_or(0);
            let gwei = (wei / WEI_PER_GWEI).to_string();
            Json(json!({
                "status": "1",
                "message": "OK",
                "result": {
                    "SafeGasPrice": gwei,
                    "ProposeGasPrice": gwei,
                    "FastGasPrice": gwei,
                },
            }))
            .into_response()
        }
        _ => Json(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Error! Missing Or invalid Module name",
        }))
        .into_response(),
    }
}

/// POST /rpc
/// JSON-RPC node: `eth_sendRawTransaction` and `eth_gasPrice`
pub async fn json_rpc(State(state): State<AppState>, Json(request): Json<RpcRequest>) -> Response {
    let behavior = state.behavior();

    match request.method.as_str() {
        "eth_sendRawTransaction" => {
            delay(behavior.broadcast_delay_ms).await;

            let status = status_or_500(behavior.broadcast_status);
            if !status.is_success() {
                return (status, Json(rpc_error(&request.id, -32000, "node unavailable"))).into_response();
            }

            let Some(raw) = request.params.first().and_then(Value::as_str) else {
                return Json(rpc_error(&request.id, -32602, "invalid params")).into_response();
            };
            if let Some(error) = behavior.broadcast_error {
                return Json(json!({ "jsonrpc": "2.0", "id": request.id, "error": error })).into_response();
            }

            log::info!("Accepted raw transaction ({} chars)", raw.len());
            state.record_transaction(raw);
            Json(json!({ "jsonrpc": "2.0", "id": request.id, "result": behavior.tx_hash })).into_response()
        }
        "eth_gasPrice" => {
            Json(json!({ "jsonrpc": "2.0", "id": request.id, "result": behavior.gas_price })).into_response()
        }
        other => {
            log::warn!("Unsupported RPC method: {}", other);
            Json(rpc_error(&request.id, -32601, "Method not found")).into_response()
        }
    }
}

/// GET /mock/behavior
pub async fn get_behavior(State(state): State<AppState>) -> Json<MockBehavior> {
    Json(state.behavior())
}

/// POST /mock/behavior
pub async fn set_behavior(
    State(state): State<AppState>,
    Json(behavior): Json<MockBehavior>,
) -> Json<MockBehavior> {
    log::info!("Mock behaviour updated: {:?}", behavior);
    state.set_behavior(behavior.clone());
    Json(behavior)
}

/// GET /mock/transactions
pub async fn get_transactions(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.transactions())
}
