use axum::{
    extract::{Path, State},
    Json,
};

use super::server::AppState;
use super::types::*;
use crate::bridge::{Completion, Dispatch, HostEvent, InteractionStatus};
use crate::chain::Chain;
use crate::error::BridgeError;
use crate::evm::units::parse_units;

/// Decimal places accepted for a cached USD price
const USD_PRICE_DECIMALS: usize = 18;

pub async fn setup_wallet_handler(
    State(state): State<AppState>,
    Json(req): Json<SetupRequest>,
) -> Result<Json<SetupResponse>, BridgeError> {
    let addresses = state.bridge.provision(&req.pin, req.mnemonic.as_deref())?;
    Ok(Json(SetupResponse { addresses }))
}

pub async fn bridge_message_handler(
    State(state): State<AppState>,
    Json(req): Json<BridgeMessageRequest>,
) -> Json<BridgeMessageResponse> {
    let page = state.page(&req.host);
    let (outcome, reason) = match state.bridge.handle_message(page, &req.payload) {
        Dispatch::Dropped(e) => ("dropped", Some(e.to_string())),
        Dispatch::Responded => ("responded", None),
        Dispatch::AwaitingUnlock => ("awaitingUnlock", None),
        Dispatch::AwaitingTransaction => ("awaitingTransaction", None),
    };

    Json(BridgeMessageResponse {
        outcome: outcome.to_string(),
        reason,
    })
}

pub async fn submit_pin_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<SubmitPinRequest>,
) -> Result<Json<SubmitPinResponse>, BridgeError> {
    let response = match state.bridge.submit_pin(id, &req.pin).await? {
        Completion::Responded => SubmitPinResponse {
            outcome: "responded".to_string(),
            receipt: None,
        },
        Completion::Submitted(receipt) => SubmitPinResponse {
            outcome: "submitted".to_string(),
            receipt: Some(receipt),
        },
    };
    Ok(Json(response))
}

pub async fn cancel_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StatusResponse>, BridgeError> {
    state.bridge.cancel(id)?;
    Ok(Json(StatusResponse {
        id,
        status: "cancelled".to_string(),
    }))
}

pub async fn refresh_gas_price_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<StatusResponse>, BridgeError> {
    state.bridge.refresh_gas_price(id)?;
    Ok(Json(StatusResponse {
        id,
        status: "refreshing".to_string(),
    }))
}

pub async fn status_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<InteractionStatus> {
    Json(state.bridge.status(id))
}

pub async fn page_loaded_handler(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Json<Vec<String>> {
    state.bridge.page_loaded(&state.page(&host));
    Json(state.drain_scripts(&host))
}

pub async fn page_scripts_handler(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Json<Vec<String>> {
    Json(state.drain_scripts(&host))
}

pub async fn events_handler(State(state): State<AppState>) -> Json<Vec<HostEvent>> {
    Json(state.drain_events().await)
}

pub async fn set_token_price_handler(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Json(req): Json<TokenPriceRequest>,
) -> Result<Json<StatusResponse>, BridgeError> {
    let ticker = ticker.to_uppercase();
    if !Chain::ALL.iter().any(|chain| chain.ticker() == ticker) {
        return Err(BridgeError::UnsupportedNetwork(ticker));
    }
    let usd = validate_usd_price(&req.usd)?;
    state.store.save_token_price(&ticker, usd)?;
    Ok(Json(StatusResponse {
        id: 0,
        status: format!("{} price cached", ticker),
    }))
}

/// Prices are cached as plain decimals; anything else is refused.
fn validate_usd_price(usd: &str) -> Result<&str, BridgeError> {
    let usd = usd.trim();
    parse_units(usd, USD_PRICE_DECIMALS)?;
    Ok(usd)
}
