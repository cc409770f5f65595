use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed bridge message: {0}")]
    Decode(String),

    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("Unrecognized chain ID: {0}")]
    UnsupportedChain(String),

    #[error("Wallet locked. Try again in {}", display_remaining(.remaining_ms))]
    LockedOut { remaining_ms: i64 },

    #[error("Incorrect pin, try again. {attempts_remaining} attempts remaining.")]
    IncorrectPin { attempts_remaining: u32 },

    #[error("PIN must be exactly {0} digits")]
    InvalidPin(usize),

    #[error("Wallet is not configured")]
    WalletNotConfigured,

    #[error("No pending request with id {0}")]
    UnknownRequest(u64),

    #[error("Gas price unavailable: {0}")]
    GasPriceUnavailable(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailure(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl BridgeError {
    /// Errors the user can act on from the confirmation or PIN sheet.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::LockedOut { .. }
                | Self::IncorrectPin { .. }
                | Self::InvalidPin(_)
                | Self::GasPriceUnavailable(_)
                | Self::BroadcastFailure(_)
                | Self::SigningFailure(_)
        )
    }
}

fn display_remaining(remaining_ms: &i64) -> String {
    format_remaining(*remaining_ms)
}

/// Render a lock duration the way the PIN sheet shows it, e.g. `29m 59s`.
pub fn format_remaining(remaining_ms: i64) -> String {
    let total_secs = remaining_ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = match self {
            BridgeError::Decode(_)
            | BridgeError::UnsupportedNetwork(_)
            | BridgeError::UnsupportedMethod(_)
            | BridgeError::UnsupportedChain(_)
            | BridgeError::InvalidPin(_)
            | BridgeError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            BridgeError::IncorrectPin { .. } => StatusCode::UNAUTHORIZED,
            BridgeError::LockedOut { .. } => StatusCode::TOO_MANY_REQUESTS,
            BridgeError::UnknownRequest(_) => StatusCode::NOT_FOUND,
            BridgeError::WalletNotConfigured | BridgeError::GasPriceUnavailable(_) => {
                StatusCode::CONFLICT
            }
            BridgeError::BroadcastFailure(_) | BridgeError::Network(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
            "userFacing": self.is_user_facing(),
        }));

        (status, body).into_response()
    }
}
