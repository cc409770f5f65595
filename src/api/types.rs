use serde::{Deserialize, Serialize};

use crate::evm::BroadcastReceipt;
use crate::keys::DerivedAddress;

#[derive(Deserialize)]
pub struct SetupRequest {
    pub pin: String,
    pub mnemonic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub addresses: Vec<DerivedAddress>,
}

#[derive(Debug, Deserialize)]
pub struct BridgeMessageRequest {
    pub host: String,
    /// base64 JSON frame from the injected provider
    pub payload: String,
}

#[derive(Debug, Serialize)]
pub struct BridgeMessageResponse {
    pub outcome: String,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct SubmitPinRequest {
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitPinResponse {
    pub outcome: String,
    pub receipt: Option<BroadcastReceipt>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: u64,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenPriceRequest {
    /// USD price as a plain decimal, e.g. `"312.45"`
    pub usd: String,
}
