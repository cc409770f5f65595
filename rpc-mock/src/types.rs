//! Scriptable behaviour and recorded traffic of the mock node

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// How the mock answers. Every field can be changed at runtime through
/// `POST /mock/behavior`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockBehavior {
    /// Gas price in wei as a `0x` quantity
    pub gas_price: String,
    /// HTTP status for explorer gas requests
    pub gas_status: u16,
    /// Delay before answering explorer gas requests
    pub gas_delay_ms: u64,
    /// Hash returned for accepted transactions
    pub tx_hash: String,
    /// HTTP status for `eth_sendRawTransaction`
    pub broadcast_status: u16,
    /// JSON-RPC error object returned with a 200 instead of a result
    pub broadcast_error: Option<serde_json::Value>,
    pub broadcast_delay_ms: u64,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            gas_price: "0xb2d05e00".to_string(),
            gas_status: 200,
            gas_delay_ms: 0,
            tx_hash: format!("0x{}", "ab".repeat(32)),
            broadcast_status: 200,
            broadcast_error: None,
            broadcast_delay_ms: 0,
        }
    }
}

/// Explorer API query (`?module=proxy&action=eth_gasPrice&apikey=...`)
#[derive(Debug, Deserialize)]
pub struct ExplorerQuery {
    pub module: Option<String>,
    pub action: Option<String>,
    pub apikey: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Vec<serde_json::Value>,
    #[serde(default)]
    pub id: serde_json::Value,
}

/// Shared state behind every handler
#[derive(Debug, Default)]
pub struct MockState {
    behavior: Mutex<MockBehavior>,
    transactions: Mutex<Vec<String>>,
    gas_requests: Mutex<u64>,
}

impl MockState {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            ..Self::default()
        }
    }

    pub fn behavior(&self) -> MockBehavior {
        self.behavior.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap_or_else(PoisonError::into_inner) = behavior;
    }

    pub fn record_transaction(&self, raw: &str) {
        self.transactions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(raw.to_string());
    }

    /// Raw transactions received so far, in order
    pub fn transactions(&self) -> Vec<String> {
        self.transactions.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn record_gas_request(&self) {
        *self.gas_requests.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    pub fn gas_requests(&self) -> u64 {
        *self.gas_requests.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
