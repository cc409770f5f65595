use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::gas::http_client;
use crate::chain::Chain;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::nonce::NonceStore;

/// Outcome of an accepted `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BroadcastReceipt {
    pub chain: Chain,
    pub tx_hash: String,
    pub explorer_name: String,
    pub explorer_url: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

/// Submits signed transactions to a chain's JSON-RPC node
///
/// The chain's nonce is advanced exactly once per accepted transaction and
/// never on failure. There are no automatic retries.
#[derive(Clone)]
pub struct Broadcaster {
    client: reqwest::Client,
    ethereum_rpc: String,
    smartchain_rpc: String,
    nonces: NonceStore,
    next_id: Arc<AtomicU64>,
}

impl Broadcaster {
    pub fn new(config: &BridgeConfig, nonces: NonceStore) -> Result<Self, BridgeError> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            ethereum_rpc: config.ethereum.rpc_url.clone(),
            smartchain_rpc: config.smartchain.rpc_url.clone(),
            nonces,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    fn rpc_url(&self, chain: Chain) -> &str {
        match chain {
            Chain::Ethereum => &self.ethereum_rpc,
            Chain::SmartChain => &self.smartchain_rpc,
        }
    }

    /// Submit `raw_tx_hex` (`0x`-prefixed) to the node for `chain`.
    ///
    /// Failures carry the node's raw response body.
    pub async fn submit(&self, chain: Chain, raw_tx_hex: &str) -> Result<BroadcastReceipt, BridgeError> {
        let url = self.rpc_url(chain);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        log::debug!("Broadcasting {} transaction to {}", chain.ticker(), url);

        let response = self
            .client
            .post(url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": "eth_sendRawTransaction",
                "params": [raw_tx_hex],
                "id": id.to_string(),
            }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BridgeError::BroadcastFailure("request timed out".to_string())
                } else {
                    BridgeError::BroadcastFailure(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::BroadcastFailure(e.to_string()))?;

        if !status.is_success() {
            log::error!("{} node rejected transaction: HTTP {}", chain.ticker(), status);
            return Err(BridgeError::BroadcastFailure(body));
        }

        let tx_hash = match serde_json::from_str::<RpcResponse>(&body) {
            Ok(RpcResponse {
                result: Some(hash),
                error: None,
            }) => hash,
            _ => {
                log::error!("{} node returned an error payload", chain.ticker());
                return Err(BridgeError::BroadcastFailure(body));
            }
        };

        if let Err(e) = self.nonces.advance(chain) {
            // The transaction is already on the network; report it regardless.
            log::error!("Failed to advance {} nonce: {}", chain.ticker(), e);
        }
        log::info!("Broadcast {} transaction {}", chain.ticker(), tx_hash);

        Ok(BroadcastReceipt {
            chain,
            explorer_name: chain.explorer_name().to_string(),
            explorer_url: chain.explorer_tx_url(&tx_hash),
            tx_hash,
        })
    }
}
