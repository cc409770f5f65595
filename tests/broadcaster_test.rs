/// Broadcaster tests against the in-process JSON-RPC mock
///
/// The nonce advances exactly once per accepted transaction and never on
/// failure; failures carry the node's body verbatim.
mod common;

use alloy_primitives::U256;
use common::*;
use dapp_bridge::{Broadcaster, BridgeError, Chain, FileStore, NonceStore};
use rpc_mock::{MockBehavior, MockServer};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

const RAW_TX: &str = "0xF86C098504A817C800825208";

async fn setup(behavior: MockBehavior) -> (TempDir, MockServer, NonceStore, Broadcaster) {
    init_logging();
    let mock = MockServer::start_with(behavior).await.expect("Failed to start mock");
    let temp_dir = TempDir::new().unwrap();
    let nonces = NonceStore::new(Arc::new(FileStore::new(temp_dir.path())));
    let broadcaster = Broadcaster::new(&config_for(&mock, &temp_dir), nonces.clone())
        .expect("Failed to build broadcaster");
    (temp_dir, mock, nonces, broadcaster)
}

#[tokio::test]
async fn test_accepted_transaction_advances_nonce_once() {
    let (_temp_dir, mock, nonces, broadcaster) = setup(MockBehavior::default()).await;
    log::info!("=== Accepted Broadcast ===");

    let receipt = broadcaster
        .submit(Chain::SmartChain, RAW_TX)
        .await
        .expect("Broadcast failed");

    let expected_hash = format!("0x{}", "ab".repeat(32));
    assert_eq!(receipt.tx_hash, expected_hash);
    assert_eq!(receipt.chain, Chain::SmartChain);
    assert_eq!(receipt.explorer_name, "BSCSCAN");
    assert_eq!(receipt.explorer_url, format!("https://bscscan.com/tx/{}", expected_hash));

    assert_eq!(mock.transactions(), vec![RAW_TX.to_string()]);
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::from(1));
    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_http_failure_keeps_nonce() {
    let (_temp_dir, mock, nonces, broadcaster) = setup(MockBehavior {
        broadcast_status: 500,
        ..MockBehavior::default()
    })
    .await;
    log::info!("=== Failed Broadcast ===");

    let err = broadcaster.submit(Chain::Ethereum, RAW_TX).await.unwrap_err();
    match err {
        BridgeError::BroadcastFailure(body) => assert!(body.contains("node unavailable"), "{}", body),
        other => panic!("Unexpected error: {}", other),
    }

    assert!(mock.transactions().is_empty());
    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_error_payload_keeps_nonce() {
    let (_temp_dir, _mock, nonces, broadcaster) = setup(MockBehavior {
        broadcast_error: Some(json!({ "code": -32000, "message": "nonce too low" })),
        ..MockBehavior::default()
    })
    .await;

    let err = broadcaster.submit(Chain::SmartChain, RAW_TX).await.unwrap_err();
    match err {
        BridgeError::BroadcastFailure(body) => assert!(body.contains("nonce too low"), "{}", body),
        other => panic!("Unexpected error: {}", other),
    }
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::ZERO);
}

#[tokio::test]
async fn test_timeout_is_broadcast_failure() {
    let (_temp_dir, _mock, nonces, broadcaster) = setup(MockBehavior {
        broadcast_delay_ms: 2_000,
        ..MockBehavior::default()
    })
    .await;

    let err = broadcaster.submit(Chain::SmartChain, RAW_TX).await.unwrap_err();
    assert!(matches!(err, BridgeError::BroadcastFailure(_)));
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::ZERO);
}
