/// Nonce store tests
///
/// Per-chain counters persisted in the legacy numeral form: a single digit
/// is decimal, anything longer is hex.
mod common;

use alloy_primitives::U256;
use common::*;
use dapp_bridge::{Chain, ChainNonce, FileStore, NonceStore, SecureStore};
use std::sync::Arc;
use tempfile::TempDir;

fn setup() -> (TempDir, Arc<FileStore>, NonceStore) {
    init_logging();
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(FileStore::new(temp_dir.path()));
    let nonces = NonceStore::new(store.clone());
    (temp_dir, store, nonces)
}

fn seed(store: &FileStore, chain: Chain, value: &str) {
    store
        .save_nonce(&ChainNonce {
            ticker: chain.ticker().to_string(),
            value: value.to_string(),
        })
        .expect("Failed to seed nonce");
}

#[test]
fn test_missing_nonce_is_zero() {
    let (_temp_dir, _store, nonces) = setup();

    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::ZERO);
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::ZERO);
}

#[test]
fn test_decimal_digit_increments() {
    let (_temp_dir, store, nonces) = setup();
    log::info!("=== Decimal Nonce ===");

    seed(&store, Chain::SmartChain, "5");
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::from(5));

    assert_eq!(nonces.advance(Chain::SmartChain).unwrap(), U256::from(6));
    assert_eq!(nonces.numeral(Chain::SmartChain).unwrap(), "6");
}

#[test]
fn test_hex_numeral_increments() {
    let (_temp_dir, store, nonces) = setup();
    log::info!("=== Hex Nonce ===");

    seed(&store, Chain::Ethereum, "a");
    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::from(10));

    nonces.advance(Chain::Ethereum).unwrap();
    assert_eq!(nonces.numeral(Chain::Ethereum).unwrap(), "b");
    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::from(11));
}

#[test]
fn test_crossing_nine_switches_to_hex() {
    let (_temp_dir, store, nonces) = setup();

    seed(&store, Chain::SmartChain, "9");
    nonces.advance(Chain::SmartChain).unwrap();
    assert_eq!(nonces.numeral(Chain::SmartChain).unwrap(), "a");

    seed(&store, Chain::SmartChain, "ff");
    nonces.advance(Chain::SmartChain).unwrap();
    assert_eq!(nonces.numeral(Chain::SmartChain).unwrap(), "100");
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::from(256));
}

#[test]
fn test_chains_are_independent() {
    let (_temp_dir, _store, nonces) = setup();

    nonces.advance(Chain::Ethereum).unwrap();
    nonces.advance(Chain::Ethereum).unwrap();
    nonces.advance(Chain::SmartChain).unwrap();

    assert_eq!(nonces.get(Chain::Ethereum).unwrap(), U256::from(2));
    assert_eq!(nonces.get(Chain::SmartChain).unwrap(), U256::from(1));
}

#[test]
fn test_nonces_survive_reopen() {
    let (temp_dir, _store, nonces) = setup();
    nonces.advance(Chain::SmartChain).unwrap();
    drop(nonces);

    let reopened = NonceStore::new(Arc::new(FileStore::new(temp_dir.path())));
    assert_eq!(reopened.get(Chain::SmartChain).unwrap(), U256::from(1));
}
