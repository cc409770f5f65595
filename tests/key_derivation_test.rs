/// Key derivation tests
///
/// BIP-39 phrase to BIP-44 EVM address, checked against the well-known
/// address of the all-"abandon" test mnemonic.
mod common;

use common::*;
use dapp_bridge::{BridgeError, CoinType, KeyManager, Network, SecretPhrase};

#[test]
fn test_reference_phrase_address() {
    init_logging();
    log::info!("=== Reference Phrase Address ===");

    let phrase = SecretPhrase::parse(PHRASE).expect("Failed to parse phrase");
    let address = KeyManager::derive_address(&phrase, CoinType::Ethereum).expect("Failed to derive");

    assert_eq!(address, PHRASE_ADDRESS);
}

#[test]
fn test_both_networks_share_the_evm_path() {
    init_logging();

    let phrase = SecretPhrase::parse(PHRASE).unwrap();
    let addresses = KeyManager::derive_addresses(&phrase).unwrap();

    assert_eq!(addresses.len(), 2);
    for network in Network::ALL {
        let derived = addresses
            .iter()
            .find(|derived| derived.network == network)
            .expect("Missing network address");
        assert_eq!(derived.address, PHRASE_ADDRESS);
    }
}

#[test]
fn test_signing_key_matches_address() {
    init_logging();

    let phrase = SecretPhrase::parse(PHRASE).unwrap();
    let key = KeyManager::derive_signing_key(&phrase, CoinType::SmartChain).unwrap();

    assert_eq!(key.address().to_checksum(None), PHRASE_ADDRESS);
}

#[test]
fn test_derivation_is_deterministic() {
    init_logging();

    let first = KeyManager::derive_addresses(&SecretPhrase::parse(PHRASE).unwrap()).unwrap();
    let second = KeyManager::derive_addresses(&SecretPhrase::parse(PHRASE).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_generated_phrases_are_distinct() {
    init_logging();
    log::info!("=== Generated Phrases ===");

    let first = KeyManager::generate().unwrap();
    let second = KeyManager::generate().unwrap();

    assert_eq!(first.expose().split_whitespace().count(), 12);
    assert_ne!(first.expose(), second.expose());
    assert!(SecretPhrase::parse(first.expose()).is_ok());
}

#[test]
fn test_invalid_phrase_rejected() {
    init_logging();

    let result = SecretPhrase::parse("abandon abandon abandon");
    assert!(matches!(result, Err(BridgeError::SigningFailure(_))));
}
