/// Transaction signer tests
///
/// Legacy EIP-155 signing against the published example transaction
/// (nonce 9, 20 gwei, 21000 gas, 1 ether to 0x3535..., chain 1).
mod common;

use alloy_primitives::{keccak256, Address, U256};
use common::*;
use dapp_bridge::{
    CoinType, KeyManager, SecretPhrase, SigningKey, SigningRequest, TransactionSigner,
};

const EIP155_SIGNED: &str = "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83";

fn eip155_request() -> SigningRequest {
    SigningRequest::from_hex_fields(
        "0x3535353535353535353535353535353535353535",
        Some("0xde0b6b3a7640000"),
        Some(""),
        "0x5208",
        Some("0x4a817c800"),
        U256::from(9u8),
        1,
    )
    .expect("Failed to build request")
}

#[test]
fn test_eip155_reference_transaction() {
    init_logging();
    log::info!("=== EIP-155 Reference Transaction ===");

    let key = SigningKey::from_slice(&[0x46; 32]).expect("Invalid key");
    let signed = TransactionSigner::sign(&eip155_request(), &key).expect("Signing failed");

    assert_eq!(hex::encode(&signed.raw), EIP155_SIGNED);
    assert_eq!(signed.hash, keccak256(&signed.raw));
    log::info!("Signed hash: {}", signed.hash_hex());
}

#[test]
fn test_transport_hex_is_prefixed_uppercase() {
    init_logging();

    let key = SigningKey::from_slice(&[0x46; 32]).unwrap();
    let signed = TransactionSigner::sign(&eip155_request(), &key).unwrap();
    let transport = signed.to_transport_hex();

    assert!(transport.starts_with("0xF86C09"));
    assert_eq!(&transport[2..], EIP155_SIGNED.to_uppercase().as_str());
}

#[test]
fn test_smartchain_signature_uses_chain_56() {
    init_logging();

    let mut request = eip155_request();
    request.chain_id = 56;
    let key = SigningKey::from_slice(&[0x46; 32]).unwrap();
    let signed = TransactionSigner::sign(&request, &key).unwrap();

    // Empty data (0x80) followed by v = 56 * 2 + 35 + {0,1}, i.e. 0x93 or 0x94
    let raw = hex::encode(&signed.raw);
    assert!(raw.contains("808193") || raw.contains("808194"), "v not found in {}", raw);
}

#[test]
fn test_wallet_key_signs_for_its_address() {
    init_logging();
    log::info!("=== Wallet Key Signing ===");

    let phrase = SecretPhrase::parse(PHRASE).unwrap();
    let key = KeyManager::derive_signing_key(&phrase, CoinType::SmartChain).unwrap();
    let expected: Address = PHRASE_ADDRESS.parse().unwrap();
    assert_eq!(key.address(), expected);

    let mut request = eip155_request();
    request.chain_id = 56;
    request.nonce = U256::ZERO;
    let first = TransactionSigner::sign(&request, &key).unwrap();
    let second = TransactionSigner::sign(&request, &key).unwrap();

    // RFC 6979 nonces make signing deterministic
    assert_eq!(first.raw, second.raw);
}
