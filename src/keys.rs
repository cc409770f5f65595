use alloy_primitives::{keccak256, Address, B256};
use bip39::Mnemonic;
use bitcoin::bip32::{DerivationPath, Xpriv};
use secp256k1::ecdsa::RecoverableSignature;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, Zeroizing};

use crate::chain::{CoinType, Network};
use crate::error::BridgeError;

/// Mnemonic phrase held only for one unlock-to-response sequence.
///
/// The backing string is wiped when the value is dropped.
pub struct SecretPhrase(Zeroizing<String>);

impl SecretPhrase {
    pub fn new(words: impl Into<String>) -> Self {
        Self(Zeroizing::new(words.into()))
    }

    /// Parse and normalise a phrase, rejecting invalid BIP-39 mnemonics.
    pub fn parse(words: &str) -> Result<Self, BridgeError> {
        let mnemonic = Mnemonic::parse(words.trim())
            .map_err(|e| BridgeError::SigningFailure(format!("Invalid mnemonic: {}", e)))?;
        Ok(Self::new(mnemonic.to_string()))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    fn to_seed(&self) -> Result<Zeroizing<[u8; 64]>, BridgeError> {
        let mnemonic = Mnemonic::parse(self.0.as_str())
            .map_err(|e| BridgeError::SigningFailure(format!("Invalid mnemonic: {}", e)))?;
        Ok(Zeroizing::new(mnemonic.to_seed("")))
    }
}

impl fmt::Debug for SecretPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretPhrase(<redacted>)")
    }
}

/// Ephemeral private key for one signing operation.
///
/// Not `Clone`; the secret is erased on drop.
pub struct SigningKey {
    secret: SecretKey,
}

impl SigningKey {
    /// Wrap raw 32-byte key material.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BridgeError> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|e| BridgeError::SigningFailure(e.to_string()))?;
        Ok(Self { secret })
    }

    pub fn address(&self) -> Address {
        let secp = Secp256k1::signing_only();
        public_key_to_address(&PublicKey::from_secret_key(&secp, &self.secret))
    }

    pub(crate) fn sign_prehash(&self, hash: &B256) -> RecoverableSignature {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(hash.0);
        secp.sign_ecdsa_recoverable(&message, &self.secret)
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.secret.non_secure_erase();
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}

/// Address derived for one page network during an unlock session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedAddress {
    pub network: Network,
    pub address: String,
}

pub struct KeyManager;

impl KeyManager {
    /// Generate a new random 12-word phrase
    pub fn generate() -> Result<SecretPhrase, BridgeError> {
        let mut entropy = rand::random::<[u8; 16]>();
        let mnemonic = Mnemonic::from_entropy(&entropy)
            .map_err(|e| BridgeError::Internal(format!("Mnemonic generation failed: {}", e)));
        entropy.zeroize();
        Ok(SecretPhrase::new(mnemonic?.to_string()))
    }

    /// Derive the EIP-55 checksummed address for a coin type
    pub fn derive_address(phrase: &SecretPhrase, coin: CoinType) -> Result<String, BridgeError> {
        let key = Self::derive_signing_key(phrase, coin)?;
        Ok(key.address().to_checksum(None))
    }

    /// Derive the signing key for a coin type at its fixed path
    pub fn derive_signing_key(
        phrase: &SecretPhrase,
        coin: CoinType,
    ) -> Result<SigningKey, BridgeError> {
        let secp = Secp256k1::new();
        let seed = phrase.to_seed()?;

        // The network only affects xprv serialisation, never the derived bytes.
        let master_key = Xpriv::new_master(bitcoin::Network::Bitcoin, seed.as_slice())
            .map_err(|e| BridgeError::SigningFailure(e.to_string()))?;

        let derivation_path = DerivationPath::from_str(coin.derivation_path())
            .map_err(|e| BridgeError::SigningFailure(e.to_string()))?;

        let mut child = master_key
            .derive_priv(&secp, &derivation_path)
            .map_err(|e| BridgeError::SigningFailure(e.to_string()))?;

        let key_bytes = Zeroizing::new(child.private_key.secret_bytes());
        child.private_key.non_secure_erase();
        SigningKey::from_slice(key_bytes.as_slice())
    }

    /// Derive the address for every page network
    pub fn derive_addresses(phrase: &SecretPhrase) -> Result<Vec<DerivedAddress>, BridgeError> {
        Network::ALL
            .iter()
            .map(|network| {
                Ok(DerivedAddress {
                    network: *network,
                    address: Self::derive_address(phrase, network.coin_type())?,
                })
            })
            .collect()
    }
}

fn public_key_to_address(public_key: &PublicKey) -> Address {
    let uncompressed = public_key.serialize_uncompressed();
    let hash = keccak256(&uncompressed[1..]);
    Address::from_slice(&hash[12..])
}
