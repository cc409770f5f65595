//! PIN gate and the session's authorized-host cache
//!
//! Five consecutive failures lock the wallet for `lock_multiplier * 30min`.
//! A failure after an expired lock doubles the multiplier and starts a fresh
//! run of attempts, so repeated lockouts escalate. While locked every PIN,
//! correct or not, is refused without touching the counters.

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::chain::Network;
use crate::error::BridgeError;
use crate::keys::{DerivedAddress, KeyManager, SecretPhrase};
use crate::storage::{PinCredential, SecureStore};

pub const PIN_LENGTH: usize = 6;
pub const LOCK_THRESHOLD: u32 = 5;
pub const LOCK_UNIT_MS: i64 = 30 * 60 * 1000;

pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// The last host the user unlocked for during this run. Never persisted.
#[derive(Debug, Default)]
pub struct AuthorizedHostCache {
    entry: Option<AuthorizedHost>,
}

#[derive(Debug)]
struct AuthorizedHost {
    host: String,
    addresses: Vec<DerivedAddress>,
}

impl AuthorizedHostCache {
    pub fn authorize(&mut self, host: &str, addresses: Vec<DerivedAddress>) {
        log::info!("Host {} authorized for this session", host);
        self.entry = Some(AuthorizedHost {
            host: host.to_string(),
            addresses,
        });
    }

    pub fn is_authorized(&self, host: &str) -> bool {
        self.entry.as_ref().is_some_and(|entry| entry.host == host)
    }

    /// Address for a page network, only for the authorized host.
    pub fn address_for(&self, host: &str, network: Network) -> Option<String> {
        self.entry
            .as_ref()
            .filter(|entry| entry.host == host)?
            .addresses
            .iter()
            .find(|derived| derived.network == network)
            .map(|derived| derived.address.clone())
    }

    pub fn clear(&mut self) {
        self.entry = None;
    }
}

/// Result of a correct PIN: the mnemonic for this one sequence plus the
/// addresses derived from it. Dropping it wipes the phrase.
#[derive(Debug)]
pub struct Unlocked {
    phrase: SecretPhrase,
    addresses: Vec<DerivedAddress>,
}

impl Unlocked {
    pub fn phrase(&self) -> &SecretPhrase {
        &self.phrase
    }

    pub fn addresses(&self) -> &[DerivedAddress] {
        &self.addresses
    }

    pub fn address_for(&self, network: Network) -> Option<&str> {
        self.addresses
            .iter()
            .find(|derived| derived.network == network)
            .map(|derived| derived.address.as_str())
    }
}

pub struct PinGate {
    store: Arc<dyn SecureStore>,
    hosts: AuthorizedHostCache,
}

impl PinGate {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self {
            store,
            hosts: AuthorizedHostCache::default(),
        }
    }

    pub fn hosts(&self) -> &AuthorizedHostCache {
        &self.hosts
    }

    /// Store a new PIN credential with a fresh salt and cleared counters.
    pub fn set_pin(&mut self, pin: &str) -> Result<(), BridgeError> {
        validate_format(pin)?;
        let salt = hex::encode(rand::random::<[u8; 16]>());
        let credential = PinCredential {
            pin_hash: hash_pin(&salt, pin)?,
            salt,
            failed_attempts: 0,
            lock_multiplier: 1,
            last_attempt_time_ms: 0,
            created_at: Utc::now(),
        };
        self.store.save_pin_credential(&credential)?;
        self.hosts.clear();
        log::info!("PIN credential updated");
        Ok(())
    }

    /// Remaining lock time, if the wallet is currently locked.
    pub fn lock_remaining_ms(&self, now_ms: i64) -> Result<Option<i64>, BridgeError> {
        let credential = self
            .store
            .load_pin_credential()?
            .ok_or(BridgeError::WalletNotConfigured)?;
        Ok(remaining_lock_ms(&credential, now_ms))
    }

    pub fn verify(&mut self, host: &str, pin: &str) -> Result<Unlocked, BridgeError> {
        self.verify_at(host, pin, now_ms())
    }

    /// Check a completed PIN for `host` at time `now_ms`.
    pub fn verify_at(&mut self, host: &str, pin: &str, now_ms: i64) -> Result<Unlocked, BridgeError> {
        validate_format(pin)?;

        let mut credential = self
            .store
            .load_pin_credential()?
            .ok_or(BridgeError::WalletNotConfigured)?;

        if let Some(remaining_ms) = remaining_lock_ms(&credential, now_ms) {
            log::warn!("PIN refused for {}: wallet locked", host);
            return Err(BridgeError::LockedOut { remaining_ms });
        }

        if hash_pin(&credential.salt, pin)? == credential.pin_hash {
            credential.failed_attempts = 0;
            credential.lock_multiplier = 1;
            credential.last_attempt_time_ms = 0;
            self.store.save_pin_credential(&credential)?;

            let phrase = self
                .store
                .load_mnemonic()?
                .ok_or(BridgeError::WalletNotConfigured)?;
            let addresses = KeyManager::derive_addresses(&phrase)?;
            self.hosts.authorize(host, addresses.clone());
            return Ok(Unlocked { phrase, addresses });
        }

        if credential.failed_attempts >= LOCK_THRESHOLD {
            // Previous lock has expired; the next one lasts twice as long.
            credential.lock_multiplier = credential.lock_multiplier.saturating_mul(2);
            credential.failed_attempts = 0;
        }
        credential.failed_attempts += 1;
        credential.last_attempt_time_ms = now_ms;
        self.store.save_pin_credential(&credential)?;

        if credential.failed_attempts >= LOCK_THRESHOLD {
            let remaining_ms = i64::from(credential.lock_multiplier) * LOCK_UNIT_MS;
            log::warn!("Wallet locked for {} ms after repeated PIN failures", remaining_ms);
            Err(BridgeError::LockedOut { remaining_ms })
        } else {
            let attempts_remaining = LOCK_THRESHOLD - credential.failed_attempts;
            log::info!("Incorrect PIN for {}, {} attempts remaining", host, attempts_remaining);
            Err(BridgeError::IncorrectPin { attempts_remaining })
        }
    }
}

fn validate_format(pin: &str) -> Result<(), BridgeError> {
    if pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(BridgeError::InvalidPin(PIN_LENGTH))
    }
}

fn hash_pin(salt_hex: &str, pin: &str) -> Result<String, BridgeError> {
    let salt = hex::decode(salt_hex)
        .map_err(|e| crate::error::StorageError::Corrupt(format!("PIN salt: {}", e)))?;
    let mut hasher = Sha256::new();
    hasher.update(&salt);
    hasher.update(pin.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

fn remaining_lock_ms(credential: &PinCredential, now_ms: i64) -> Option<i64> {
    if credential.failed_attempts < LOCK_THRESHOLD {
        return None;
    }
    let duration = i64::from(credential.lock_multiplier) * LOCK_UNIT_MS;
    let elapsed = now_ms - credential.last_attempt_time_ms;
    (elapsed < duration).then(|| duration - elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(failed_attempts: u32, lock_multiplier: u32, last: i64) -> PinCredential {
        PinCredential {
            pin_hash: String::new(),
            salt: String::new(),
            failed_attempts,
            lock_multiplier,
            last_attempt_time_ms: last,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_pin_format() {
        assert!(validate_format("123456").is_ok());
        assert!(validate_format("12345").is_err());
        assert!(validate_format("12345a").is_err());
        assert!(validate_format("١٢٣٤٥٦").is_err());
    }

    #[test]
    fn test_lock_window() {
        assert_eq!(remaining_lock_ms(&credential(4, 1, 0), 10), None);
        assert_eq!(remaining_lock_ms(&credential(5, 1, 0), 1_000), Some(LOCK_UNIT_MS - 1_000));
        assert_eq!(remaining_lock_ms(&credential(5, 2, 0), LOCK_UNIT_MS), Some(LOCK_UNIT_MS));
        assert_eq!(remaining_lock_ms(&credential(5, 1, 0), LOCK_UNIT_MS), None);
    }

    #[test]
    fn test_hash_depends_on_salt() {
        let a = hash_pin("00", "123456").unwrap();
        let b = hash_pin("01", "123456").unwrap();
        assert_ne!(a, b);
        assert!(hash_pin("zz", "123456").is_err());
    }

    #[test]
    fn test_host_cache_holds_one_host() {
        let mut cache = AuthorizedHostCache::default();
        let addresses = vec![DerivedAddress {
            network: Network::Ethereum,
            address: "0xabc".to_string(),
        }];
        cache.authorize("app.example", addresses.clone());
        assert!(cache.is_authorized("app.example"));
        assert!(!cache.is_authorized("example"));
        assert_eq!(cache.address_for("app.example", Network::Ethereum).as_deref(), Some("0xabc"));
        assert_eq!(cache.address_for("app.example", Network::SmartChain), None);

        cache.authorize("other.example", addresses);
        assert!(!cache.is_authorized("app.example"));
    }
}
