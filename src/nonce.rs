//! Per-chain transaction counter
//!
//! Values are held as `U256` everywhere in the bridge. Only the persisted
//! numeral keeps the wallet's historical encoding: a single digit is decimal,
//! anything longer is hex without a prefix.

use alloy_primitives::U256;
use std::sync::{Arc, Mutex};

use crate::chain::Chain;
use crate::error::BridgeError;
use crate::storage::{ChainNonce, SecureStore};

/// Read a stored numeral.
pub fn parse_numeral(value: &str) -> Result<U256, BridgeError> {
    let value = value.trim();
    if value.len() == 1 && value.as_bytes()[0].is_ascii_digit() {
        return Ok(U256::from(value.as_bytes()[0] - b'0'));
    }
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| BridgeError::InvalidQuantity(format!("nonce '{}': {}", value, e)))
}

/// Render a value the way it is persisted.
pub fn format_numeral(value: U256) -> String {
    if value <= U256::from(9u8) {
        value.to_string()
    } else {
        format!("{:x}", value)
    }
}

#[derive(Clone)]
pub struct NonceStore {
    store: Arc<dyn SecureStore>,
    // Serialises read-modify-write of the nonce file
    guard: Arc<Mutex<()>>,
}

impl NonceStore {
    pub fn new(store: Arc<dyn SecureStore>) -> Self {
        Self {
            store,
            guard: Arc::new(Mutex::new(())),
        }
    }

    /// Current nonce; a chain without a record starts at zero.
    pub fn get(&self, chain: Chain) -> Result<U256, BridgeError> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        self.read(chain)
    }

    /// Current nonce as its persisted numeral.
    pub fn numeral(&self, chain: Chain) -> Result<String, BridgeError> {
        Ok(format_numeral(self.get(chain)?))
    }

    /// Increment after a successful broadcast, returning the new value.
    pub fn advance(&self, chain: Chain) -> Result<U256, BridgeError> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let next = self.read(chain)? + U256::from(1u8);
        self.store.save_nonce(&ChainNonce {
            ticker: chain.ticker().to_string(),
            value: format_numeral(next),
        })?;
        log::info!("{} nonce advanced to {}", chain.ticker(), next);
        Ok(next)
    }

    fn read(&self, chain: Chain) -> Result<U256, BridgeError> {
        let record = self
            .store
            .load_nonce(chain.ticker())?
            .unwrap_or_else(|| ChainNonce::zero(chain.ticker()));
        parse_numeral(&record.value)
    }
}
