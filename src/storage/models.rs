//! Data models for the secure store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted PIN record
///
/// `pin_hash` is hex SHA-256 over `salt || pin`. The lock counters reset on
/// every successful unlock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinCredential {
    pub pin_hash: String,
    pub salt: String,
    pub failed_attempts: u32,
    pub lock_multiplier: u32,
    pub last_attempt_time_ms: i64,
    pub created_at: DateTime<Utc>,
}

/// Transaction counter for one chain ticker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainNonce {
    pub ticker: String,
    /// Decimal while the value is a single digit, hex afterwards
    pub value: String,
}

impl ChainNonce {
    pub fn zero(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            value: "0".to_string(),
        }
    }
}
