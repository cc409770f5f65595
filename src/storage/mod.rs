//! Storage and persistence layer
//!
//! - `SecureStore`: the narrow accessors the bridge reads and writes through
//! - File system backend
//! - Data models

mod file_system;
mod models;

pub use file_system::FileStore;
pub use models::{ChainNonce, PinCredential};

use crate::error::StorageError;
use crate::keys::SecretPhrase;

/// Persisted wallet state: PIN credential, mnemonic, nonces and cached prices
pub trait SecureStore: Send + Sync {
    fn load_pin_credential(&self) -> Result<Option<PinCredential>, StorageError>;
    fn save_pin_credential(&self, credential: &PinCredential) -> Result<(), StorageError>;

    /// Read the phrase. Only the PIN gate's success path calls this.
    fn load_mnemonic(&self) -> Result<Option<SecretPhrase>, StorageError>;
    /// Whether a phrase is stored, without reading it.
    fn has_mnemonic(&self) -> Result<bool, StorageError>;
    fn save_mnemonic(&self, phrase: &SecretPhrase) -> Result<(), StorageError>;

    fn load_nonce(&self, ticker: &str) -> Result<Option<ChainNonce>, StorageError>;
    fn save_nonce(&self, nonce: &ChainNonce) -> Result<(), StorageError>;

    /// Cached USD price for a chain's native coin, as a plain decimal
    fn load_token_price(&self, ticker: &str) -> Result<Option<String>, StorageError>;
    fn save_token_price(&self, ticker: &str, usd_price: &str) -> Result<(), StorageError>;

    /// Both a PIN credential and a mnemonic are present.
    fn is_configured(&self) -> Result<bool, StorageError> {
        Ok(self.load_pin_credential()?.is_some() && self.has_mnemonic()?)
    }
}
