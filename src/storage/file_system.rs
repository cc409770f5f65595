use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use super::models::{ChainNonce, PinCredential};
use super::SecureStore;
use crate::error::StorageError;
use crate::keys::SecretPhrase;

const PIN_FILE: &str = "pin.json";
const MNEMONIC_FILE: &str = "mnemonic.txt";
const NONCES_FILE: &str = "nonces.json";
const PRICES_FILE: &str = "prices.json";

/// Secure store backed by plain files in one directory
#[derive(Clone, Debug)]
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `base_path`. The directory is created lazily.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_path
    }

    fn path(&self, file: &str) -> PathBuf {
        self.base_path.join(file)
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, file: &str) -> Result<Option<T>, StorageError> {
        let path = self.path(file);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn write_json<T: serde::Serialize>(&self, file: &str, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let json = serde_json::to_string_pretty(value)?;
        fs::write(self.path(file), json)?;
        Ok(())
    }
}

impl SecureStore for FileStore {
    fn load_pin_credential(&self) -> Result<Option<PinCredential>, StorageError> {
        self.read_json(PIN_FILE)
    }

    fn save_pin_credential(&self, credential: &PinCredential) -> Result<(), StorageError> {
        self.write_json(PIN_FILE, credential)
    }

    fn load_mnemonic(&self) -> Result<Option<SecretPhrase>, StorageError> {
        let path = self.path(MNEMONIC_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let contents = Zeroizing::new(fs::read_to_string(path)?);
        let words = contents.trim();
        if words.is_empty() {
            return Err(StorageError::Corrupt("mnemonic file is empty".to_string()));
        }
        Ok(Some(SecretPhrase::new(words)))
    }

    fn has_mnemonic(&self) -> Result<bool, StorageError> {
        Ok(self.path(MNEMONIC_FILE).exists())
    }

    fn save_mnemonic(&self, phrase: &SecretPhrase) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base_path)?;
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(self.path(MNEMONIC_FILE))?;
        file.write_all(phrase.expose().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn load_nonce(&self, ticker: &str) -> Result<Option<ChainNonce>, StorageError> {
        let nonces: BTreeMap<String, String> = self.read_json(NONCES_FILE)?.unwrap_or_default();
        Ok(nonces.get(ticker).map(|value| ChainNonce {
            ticker: ticker.to_string(),
            value: value.clone(),
        }))
    }

    fn save_nonce(&self, nonce: &ChainNonce) -> Result<(), StorageError> {
        let mut nonces: BTreeMap<String, String> = self.read_json(NONCES_FILE)?.unwrap_or_default();
        nonces.insert(nonce.ticker.clone(), nonce.value.clone());
        self.write_json(NONCES_FILE, &nonces)
    }

    fn load_token_price(&self, ticker: &str) -> Result<Option<String>, StorageError> {
        let prices: BTreeMap<String, String> = self.read_json(PRICES_FILE)?.unwrap_or_default();
        Ok(prices.get(ticker).cloned())
    }

    fn save_token_price(&self, ticker: &str, usd_price: &str) -> Result<(), StorageError> {
        let mut prices: BTreeMap<String, String> = self.read_json(PRICES_FILE)?.unwrap_or_default();
        prices.insert(ticker.to_string(), usd_price.to_string());
        self.write_json(PRICES_FILE, &prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_records_read_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store"));

        assert!(store.load_pin_credential().unwrap().is_none());
        assert!(store.load_mnemonic().unwrap().is_none());
        assert!(!store.has_mnemonic().unwrap());
        assert!(store.load_nonce("ETH").unwrap().is_none());
        assert!(store.load_token_price("BSC").unwrap().is_none());
    }

    #[test]
    fn test_pin_credential_keeps_created_at() {
        use chrono::TimeZone;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let credential = PinCredential {
            pin_hash: "ab".repeat(32),
            salt: "cd".repeat(16),
            failed_attempts: 2,
            lock_multiplier: 4,
            last_attempt_time_ms: 1_700_000_000_000,
            created_at: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        };
        store.save_pin_credential(&credential).unwrap();

        let raw = fs::read_to_string(dir.path().join(PIN_FILE)).unwrap();
        assert!(raw.contains("2023-11-14T22:13:20Z"));
        assert_eq!(store.load_pin_credential().unwrap(), Some(credential));
    }

    #[test]
    fn test_nonces_keyed_by_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        store.save_nonce(&ChainNonce { ticker: "ETH".into(), value: "5".into() }).unwrap();
        store.save_nonce(&ChainNonce { ticker: "BSC".into(), value: "1f".into() }).unwrap();

        assert_eq!(store.load_nonce("ETH").unwrap().unwrap().value, "5");
        assert_eq!(store.load_nonce("BSC").unwrap().unwrap().value, "1f");
    }

    #[test]
    fn test_has_mnemonic_tracks_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert!(!store.has_mnemonic().unwrap());

        store.save_mnemonic(&SecretPhrase::new("word ".repeat(12).trim())).unwrap();
        assert!(store.has_mnemonic().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_mnemonic_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.save_mnemonic(&SecretPhrase::new("word ".repeat(12).trim())).unwrap();

        let mode = fs::metadata(dir.path().join(MNEMONIC_FILE)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
