//! Common test utilities for bridge integration tests
//!
//! - Temp-dir backed stores provisioned with a known phrase and PIN
//! - A script sink that records what the page would have evaluated
//! - Config pointing every chain at an in-process `rpc-mock`

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use dapp_bridge::{
    Bridge, BridgeConfig, Chain, ChainNonce, FileStore, HostEvent, PageContext, PinCredential,
    ScriptSink, SecretPhrase, SecureStore, StorageError,
};
use rpc_mock::MockServer;

pub const PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
pub const PHRASE_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";
pub const PIN: &str = "123456";
pub const WRONG_PIN: &str = "654321";
pub const HOST: &str = "app.uniswap.org";

pub fn init_logging() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

/// Records every script evaluated in the page
#[derive(Default)]
pub struct RecordingSink {
    scripts: Mutex<Vec<String>>,
}

impl ScriptSink for RecordingSink {
    fn evaluate(&self, script: &str) {
        self.scripts.lock().unwrap().push(script.to_string());
    }
}

impl RecordingSink {
    pub fn scripts(&self) -> Vec<String> {
        self.scripts.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.scripts.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.scripts.lock().unwrap().len()
    }
}

/// File store that counts how often the phrase is read
pub struct CountingStore {
    inner: FileStore,
    mnemonic_reads: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: FileStore) -> Self {
        Self {
            inner,
            mnemonic_reads: AtomicUsize::new(0),
        }
    }

    pub fn mnemonic_reads(&self) -> usize {
        self.mnemonic_reads.load(Ordering::SeqCst)
    }
}

impl SecureStore for CountingStore {
    fn load_pin_credential(&self) -> Result<Option<PinCredential>, StorageError> {
        self.inner.load_pin_credential()
    }

    fn save_pin_credential(&self, credential: &PinCredential) -> Result<(), StorageError> {
        self.inner.save_pin_credential(credential)
    }

    fn load_mnemonic(&self) -> Result<Option<SecretPhrase>, StorageError> {
        self.mnemonic_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.load_mnemonic()
    }

    fn has_mnemonic(&self) -> Result<bool, StorageError> {
        self.inner.has_mnemonic()
    }

    fn save_mnemonic(&self, phrase: &SecretPhrase) -> Result<(), StorageError> {
        self.inner.save_mnemonic(phrase)
    }

    fn load_nonce(&self, ticker: &str) -> Result<Option<ChainNonce>, StorageError> {
        self.inner.load_nonce(ticker)
    }

    fn save_nonce(&self, nonce: &ChainNonce) -> Result<(), StorageError> {
        self.inner.save_nonce(nonce)
    }

    fn load_token_price(&self, ticker: &str) -> Result<Option<String>, StorageError> {
        self.inner.load_token_price(ticker)
    }

    fn save_token_price(&self, ticker: &str, usd_price: &str) -> Result<(), StorageError> {
        self.inner.save_token_price(ticker, usd_price)
    }
}

/// Config with every endpoint on `mock` and a short network timeout
pub fn config_for(mock: &MockServer, temp_dir: &TempDir) -> BridgeConfig {
    let mut config = BridgeConfig {
        storage_dir: temp_dir.path().to_path_buf(),
        request_timeout: Duration::from_millis(500),
        ..BridgeConfig::default()
    };
    for chain in Chain::ALL {
        let endpoints = config.endpoints_mut(chain);
        endpoints.rpc_url = mock.rpc_url();
        endpoints.explorer_api_url = mock.explorer_url();
        endpoints.explorer_api_key = "test-key".to_string();
    }
    config
}

/// Test environment with a provisioned wallet
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub mock: MockServer,
    pub store: Arc<FileStore>,
    pub bridge: Bridge,
    pub events: UnboundedReceiver<HostEvent>,
    pub sink: Arc<RecordingSink>,
}

impl TestEnvironment {
    pub async fn new() -> anyhow::Result<Self> {
        let env = Self::unprovisioned().await?;
        env.bridge.provision(PIN, Some(PHRASE))?;
        Ok(env)
    }

    pub async fn unprovisioned() -> anyhow::Result<Self> {
        init_logging();
        let temp_dir = TempDir::new()?;
        log::info!("Test directory: {:?}", temp_dir.path());

        let mock = MockServer::start().await?;
        let store = Arc::new(FileStore::new(temp_dir.path()));
        let (bridge, events) = Bridge::new(config_for(&mock, &temp_dir), store.clone())?;

        Ok(Self {
            temp_dir,
            mock,
            store,
            bridge,
            events,
            sink: Arc::new(RecordingSink::default()),
        })
    }

    pub fn page(&self) -> PageContext {
        PageContext::new(HOST, self.sink.clone())
    }

    /// Wait for the first event matching `predicate`, skipping others
    pub async fn wait_for<F>(&mut self, predicate: F) -> HostEvent
    where
        F: Fn(&HostEvent) -> bool,
    {
        let deadline = Duration::from_secs(5);
        loop {
            let event = tokio::time::timeout(deadline, self.events.recv())
                .await
                .expect("Timed out waiting for host event")
                .expect("Event channel closed");
            if predicate(&event) {
                return event;
            }
            log::debug!("Skipping event {:?}", event);
        }
    }
}

/// Encode a bridge frame the way the injected provider does
pub fn frame(message: serde_json::Value) -> String {
    STANDARD.encode(message.to_string())
}
