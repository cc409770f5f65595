//! DApp Bridge: PIN-gated EVM wallet bridge for in-app web pages
//!
//! Pages talk to an injected provider (`window.ethereum`, `window.smartchain`)
//! that posts base64 JSON frames to the host. The bridge answers account,
//! chain-switch and transaction requests with scripts evaluated back in the
//! page, after the user authorizes with a PIN.
//!
//! # Architecture
//!
//! - **Bridge**: decodes frames, parks requests per id, drives them to completion
//! - **PinGate**: PIN check with escalating lockout, session host cache
//! - **KeyManager**: BIP-39/BIP-44 derivation, zeroized key handles
//! - **EVM**: EIP-155 signing, gas price oracle, broadcaster, nonce store
//!
//! # Example
//!
//! ```ignore
//! use dapp_bridge::{Bridge, BridgeConfig, FileStore, PageContext};
//!
//! let config = BridgeConfig::from_env();
//! let store = Arc::new(FileStore::new(config.storage_dir.clone()));
//! let (bridge, mut events) = Bridge::new(config, store)?;
//!
//! bridge.handle_message(PageContext::new("app.example", sink), &frame);
//! ```

// Public modules
pub mod api;
pub mod bridge;
pub mod chain;
pub mod config;
pub mod error;
pub mod evm;
pub mod keys;
pub mod nonce;
pub mod pin;
pub mod storage;

// Re-exports for convenience
pub use bridge::{
    Bridge, BridgeRequest, Completion, Dispatch, HostEvent, InteractionStatus, Method, PageContext,
    ResponseEmitter, ScriptSink,
};
pub use chain::{Chain, CoinType, Network};
pub use config::{BridgeConfig, ChainEndpoints, FALLBACK_GAS_LIMIT};
pub use error::{BridgeError, StorageError};
pub use evm::{
    BroadcastReceipt, Broadcaster, FeeEstimate, GasPriceOracle, SignedTransaction, SigningRequest,
    TransactionSigner,
};
pub use keys::{DerivedAddress, KeyManager, SecretPhrase, SigningKey};
pub use nonce::NonceStore;
pub use pin::{AuthorizedHostCache, PinGate, Unlocked};
pub use storage::{ChainNonce, FileStore, PinCredential, SecureStore};

// Common result type
pub type Result<T> = std::result::Result<T, BridgeError>;
