//! EVM plumbing: quantities, signing, gas price and broadcast
//!
//! - `units`: hex quantity parsing and fee display
//! - `transaction`: EIP-155 legacy signing
//! - `gas`: block-explorer gas price oracle
//! - `broadcast`: `eth_sendRawTransaction` submission

pub mod broadcast;
pub mod gas;
pub mod transaction;
pub mod units;

pub use broadcast::{BroadcastReceipt, Broadcaster};
pub use gas::GasPriceOracle;
pub use transaction::{SignedTransaction, SigningRequest, TransactionSigner};
pub use units::{format_units, parse_optional_quantity, parse_quantity, FeeEstimate};
