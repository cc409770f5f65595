//! RPC Mock Server Library
//!
//! Mocks the two upstreams the bridge talks to: a block-explorer gas price
//! API and a JSON-RPC node accepting raw transactions. Behaviour (gas price,
//! failure status, delays) is scriptable at runtime.

pub mod handlers;
pub mod server;
pub mod types;

// Re-export commonly used types
pub use server::{create_router, run_server, MockServer};
pub use types::*;
