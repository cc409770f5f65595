//! Page ↔ wallet bridge
//!
//! - `request`: inbound frame decoding
//! - `pending`: interactions parked per request id
//! - `emitter`: scripts delivered back into the page
//! - `events`: page handle and UI events
//! - `manager`: the `Bridge` orchestrator

pub mod emitter;
pub mod events;
pub mod manager;
pub mod pending;
pub mod request;

pub use emitter::ResponseEmitter;
pub use events::{HostEvent, PageContext, ScriptSink};
pub use manager::{Bridge, Completion, Dispatch};
pub use pending::{GasPrice, InteractionStatus, PendingInteraction, PendingInteractions};
pub use request::{BridgeRequest, Method, TransactionFields};
