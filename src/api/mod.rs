//! HTTP API standing in for the browser shell
//!
//! - `server`: router, shared state, graceful shutdown
//! - `handlers`: one handler per bridge action
//! - `types`: request/response bodies

pub mod handlers;
pub mod server;
pub mod types;

pub use server::{router, start_server, AppState};
