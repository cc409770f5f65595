use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::chain::{Chain, Network};
use crate::evm::{BroadcastReceipt, FeeEstimate};

/// Evaluates a script in a page's JS context
pub trait ScriptSink: Send + Sync {
    fn evaluate(&self, script: &str);
}

/// The page a request came from and the channel back into it
#[derive(Clone)]
pub struct PageContext {
    pub host: String,
    sink: Arc<dyn ScriptSink>,
}

impl PageContext {
    pub fn new(host: impl Into<String>, sink: Arc<dyn ScriptSink>) -> Self {
        Self {
            host: host.into(),
            sink,
        }
    }

    pub fn evaluate(&self, script: &str) {
        log::debug!("Evaluating script in {}", self.host);
        self.sink.evaluate(script);
    }
}

impl fmt::Debug for PageContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageContext")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

/// UI work for whoever owns the UI thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostEvent {
    /// Show the PIN sheet
    PromptUnlock {
        id: u64,
        host: String,
        network: Network,
        method: String,
    },
    /// Show the confirmation sheet; confirm stays disabled without a gas price
    ConfirmTransaction {
        id: u64,
        host: String,
        chain: Chain,
        to: String,
        value: String,
        data: String,
        gas_limit: String,
        gas_price: Option<String>,
        confirm_enabled: bool,
        fee: Option<FeeEstimate>,
    },
    GasPriceResolved {
        id: u64,
        gas_price: String,
        fee: Option<FeeEstimate>,
    },
    GasPriceUnavailable {
        id: u64,
        reason: String,
    },
    PinRejected {
        id: u64,
        message: String,
    },
    TransactionSubmitted {
        id: u64,
        receipt: BroadcastReceipt,
    },
    /// Dismissible error carrying the node's response verbatim
    TransactionFailed {
        id: u64,
        message: String,
    },
    ReloadPage {
        host: String,
    },
}
