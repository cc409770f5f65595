use serde::Serialize;
use std::collections::{HashMap, HashSet};

use super::events::PageContext;
use super::request::TransactionFields;
use crate::chain::{Chain, Network};

/// Gas price of a parked transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasPrice {
    /// Sent by the DApp
    Supplied(String),
    /// Oracle lookup in flight
    Loading,
    Resolved(String),
    /// Lookup failed; confirm stays disabled until a retry succeeds
    Unavailable(String),
}

impl GasPrice {
    pub fn value(&self) -> Option<&str> {
        match self {
            GasPrice::Supplied(price) | GasPrice::Resolved(price) => Some(price),
            GasPrice::Loading | GasPrice::Unavailable(_) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParkedTransaction {
    pub chain: Chain,
    pub fields: TransactionFields,
    /// DApp gas limit or the fallback
    pub gas_limit: String,
    pub gas_price: GasPrice,
}

#[derive(Debug, Clone)]
pub enum InteractionKind {
    Unlock,
    ChainSwitch { chain: Chain, chain_id_hex: String },
    Transaction(ParkedTransaction),
}

/// A request waiting for the user
#[derive(Debug, Clone)]
pub struct PendingInteraction {
    pub id: u64,
    pub network: Network,
    pub page: PageContext,
    pub kind: InteractionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum InteractionStatus {
    Idle,
    AwaitingUnlock {
        network: Network,
    },
    AwaitingChainSwitch {
        network: Network,
        chain_id: u64,
    },
    AwaitingTransaction {
        network: Network,
        chain_id: u64,
        gas_price: Option<String>,
        confirm_enabled: bool,
    },
    Processing,
}

impl PendingInteraction {
    pub fn status(&self) -> InteractionStatus {
        match &self.kind {
            InteractionKind::Unlock => InteractionStatus::AwaitingUnlock {
                network: self.network,
            },
            InteractionKind::ChainSwitch { chain, .. } => InteractionStatus::AwaitingChainSwitch {
                network: self.network,
                chain_id: chain.id(),
            },
            InteractionKind::Transaction(tx) => InteractionStatus::AwaitingTransaction {
                network: self.network,
                chain_id: tx.chain.id(),
                gas_price: tx.gas_price.value().map(str::to_string),
                confirm_enabled: tx.gas_price.value().is_some(),
            },
        }
    }
}

/// Interactions keyed by request id
///
/// An entry is taken out while it is being processed, so a second PIN or
/// cancel for the same id cannot overlap the running sequence.
#[derive(Debug, Default)]
pub struct PendingInteractions {
    parked: HashMap<u64, PendingInteraction>,
    processing: HashSet<u64>,
}

impl PendingInteractions {
    /// Park an interaction. A DApp reusing an id replaces the older entry.
    pub fn park(&mut self, interaction: PendingInteraction) {
        let id = interaction.id;
        if self.parked.insert(id, interaction).is_some() {
            log::warn!("Request {} replaced an interaction with the same id", id);
        }
    }

    /// Take a parked interaction for processing.
    pub fn take(&mut self, id: u64) -> Option<PendingInteraction> {
        let interaction = self.parked.remove(&id)?;
        self.processing.insert(id);
        Some(interaction)
    }

    /// Put an interaction back after a recoverable failure (wrong PIN).
    pub fn restore(&mut self, interaction: PendingInteraction) {
        self.processing.remove(&interaction.id);
        self.parked.insert(interaction.id, interaction);
    }

    /// Processing reached a terminal outcome.
    pub fn finish(&mut self, id: u64) {
        self.processing.remove(&id);
    }

    /// Drop a parked interaction (user closed the sheet).
    pub fn remove(&mut self, id: u64) -> Option<PendingInteraction> {
        self.parked.remove(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut PendingInteraction> {
        self.parked.get_mut(&id)
    }

    pub fn status(&self, id: u64) -> InteractionStatus {
        if self.processing.contains(&id) {
            return InteractionStatus::Processing;
        }
        self.parked
            .get(&id)
            .map(PendingInteraction::status)
            .unwrap_or(InteractionStatus::Idle)
    }

    pub fn len(&self) -> usize {
        self.parked.len() + self.processing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
