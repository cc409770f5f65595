//! Supported chains and page networks
//!
//! The bridge knows exactly two EVM chains. Everything chain-specific
//! (ids, tickers, derivation paths, explorer links) hangs off [`Chain`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// BIP-44 path shared by both chains (Smart Chain reuses Ethereum's path).
const EVM_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Ethereum,
    SmartChain,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Ethereum, Chain::SmartChain];

    pub fn from_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            1 => Some(Chain::Ethereum),
            56 => Some(Chain::SmartChain),
            _ => None,
        }
    }

    pub fn id(self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::SmartChain => 56,
        }
    }

    /// Chain id as the `0x`-prefixed quantity pages use (`0x1`, `0x38`).
    pub fn id_hex(self) -> String {
        format!("0x{:x}", self.id())
    }

    /// Ticker used to key the nonce and price records.
    pub fn ticker(self) -> &'static str {
        match self {
            Chain::Ethereum => "ETH",
            Chain::SmartChain => "BSC",
        }
    }

    pub fn coin_type(self) -> CoinType {
        match self {
            Chain::Ethereum => CoinType::Ethereum,
            Chain::SmartChain => CoinType::SmartChain,
        }
    }

    pub fn network(self) -> Network {
        match self {
            Chain::Ethereum => Network::Ethereum,
            Chain::SmartChain => Network::SmartChain,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Chain::Ethereum => "Ethereum Mainnet",
            Chain::SmartChain => "BNBChain Mainnet",
        }
    }

    pub fn explorer_name(self) -> &'static str {
        match self {
            Chain::Ethereum => "ETHERSCAN",
            Chain::SmartChain => "BSCSCAN",
        }
    }

    pub fn explorer_tx_url(self, tx_hash: &str) -> String {
        let base = match self {
            Chain::Ethereum => "https://etherscan.io/tx/",
            Chain::SmartChain => "https://bscscan.com/tx/",
        };
        format!("{}{}", base, tx_hash)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name(), self.id())
    }
}

/// SLIP-44 coin types the key manager derives for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinType {
    Ethereum,
    SmartChain,
}

impl CoinType {
    pub fn slip44(self) -> u32 {
        match self {
            CoinType::Ethereum => 60,
            CoinType::SmartChain => 20_000_714,
        }
    }

    pub fn derivation_path(self) -> &'static str {
        EVM_DERIVATION_PATH
    }
}

/// Name of the provider object a page talks through (`window.ethereum`,
/// `window.smartchain`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Ethereum,
    SmartChain,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Ethereum, Network::SmartChain];

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ethereum" => Some(Network::Ethereum),
            "smartchain" => Some(Network::SmartChain),
            _ => None,
        }
    }

    pub fn provider_name(self) -> &'static str {
        match self {
            Network::Ethereum => "ethereum",
            Network::SmartChain => "smartchain",
        }
    }

    pub fn coin_type(self) -> CoinType {
        match self {
            Network::Ethereum => CoinType::Ethereum,
            Network::SmartChain => CoinType::SmartChain,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.provider_name())
    }
}
