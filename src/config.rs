/// Bridge configuration from environment variables
///
/// Controls endpoints per chain, the default chain, storage location and
/// network timeouts. Defaults to BNB Smart Chain like the in-app wallet.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::chain::Chain;

/// Gas limit used when the DApp does not send one (180000).
pub const FALLBACK_GAS_LIMIT: &str = "0x2bf20";

/// Network endpoints for one chain
#[derive(Clone, Debug)]
pub struct ChainEndpoints {
    /// JSON-RPC node used for `eth_sendRawTransaction`
    pub rpc_url: String,
    /// RPC url handed to the page's injected provider
    pub provider_rpc_url: String,
    /// Block-explorer API base (gas price proxy)
    pub explorer_api_url: String,
    /// Block-explorer API key
    pub explorer_api_key: String,
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Directory backing the secure store
    pub storage_dir: PathBuf,
    /// Chain used until a page switches chains
    pub default_chain: Chain,
    pub ethereum: ChainEndpoints,
    pub smartchain: ChainEndpoints,
    /// Timeout for gas price and broadcast calls
    pub request_timeout: Duration,
    /// Resolve the DApp promise with the tx hash after a successful broadcast
    pub resolve_signed_transactions: bool,
    /// Listen address of the host API
    pub bind_address: String,
}

impl BridgeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `BRIDGE_STORAGE_DIR`: secure store directory (default `./bridge-data`)
    /// - `BRIDGE_DEFAULT_CHAIN_ID`: `56` (default) or `1`
    /// - `ETH_RPC_URL` / `BSC_RPC_URL`: broadcast endpoints
    /// - `ETH_PROVIDER_RPC_URL` / `BSC_PROVIDER_RPC_URL`: page provider endpoints
    /// - `ETHERSCAN_API_URL` / `BSCSCAN_API_URL`: explorer API bases
    /// - `ETHERSCAN_API_KEY` / `BSCSCAN_API_KEY`: explorer API keys
    /// - `BRIDGE_REQUEST_TIMEOUT_SECS`: network timeout (default 20)
    /// - `BRIDGE_RESOLVE_SIGNED_TX`: `true` (default) or `false`
    /// - `BIND_ADDRESS`: host API address (default `127.0.0.1:3030`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let default_chain = match env::var("BRIDGE_DEFAULT_CHAIN_ID") {
            Ok(raw) => match raw.trim().parse::<u64>().ok().and_then(Chain::from_id) {
                Some(chain) => chain,
                None => {
                    log::warn!("Unknown default chain '{}', using {}", raw, defaults.default_chain);
                    defaults.default_chain
                }
            },
            Err(_) => defaults.default_chain,
        };
        log::info!("Default chain: {}", default_chain);

        let ethereum = ChainEndpoints {
            rpc_url: env_or("ETH_RPC_URL", &defaults.ethereum.rpc_url),
            provider_rpc_url: env_or("ETH_PROVIDER_RPC_URL", &defaults.ethereum.provider_rpc_url),
            explorer_api_url: env_or("ETHERSCAN_API_URL", &defaults.ethereum.explorer_api_url),
            explorer_api_key: env_or("ETHERSCAN_API_KEY", ""),
        };
        let smartchain = ChainEndpoints {
            rpc_url: env_or("BSC_RPC_URL", &defaults.smartchain.rpc_url),
            provider_rpc_url: env_or("BSC_PROVIDER_RPC_URL", &defaults.smartchain.provider_rpc_url),
            explorer_api_url: env_or("BSCSCAN_API_URL", &defaults.smartchain.explorer_api_url),
            explorer_api_key: env_or("BSCSCAN_API_KEY", ""),
        };
        if ethereum.explorer_api_key.is_empty() || smartchain.explorer_api_key.is_empty() {
            log::warn!("Explorer API key missing; gas price lookups may be rate limited");
        }

        let request_timeout = env::var("BRIDGE_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let resolve_signed_transactions = env::var("BRIDGE_RESOLVE_SIGNED_TX")
            .map(|raw| !matches!(raw.trim().to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(defaults.resolve_signed_transactions);

        let storage_dir = env::var("BRIDGE_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.storage_dir);
        log::info!("Secure store directory: {}", storage_dir.display());

        Self {
            storage_dir,
            default_chain,
            ethereum,
            smartchain,
            request_timeout,
            resolve_signed_transactions,
            bind_address: env_or("BIND_ADDRESS", &defaults.bind_address),
        }
    }

    pub fn endpoints(&self, chain: Chain) -> &ChainEndpoints {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::SmartChain => &self.smartchain,
        }
    }

    pub fn endpoints_mut(&mut self, chain: Chain) -> &mut ChainEndpoints {
        match chain {
            Chain::Ethereum => &mut self.ethereum,
            Chain::SmartChain => &mut self.smartchain,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./bridge-data"),
            default_chain: Chain::SmartChain,
            ethereum: ChainEndpoints {
                rpc_url: "https://ethereum.publicnode.com".to_string(),
                provider_rpc_url: "https://ethereum.publicnode.com".to_string(),
                explorer_api_url: "https://api.etherscan.io/api".to_string(),
                explorer_api_key: String::new(),
            },
            smartchain: ChainEndpoints {
                rpc_url: "https://bsc-dataseed2.binance.org".to_string(),
                provider_rpc_url: "https://bsc-dataseed2.binance.org".to_string(),
                explorer_api_url: "https://api.bscscan.com/api".to_string(),
                explorer_api_key: String::new(),
            },
            request_timeout: Duration::from_secs(20),
            resolve_signed_transactions: true,
            bind_address: "127.0.0.1:3030".to_string(),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
