use alloy_primitives::U256;
use serde::Deserialize;
use std::time::Duration;

use super::units::{parse_quantity, parse_units, to_hex_quantity};
use crate::chain::Chain;
use crate::config::{BridgeConfig, ChainEndpoints};
use crate::error::BridgeError;

const GWEI_DECIMALS: usize = 9;

/// Explorer response body. The proxy endpoint answers with a hex string;
/// the gas tracker answers with an object priced in gwei.
#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    result: GasResult,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GasResult {
    Hex(String),
    Oracle {
        #[serde(rename = "ProposeGasPrice")]
        propose_gas_price: String,
    },
}

/// Fetches the current gas price from a chain's block-explorer API
#[derive(Clone)]
pub struct GasPriceOracle {
    client: reqwest::Client,
    ethereum: ChainEndpoints,
    smartchain: ChainEndpoints,
}

impl GasPriceOracle {
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        Ok(Self {
            client: http_client(config.request_timeout)?,
            ethereum: config.ethereum.clone(),
            smartchain: config.smartchain.clone(),
        })
    }

    fn endpoints(&self, chain: Chain) -> &ChainEndpoints {
        match chain {
            Chain::Ethereum => &self.ethereum,
            Chain::SmartChain => &self.smartchain,
        }
    }

    /// Current gas price in wei as a `0x` hex quantity.
    ///
    /// Any failure, including a timeout, is `GasPriceUnavailable`; the caller
    /// must never substitute a price of its own.
    pub async fn fetch_gas_price(&self, chain: Chain) -> Result<String, BridgeError> {
        let endpoints = self.endpoints(chain);
        log::debug!("Fetching gas price for {} from {}", chain.ticker(), endpoints.explorer_api_url);

        let response = self
            .client
            .get(&endpoints.explorer_api_url)
            .query(&[
                ("module", "proxy"),
                ("action", "eth_gasPrice"),
                ("apikey", endpoints.explorer_api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BridgeError::GasPriceUnavailable("gas price request timed out".to_string())
                } else {
                    BridgeError::GasPriceUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BridgeError::GasPriceUnavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(BridgeError::GasPriceUnavailable(format!("HTTP {}: {}", status, body)));
        }

        let price = parse_gas_response(&body)?;
        log::info!("{} gas price: {}", chain.ticker(), to_hex_quantity(price));
        Ok(to_hex_quantity(price))
    }
}

fn parse_gas_response(body: &str) -> Result<U256, BridgeError> {
    let parsed: ExplorerResponse = serde_json::from_str(body)
        .map_err(|e| BridgeError::GasPriceUnavailable(format!("unexpected response: {}", e)))?;

    let price = match parsed.result {
        GasResult::Hex(hex) => parse_quantity(&hex),
        GasResult::Oracle { propose_gas_price } => parse_units(&propose_gas_price, GWEI_DECIMALS),
    }
    // Explorers report API errors inside `result` as plain text.
    .map_err(|e| BridgeError::GasPriceUnavailable(e.to_string()))?;

    if price.is_zero() {
        return Err(BridgeError::GasPriceUnavailable("explorer returned zero".to_string()));
    }
    Ok(price)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, BridgeError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BridgeError::Network(e.to_string()))
}
