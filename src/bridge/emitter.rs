//! Scripts evaluated in the page to deliver results to the DApp
//!
//! Every dynamic value is embedded as a JSON literal, so hosts, addresses
//! and error messages cannot break out of the script.

use serde_json::{json, Value};

use crate::chain::{Chain, Network};

pub const USER_REJECTED: &str = "User rejected the request.";
pub const UNRECOGNIZED_CHAIN_CODE: u32 = 4902;

fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

fn wrap(lines: &[String]) -> String {
    format!("(function() {{\n{}\n}})();", lines.join("\n"))
}

pub struct ResponseEmitter;

impl ResponseEmitter {
    /// Resolve `requestAccounts` with `[address]`.
    pub fn accounts(network: Network, id: u64, address: &str) -> String {
        let provider = network.provider_name();
        let address = js_string(address);
        wrap(&[
            format!("window.{}.setAddress({});", provider, address),
            format!("window.{}.sendResponse({}, [{}]);", provider, id, address),
        ])
    }

    /// Announce the new chain and resolve the switch with `[address]`.
    pub fn chain_switched(network: Network, id: u64, chain_id_hex: &str, address: &str) -> String {
        let provider = network.provider_name();
        let address = js_string(address);
        wrap(&[
            format!("window.{}.emitChainChanged({});", provider, js_string(chain_id_hex)),
            format!("window.{}.setAddress({});", provider, address),
            format!("window.{}.sendResponse({}, [{}]);", provider, id, address),
        ])
    }

    /// Resolve a signed-and-sent transaction with its hash.
    pub fn transaction_sent(network: Network, id: u64, tx_hash: &str) -> String {
        wrap(&[format!(
            "window.{}.sendResponse({}, {});",
            network.provider_name(),
            id,
            js_string(tx_hash)
        )])
    }

    pub fn error(network: Network, id: u64, message: &str) -> String {
        wrap(&[format!(
            "window.{}.sendError({}, {});",
            network.provider_name(),
            id,
            js_string(message)
        )])
    }

    pub fn rejected(network: Network, id: u64) -> String {
        Self::error(network, id, USER_REJECTED)
    }

    /// Provider error for a chain id the wallet does not know.
    pub fn unrecognized_chain(network: Network, id: u64, chain_id_hex: &str) -> String {
        let error = json!({
            "code": UNRECOGNIZED_CHAIN_CODE,
            "message": format!("Unrecognized chain ID {}", chain_id_hex),
        });
        wrap(&[format!(
            "window.{}.sendError({}, {});",
            network.provider_name(),
            id,
            error
        )])
    }

    pub fn set_address(network: Network, address: &str) -> String {
        wrap(&[format!(
            "window.{}.setAddress({});",
            network.provider_name(),
            js_string(address)
        )])
    }

    /// (Re)install the injected provider for `chain`, queuing page messages
    /// on `window.cwMessageQueue` for the host to poll.
    pub fn provider_config(chain: Chain, rpc_url: &str) -> String {
        let config = json!({
            "ethereum": {
                "chainId": chain.id(),
                "rpcUrl": rpc_url,
            },
            "isDebug": false,
        });
        wrap(&[
            "window.cwMessageQueue = [];".to_string(),
            format!("var config = {};", config),
            "trustwallet.ethereum = new trustwallet.Provider(config);".to_string(),
            "trustwallet.postMessage = (json) => {".to_string(),
            "    window.cwMessageQueue.push(window.btoa(JSON.stringify(json)));".to_string(),
            "};".to_string(),
            "window.ethereum = trustwallet.ethereum;".to_string(),
        ])
    }
}
