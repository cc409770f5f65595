//! Inbound bridge frames
//!
//! The injected provider posts `base64(JSON)` with `id`, `name`, `network`
//! and an `object` of string fields.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::chain::Network;
use crate::error::BridgeError;
use crate::evm::parse_quantity;

/// Chain id assumed when a switch request omits one (BNB Smart Chain).
const DEFAULT_SWITCH_CHAIN_ID: &str = "0x38";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    RequestAccounts,
    SwitchChain,
    SignTransaction,
}

impl Method {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "requestAccounts" => Some(Method::RequestAccounts),
            "switchEthereumChain" => Some(Method::SwitchChain),
            "signTransaction" => Some(Method::SignTransaction),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::RequestAccounts => "requestAccounts",
            Method::SwitchChain => "switchEthereumChain",
            Method::SignTransaction => "signTransaction",
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    id: u64,
    name: String,
    network: String,
    #[serde(default)]
    object: Option<Value>,
}

/// Transaction fields as the DApp sent them; empty when absent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionFields {
    pub from: String,
    pub to: String,
    pub value: String,
    pub data: String,
    pub gas: String,
    pub gas_price: String,
}

/// A decoded, immutable bridge request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub id: u64,
    pub method: Method,
    pub network: Network,
    pub params: BTreeMap<String, String>,
}

impl BridgeRequest {
    /// Decode a base64 frame. Unknown networks and methods are errors the
    /// dispatcher drops without answering the page.
    pub fn decode(payload: &str) -> Result<Self, BridgeError> {
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| BridgeError::Decode(format!("base64: {}", e)))?;
        let text = String::from_utf8(bytes).map_err(|e| BridgeError::Decode(format!("utf-8: {}", e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        let raw: RawMessage =
            serde_json::from_str(text).map_err(|e| BridgeError::Decode(format!("json: {}", e)))?;

        let network =
            Network::parse(&raw.network).ok_or_else(|| BridgeError::UnsupportedNetwork(raw.network.clone()))?;
        let method = Method::from_name(&raw.name).ok_or_else(|| BridgeError::UnsupportedMethod(raw.name.clone()))?;

        let params = match raw.object {
            Some(Value::Object(object)) => object
                .into_iter()
                .filter_map(|(key, value)| match value {
                    Value::Null => None,
                    Value::String(s) => Some((key, s)),
                    other => Some((key, other.to_string())),
                })
                .collect(),
            _ => BTreeMap::new(),
        };

        Ok(Self {
            id: raw.id,
            method,
            network,
            params,
        })
    }

    fn param(&self, key: &str) -> String {
        self.params.get(key).map(|v| v.trim().to_string()).unwrap_or_default()
    }

    /// Requested chain id of a switch, as (hex as sent, numeric value).
    pub fn requested_chain_id(&self) -> Result<(String, u64), BridgeError> {
        let hex = match self.param("chainId") {
            raw if raw.is_empty() => DEFAULT_SWITCH_CHAIN_ID.to_string(),
            raw => raw,
        };
        let value = parse_quantity(&hex)?;
        let id = u64::try_from(value).map_err(|_| BridgeError::UnsupportedChain(hex.clone()))?;
        Ok((hex, id))
    }

    pub fn transaction_fields(&self) -> TransactionFields {
        TransactionFields {
            from: self.param("from"),
            to: self.param("to"),
            value: self.param("value"),
            data: self.param("data"),
            gas: self.param("gas"),
            gas_price: self.param("gasPrice"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn test_decode_request_accounts() {
        let request = BridgeRequest::decode(&frame(
            r#"{"id":7,"name":"requestAccounts","network":"ethereum","object":{}}"#,
        ))
        .unwrap();
        assert_eq!(request.id, 7);
        assert_eq!(request.method, Method::RequestAccounts);
        assert_eq!(request.network, Network::Ethereum);
    }

    #[test]
    fn test_decode_transaction_fields() {
        let request = BridgeRequest::decode(&frame(
            r#"{"id":3,"name":"signTransaction","network":"smartchain",
                "object":{"to":"0xabc","value":"0x1","gas":"","data":null,"nonce":4}}"#,
        ))
        .unwrap();
        let fields = request.transaction_fields();
        assert_eq!(fields.to, "0xabc");
        assert_eq!(fields.value, "0x1");
        assert_eq!(fields.gas, "");
        assert_eq!(fields.data, "");
        assert_eq!(fields.gas_price, "");
        assert_eq!(request.params.get("nonce").map(String::as_str), Some("4"));
    }

    #[test]
    fn test_switch_chain_defaults_to_bsc() {
        let request = BridgeRequest::from_json(
            r#"{"id":1,"name":"switchEthereumChain","network":"ethereum"}"#,
        )
        .unwrap();
        assert_eq!(request.requested_chain_id().unwrap(), ("0x38".to_string(), 56));
    }

    #[test]
    fn test_rejects_unknown_network_and_method() {
        let err = BridgeRequest::from_json(r#"{"id":1,"name":"requestAccounts","network":"solana"}"#)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedNetwork(_)));

        let err = BridgeRequest::from_json(r#"{"id":1,"name":"signMessage","network":"ethereum"}"#)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedMethod(_)));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(BridgeRequest::decode("%%%"), Err(BridgeError::Decode(_))));
        assert!(matches!(
            BridgeRequest::decode(&frame("not json")),
            Err(BridgeError::Decode(_))
        ));
    }
}
