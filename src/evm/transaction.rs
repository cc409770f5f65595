//! Legacy EIP-155 transaction signing

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use alloy_rlp::{Encodable, Header};
use std::str::FromStr;

use super::units::{parse_data, parse_optional_quantity, parse_quantity, strip_hex_prefix};
use crate::error::BridgeError;
use crate::keys::SigningKey;

/// Fields of a value transfer, optionally carrying call data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningRequest {
    /// `None` for contract creation
    pub to: Option<Address>,
    pub value: U256,
    pub data: Bytes,
    pub gas_limit: U256,
    /// Must be resolved (DApp or gas oracle) before signing
    pub gas_price: Option<U256>,
    pub nonce: U256,
    pub chain_id: u64,
}

impl SigningRequest {
    /// Build a request from the hex strings a DApp sends.
    pub fn from_hex_fields(
        to: &str,
        value: Option<&str>,
        data: Option<&str>,
        gas_limit: &str,
        gas_price: Option<&str>,
        nonce: U256,
        chain_id: u64,
    ) -> Result<Self, BridgeError> {
        let to = match strip_hex_prefix(to.trim()) {
            "" => None,
            _ => Some(
                Address::from_str(to.trim())
                    .map_err(|e| BridgeError::InvalidQuantity(format!("recipient '{}': {}", to, e)))?,
            ),
        };
        let gas_price = match gas_price.map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_quantity(raw)?),
        };

        Ok(Self {
            to,
            value: parse_optional_quantity(value)?,
            data: parse_data(data)?,
            gas_limit: parse_quantity(gas_limit)?,
            gas_price,
            nonce,
            chain_id,
        })
    }

    fn encode_common(&self, gas_price: U256, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        gas_price.encode(out);
        self.gas_limit.encode(out);
        match &self.to {
            Some(address) => address.encode(out),
            None => Bytes::new().encode(out),
        }
        self.value.encode(out);
        self.data.encode(out);
    }

    /// RLP of `[nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]`.
    pub fn signing_payload(&self) -> Result<Vec<u8>, BridgeError> {
        let gas_price = self.require_gas_price()?;
        let mut payload = Vec::new();
        self.encode_common(gas_price, &mut payload);
        self.chain_id.encode(&mut payload);
        0u8.encode(&mut payload);
        0u8.encode(&mut payload);
        Ok(rlp_list(payload))
    }

    pub fn signing_hash(&self) -> Result<B256, BridgeError> {
        Ok(keccak256(self.signing_payload()?))
    }

    fn require_gas_price(&self) -> Result<U256, BridgeError> {
        self.gas_price.ok_or_else(|| {
            BridgeError::GasPriceUnavailable("transaction has no gas price".to_string())
        })
    }
}

/// Raw signed transaction ready for `eth_sendRawTransaction`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Bytes,
    pub hash: B256,
}

impl SignedTransaction {
    /// Uppercase hex with a `0x` prefix, as carried to the broadcaster.
    pub fn to_transport_hex(&self) -> String {
        format!("0x{}", hex::encode_upper(&self.raw))
    }

    pub fn hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.hash))
    }
}

pub struct TransactionSigner;

impl TransactionSigner {
    pub fn sign(request: &SigningRequest, key: &SigningKey) -> Result<SignedTransaction, BridgeError> {
        let gas_price = request.require_gas_price()?;
        let signature = key.sign_prehash(&request.signing_hash()?);
        let (recovery_id, compact) = signature.serialize_compact();

        let recovery = u64::try_from(recovery_id.to_i32())
            .map_err(|e| BridgeError::SigningFailure(format!("recovery id: {}", e)))?;
        let v = request
            .chain_id
            .checked_mul(2)
            .and_then(|v| v.checked_add(35 + recovery))
            .ok_or_else(|| BridgeError::SigningFailure("chain id overflow".to_string()))?;
        let r = U256::from_be_slice(&compact[..32]);
        let s = U256::from_be_slice(&compact[32..]);

        let mut payload = Vec::new();
        request.encode_common(gas_price, &mut payload);
        v.encode(&mut payload);
        r.encode(&mut payload);
        s.encode(&mut payload);

        let raw = rlp_list(payload);
        let hash = keccak256(&raw);
        log::debug!("Signed transaction 0x{} on chain {}", hex::encode(hash), request.chain_id);

        Ok(SignedTransaction {
            raw: Bytes::from(raw),
            hash,
        })
    }
}

fn rlp_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 9);
    Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eip155_request() -> SigningRequest {
        SigningRequest::from_hex_fields(
            "0x3535353535353535353535353535353535353535",
            Some("0xde0b6b3a7640000"),
            None,
            "0x5208",
            Some("0x4a817c800"),
            U256::from(9u8),
            1,
        )
        .unwrap()
    }

    #[test]
    fn test_eip155_signing_payload() {
        let payload = eip155_request().signing_payload().unwrap();
        assert_eq!(
            hex::encode(payload),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
    }

    #[test]
    fn test_missing_gas_price_refuses_to_sign() {
        let mut request = eip155_request();
        request.gas_price = None;
        let key = SigningKey::from_slice(&[0x46; 32]).unwrap();

        let err = TransactionSigner::sign(&request, &key).unwrap_err();
        assert!(matches!(err, BridgeError::GasPriceUnavailable(_)));
    }

    #[test]
    fn test_empty_recipient_is_contract_creation() {
        let request = SigningRequest::from_hex_fields(
            "",
            None,
            Some("0x6001"),
            "0x2bf20",
            Some("0x1"),
            U256::ZERO,
            56,
        )
        .unwrap();
        assert_eq!(request.to, None);
        assert_eq!(request.data.to_vec(), vec![0x60, 0x01]);
    }
}
