//! Hex quantities and fee display
//!
//! DApps send every numeric field as a hex quantity, with or without the
//! `0x` prefix. Fees are displayed in whole coins (18 decimals).

use alloy_primitives::{Bytes, U256};
use serde::Serialize;

use crate::error::BridgeError;

pub const COIN_DECIMALS: usize = 18;
const FIAT_DECIMALS: usize = 5;

pub fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Parse a required hex quantity.
pub fn parse_quantity(value: &str) -> Result<U256, BridgeError> {
    let digits = strip_hex_prefix(value.trim());
    if digits.is_empty() {
        return Err(BridgeError::InvalidQuantity(format!("empty quantity '{}'", value)));
    }
    U256::from_str_radix(digits, 16)
        .map_err(|e| BridgeError::InvalidQuantity(format!("'{}': {}", value, e)))
}

/// Parse an optional hex quantity; absent or empty reads as zero.
pub fn parse_optional_quantity(value: Option<&str>) -> Result<U256, BridgeError> {
    match value.map(str::trim) {
        None | Some("") | Some("0x") => Ok(U256::ZERO),
        Some(raw) => parse_quantity(raw),
    }
}

/// Decode hex call data. Odd-length input gets a leading zero nibble.
pub fn parse_data(value: Option<&str>) -> Result<Bytes, BridgeError> {
    let digits = strip_hex_prefix(value.unwrap_or("").trim());
    if digits.is_empty() {
        return Ok(Bytes::new());
    }
    let decoded = if digits.len() % 2 == 1 {
        hex::decode(format!("0{}", digits))
    } else {
        hex::decode(digits)
    };
    decoded
        .map(Bytes::from)
        .map_err(|e| BridgeError::InvalidQuantity(format!("call data: {}", e)))
}

/// `0x`-prefixed lowercase hex quantity.
pub fn to_hex_quantity(value: U256) -> String {
    format!("0x{:x}", value)
}

/// Format base units as a plain decimal with trailing zeros stripped.
pub fn format_units(amount: U256, decimals: usize) -> String {
    let digits = amount.to_string();
    let (whole, fraction) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parse a plain decimal (e.g. gwei `"3.5"`) into base units.
pub fn parse_units(value: &str, decimals: usize) -> Result<U256, BridgeError> {
    let (mantissa, scale) = parse_decimal(value)?;
    if scale > decimals {
        return Err(BridgeError::InvalidQuantity(format!(
            "'{}' has more than {} decimals",
            value, decimals
        )));
    }
    mantissa
        .checked_mul(U256::from(10u8).pow(U256::from(decimals - scale)))
        .ok_or_else(|| BridgeError::InvalidQuantity(format!("'{}' overflows", value)))
}

/// Maximum fee for a transaction, as shown on the confirmation sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeeEstimate {
    pub gas_limit: String,
    pub gas_price: String,
    pub fee_wei: String,
    /// Gas price in whole coins
    pub gas_price_display: String,
    /// `gas_limit * gas_price` in whole coins
    pub fee_display: String,
    /// USD estimate, 5 decimal places
    pub fiat_display: Option<String>,
}

impl FeeEstimate {
    pub fn new(gas_limit: U256, gas_price: U256, usd_price: Option<&str>) -> Self {
        let fee = gas_limit.saturating_mul(gas_price);
        let fiat_display = usd_price.and_then(|price| match fiat_value(fee, price) {
            Ok(fiat) => Some(fiat),
            Err(e) => {
                log::debug!("Skipping fiat estimate: {}", e);
                None
            }
        });

        Self {
            gas_limit: to_hex_quantity(gas_limit),
            gas_price: to_hex_quantity(gas_price),
            fee_wei: fee.to_string(),
            gas_price_display: format_units(gas_price, COIN_DECIMALS),
            fee_display: format_units(fee, COIN_DECIMALS),
            fiat_display,
        }
    }

    /// `"<fee> / $<fiat>"`, or just the fee without a cached price.
    pub fn summary(&self) -> String {
        match &self.fiat_display {
            Some(fiat) => format!("{} / ${}", self.fee_display, fiat),
            None => self.fee_display.clone(),
        }
    }
}

/// `fee_wei * usd_price`, rounded half-up to 5 decimal places.
fn fiat_value(fee_wei: U256, usd_price: &str) -> Result<String, BridgeError> {
    let (mantissa, scale) = parse_decimal(usd_price)?;
    let ten = U256::from(10u8);
    let divisor = ten.pow(U256::from(COIN_DECIMALS + scale));
    let scaled = fee_wei
        .checked_mul(mantissa)
        .and_then(|v| v.checked_mul(ten.pow(U256::from(FIAT_DECIMALS))))
        .ok_or_else(|| BridgeError::InvalidQuantity("fiat estimate overflow".to_string()))?;
    let rounded = (scaled + divisor / U256::from(2u8)) / divisor;

    let digits = format!("{:0>width$}", rounded.to_string(), width = FIAT_DECIMALS + 1);
    let split = digits.len() - FIAT_DECIMALS;
    Ok(format!("{}.{}", &digits[..split], &digits[split..]))
}

/// Split a plain decimal like `"312.45"` into (31245, 2).
fn parse_decimal(value: &str) -> Result<(U256, usize), BridgeError> {
    let value = value.trim();
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let valid = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !valid(whole) || !valid(fraction) {
        return Err(BridgeError::InvalidQuantity(format!("price '{}'", value)));
    }
    let digits = format!("{}{}", whole, fraction);
    let mantissa = U256::from_str_radix(&digits, 10)
        .map_err(|e| BridgeError::InvalidQuantity(format!("price '{}': {}", value, e)))?;
    Ok((mantissa, fraction.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity_prefixes() {
        assert_eq!(parse_quantity("0x2bf20").unwrap(), U256::from(180_000u64));
        assert_eq!(parse_quantity("2bf20").unwrap(), U256::from(180_000u64));
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_optional_quantity_defaults_to_zero() {
        assert_eq!(parse_optional_quantity(None).unwrap(), U256::ZERO);
        assert_eq!(parse_optional_quantity(Some("")).unwrap(), U256::ZERO);
        assert_eq!(parse_optional_quantity(Some("0x10")).unwrap(), U256::from(16u8));
    }

    #[test]
    fn test_parse_odd_length_data() {
        assert_eq!(parse_data(Some("0xabc")).unwrap().to_vec(), vec![0x0a, 0xbc]);
        assert!(parse_data(Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_format_units_strips_trailing_zeros() {
        assert_eq!(format_units(U256::from(540_000_000_000_000u64), 18), "0.00054");
        assert_eq!(format_units(U256::from(10u64).pow(U256::from(18u8)), 18), "1");
        assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u64), 18), "1.5");
        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_fee_estimate_with_fiat() {
        let fee = FeeEstimate::new(
            U256::from(0x2bf20u64),
            U256::from(0xb2d05e00u64),
            Some("300"),
        );
        assert_eq!(fee.fee_display, "0.00054");
        assert_eq!(fee.gas_price_display, "0.000000003");
        assert_eq!(fee.fiat_display.as_deref(), Some("0.16200"));
        assert_eq!(fee.summary(), "0.00054 / $0.16200");
    }

    #[test]
    fn test_parse_gwei_units() {
        assert_eq!(parse_units("3", 9).unwrap(), U256::from(3_000_000_000u64));
        assert_eq!(parse_units("3.5", 9).unwrap(), U256::from(3_500_000_000u64));
        assert!(parse_units("0.0000000001", 9).is_err());
    }

    #[test]
    fn test_fiat_rounds_half_up() {
        // 0.00054 * 0.123456 = 0.00006666624 -> 0.00007
        assert_eq!(
            fiat_value(U256::from(540_000_000_000_000u64), "0.123456").unwrap(),
            "0.00007"
        );
        assert!(fiat_value(U256::from(1u8), "abc").is_err());
    }
}
