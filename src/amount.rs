// SPDX-License-Identifier: AGPL-3.0-or-later

//! Amount parsing and formatting.
//!
//! Monetary inputs arrive as human-readable ether strings (e.g. `"2.5"`)
//! and are carried on-chain as wei base units in encrypted `uint64`
//! fields. Everything above `u64::MAX` wei (~18.44 ETH) is unrepresentable
//! and must be rejected before any encryption or transaction attempt.

use alloy::primitives::U256;

use crate::error::ClientError;

/// Decimals of the native currency.
pub const NATIVE_DECIMALS: u8 = 18;

/// Largest amount representable by the encrypted `uint64` fields, in wei.
pub const MAX_BASE_UNITS: u64 = u64::MAX;

/// Parse a human-readable amount into smallest units.
///
/// # Arguments
/// * `amount` - Amount as a string (e.g., "1.5")
/// * `decimals` - Number of decimals (18 for the native currency)
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256, ClientError> {
    let parts: Vec<&str> = amount.trim().split('.').collect();

    if parts.len() > 2 || parts[0].is_empty() {
        return Err(ClientError::InvalidAmount(format!(
            "`{amount}` is not a valid decimal amount"
        )));
    }

    let whole = parts[0]
        .parse::<u128>()
        .map_err(|_| ClientError::InvalidAmount(format!("`{amount}` has an invalid whole part")))?;

    let decimal_part = if parts.len() == 2 {
        let dec_str = parts[1];
        if dec_str.len() > decimals as usize {
            return Err(ClientError::InvalidAmount(format!(
                "too many decimal places (max {decimals})"
            )));
        }
        // Pad with zeros to match decimals
        let padded = format!("{:0<width$}", dec_str, width = decimals as usize);
        padded
            .parse::<u128>()
            .map_err(|_| ClientError::InvalidAmount(format!("`{amount}` has an invalid fraction")))?
    } else {
        0u128
    };

    let multiplier = 10u128.pow(decimals as u32);
    let total = whole
        .checked_mul(multiplier)
        .and_then(|w| w.checked_add(decimal_part))
        .ok_or_else(|| ClientError::InvalidAmount("amount overflow".to_string()))?;

    Ok(U256::from(total))
}

/// Parse an ether amount into wei, enforcing the encrypted-field range.
///
/// Rejects malformed input, zero, and anything above [`MAX_BASE_UNITS`].
pub fn to_base_units(amount: &str) -> Result<u64, ClientError> {
    let wei = parse_amount(amount, NATIVE_DECIMALS)?;

    if wei.is_zero() {
        return Err(ClientError::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if wei > U256::from(MAX_BASE_UNITS) {
        return Err(ClientError::InvalidAmount(format!(
            "amount exceeds the uint64 ceiling of {MAX_BASE_UNITS} wei"
        )));
    }

    Ok(wei.to::<u64>())
}

/// Format smallest units to a human-readable amount.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_whole_ether() {
        let result = parse_amount("1", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000_000u64));
    }

    #[test]
    fn parse_decimal_ether() {
        let result = parse_amount("2.5", 18).unwrap();
        assert_eq!(result, U256::from(2_500_000_000_000_000_000u64));
    }

    #[test]
    fn parse_small_fraction() {
        let result = parse_amount("0.001", 18).unwrap();
        assert_eq!(result, U256::from(1_000_000_000_000_000u64));
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!(parse_amount("1.2.3", 18).is_err());
        assert!(parse_amount("abc", 18).is_err());
        assert!(parse_amount(".5", 18).is_err());
    }

    #[test]
    fn base_units_round_trip() {
        assert_eq!(to_base_units("2.5").unwrap(), 2_500_000_000_000_000_000u64);
    }

    #[test]
    fn base_units_reject_zero() {
        let err = to_base_units("0").unwrap_err();
        assert!(matches!(err, ClientError::InvalidAmount(_)));
    }

    #[test]
    fn base_units_enforce_uint64_ceiling() {
        // u64::MAX wei is about 18.446 ETH; 18.4 fits, 18.5 does not.
        assert!(to_base_units("18.4").is_ok());
        let err = to_base_units("18.5").unwrap_err();
        assert!(matches!(err, ClientError::InvalidAmount(_)));
    }

    #[test]
    fn format_trims_trailing_zeros() {
        let one_and_half = U256::from(1_500_000_000_000_000_000u64);
        assert_eq!(format_amount(one_and_half, 18), "1.5");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
    }
}
