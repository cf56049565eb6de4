//! USDC amount arithmetic
//!
//! All amounts are integer base units. USDC uses six decimals on every chain
//! the bridge supports.

use alloy_primitives::{
    utils::{format_units, parse_units, ParseUnits},
    U256,
};

use crate::error::{BridgeError, Result};

/// USDC decimals
pub const USDC_DECIMALS: u8 = 6;

/// Basis points in 100%
pub const MAX_BPS: u16 = 10_000;

/// Portion of `balance` selected by a percentage in `1..=100`.
///
/// Rounds down, so the result never exceeds the balance.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidConfig`] for a percentage of 0 or above 100.
///
/// # Example
///
/// ```rust
/// use permit2_bridge::share_of;
/// use alloy_primitives::U256;
///
/// assert_eq!(share_of(U256::from(1_000_001u64), 50).unwrap(), U256::from(500_000u64));
/// ```
pub fn share_of(balance: U256, percentage: u8) -> Result<U256> {
    validate_percentage(percentage)?;
    // balance = 100q + r, so q * pct never exceeds the balance.
    let hundred = U256::from(100u64);
    let pct = U256::from(percentage);
    Ok(balance / hundred * pct + balance % hundred * pct / hundred)
}

pub fn validate_percentage(percentage: u8) -> Result<()> {
    if percentage == 0 || percentage > 100 {
        return Err(BridgeError::InvalidConfig(format!(
            "percentage must be between 1 and 100, got {percentage}"
        )));
    }
    Ok(())
}

/// Minimum amount the destination must receive after `bps` of slippage.
///
/// Slippage above 100% is clamped.
pub fn apply_slippage(amount: U256, bps: u16) -> U256 {
    let bps = bps.min(MAX_BPS);
    amount * U256::from(MAX_BPS - bps) / U256::from(MAX_BPS)
}

/// Renders base units as a decimal USDC string.
pub fn format_usdc(amount: U256) -> String {
    format_units(amount, USDC_DECIMALS).unwrap_or_else(|_| amount.to_string())
}

/// Parses a decimal USDC string into base units.
///
/// # Errors
///
/// Returns [`BridgeError::InvalidConfig`] if the string is not a valid amount
/// or is negative.
pub fn parse_usdc(amount: &str) -> Result<U256> {
    let parsed = parse_units(amount, USDC_DECIMALS)
        .map_err(|e| BridgeError::InvalidConfig(format!("invalid USDC amount {amount:?}: {e}")))?;
    match parsed {
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(value) if value.is_negative() => Err(BridgeError::InvalidConfig(
            format!("USDC amount must not be negative, got {amount:?}"),
        )),
        ParseUnits::I256(value) => Ok(value.into_raw()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1_000_000, 100, 1_000_000)]
    #[case(1_000_000, 50, 500_000)]
    #[case(1_000_000, 1, 10_000)]
    #[case(999, 33, 329)]
    #[case(0, 100, 0)]
    fn share_rounds_down(#[case] balance: u64, #[case] pct: u8, #[case] expected: u64) {
        assert_eq!(
            share_of(U256::from(balance), pct).unwrap(),
            U256::from(expected)
        );
    }

    #[rstest]
    #[case(0)]
    #[case(101)]
    #[case(255)]
    fn out_of_range_percentage_is_rejected(#[case] pct: u8) {
        let err = share_of(U256::from(1u64), pct).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
    }

    #[rstest]
    #[case(1_000_000, 0, 1_000_000)]
    #[case(1_000_000, 50, 995_000)]
    #[case(1_000_000, 10_000, 0)]
    #[case(1_000_000, 20_000, 0)]
    fn slippage(#[case] amount: u64, #[case] bps: u16, #[case] expected: u64) {
        assert_eq!(apply_slippage(U256::from(amount), bps), U256::from(expected));
    }

    #[test]
    fn formats_six_decimals() {
        assert_eq!(format_usdc(U256::from(1_234_567u64)), "1.234567");
        assert_eq!(format_usdc(U256::ZERO), "0.000000");
    }

    #[test]
    fn share_of_large_balances_does_not_overflow() {
        assert_eq!(share_of(U256::MAX, 100).unwrap(), U256::MAX);
        assert_eq!(share_of(U256::MAX, 50).unwrap(), U256::MAX / U256::from(2u64));
        assert_eq!(
            share_of(U256::MAX, 1).unwrap(),
            U256::MAX / U256::from(100u64)
        );
    }

    #[test]
    fn parses_decimal_strings() {
        assert_eq!(parse_usdc("2.5").unwrap(), U256::from(2_500_000u64));
        assert_eq!(parse_usdc("0").unwrap(), U256::ZERO);
    }

    #[rstest]
    #[case("lots")]
    #[case("-2.5")]
    #[case("-0.000001")]
    fn invalid_amounts_are_rejected(#[case] input: &str) {
        let err = parse_usdc(input).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)), "{input}: {err}");
    }
}
