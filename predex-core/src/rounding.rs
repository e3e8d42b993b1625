//! Quantization policy for monetary and share quantities
//!
//! All balances and proceeds are held to 2 decimal places, share counts to
//! 6, applied after every mutation so repeated trades cannot accumulate
//! drift. Buy and sell use the same helpers, which keeps round trips inside
//! the stated rounding tolerance.

use rust_decimal::Decimal;

/// Decimal places kept for USDC amounts
pub const USDC_DP: u32 = 2;

/// Decimal places kept for share counts
pub const SHARE_DP: u32 = 6;

/// Quantize a USDC amount to the currency precision
pub fn quantize_usdc(value: Decimal) -> Decimal {
    value.round_dp(USDC_DP)
}

/// Quantize a share count to the share precision
pub fn quantize_shares(value: Decimal) -> Decimal {
    value.round_dp(SHARE_DP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_usdc_two_places() {
        assert_eq!(quantize_usdc(dec!(10.005)), dec!(10.00));
        assert_eq!(quantize_usdc(dec!(10.015)), dec!(10.02));
        assert_eq!(quantize_usdc(dec!(33.333333)), dec!(33.33));
    }

    #[test]
    fn test_shares_six_places() {
        assert_eq!(quantize_shares(dec!(1.23456789)), dec!(1.234568));
        assert_eq!(quantize_shares(dec!(100)), dec!(100));
    }

    #[test]
    fn test_idempotent() {
        let v = quantize_usdc(dec!(55.129));
        assert_eq!(quantize_usdc(v), v);
    }
}
