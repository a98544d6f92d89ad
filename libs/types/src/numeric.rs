//! Basis-point arithmetic on 256-bit integer amounts
//!
//! Prices and amounts are raw integer units of the settlement currency
//! (wei-style). No floating point is ever involved. Every fraction is
//! expressed in basis points and truncated toward zero.

use alloy_primitives::U256;

/// 100% expressed in basis points.
pub const ONE_HUNDRED_PERCENT_BP: u16 = 10_000;

/// Compute `value * bp / 10_000`, truncating toward zero.
///
/// Evaluated as `(value / 10_000) * bp + (value % 10_000) * bp / 10_000`
/// so that the intermediate product never overflows for any `bp <= 10_000`.
pub fn mul_bp(value: U256, bp: u16) -> U256 {
    let denominator = U256::from(ONE_HUNDRED_PERCENT_BP);
    let bp = U256::from(bp);
    let whole = value / denominator;
    let remainder = value % denominator;
    whole * bp + remainder * bp / denominator
}

/// Rescale an integer between two decimal precisions, truncating toward zero.
///
/// Returns `None` if scaling up overflows.
pub fn rescale(value: U256, from_decimals: u8, to_decimals: u8) -> Option<U256> {
    if from_decimals == to_decimals {
        return Some(value);
    }
    if to_decimals > from_decimals {
        let factor = U256::from(10u8).checked_pow(U256::from(to_decimals - from_decimals))?;
        value.checked_mul(factor)
    } else {
        let factor = U256::from(10u8).checked_pow(U256::from(from_decimals - to_decimals))?;
        Some(value / factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mul_bp_truncates() {
        // 2% of 1 ether
        let one_ether = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(mul_bp(one_ether, 200), U256::from(20_000_000_000_000_000u128));
        // 1.5% of 99 → 1.485 → 1
        assert_eq!(mul_bp(U256::from(99u64), 150), U256::from(1u64));
        assert_eq!(mul_bp(U256::from(9_999u64), 1), U256::ZERO);
    }

    #[test]
    fn test_mul_bp_max_value_does_not_overflow() {
        let fee = mul_bp(U256::MAX, ONE_HUNDRED_PERCENT_BP);
        assert_eq!(fee, U256::MAX);
        assert!(mul_bp(U256::MAX, 5_000) < U256::MAX);
    }

    #[test]
    fn test_rescale() {
        assert_eq!(rescale(U256::from(5u64), 8, 18), Some(U256::from(50_000_000_000u64)));
        assert_eq!(rescale(U256::from(123_456u64), 6, 3), Some(U256::from(123u64)));
        assert_eq!(rescale(U256::from(7u64), 18, 18), Some(U256::from(7u64)));
        assert_eq!(rescale(U256::MAX, 0, 18), None);
    }

    proptest! {
        #[test]
        fn prop_mul_bp_matches_naive(value in any::<u128>(), bp in 0u16..=10_000) {
            let expected = U256::from(value) * U256::from(bp) / U256::from(10_000u64);
            prop_assert_eq!(mul_bp(U256::from(value), bp), expected);
        }

        #[test]
        fn prop_mul_bp_never_exceeds_value(value in any::<u128>(), bp in 0u16..=10_000) {
            prop_assert!(mul_bp(U256::from(value), bp) <= U256::from(value));
        }
    }
}
