//! Settlement result types

use crate::ids::U256;
use serde::{Deserialize, Serialize};

/// Terms a strategy computed for one maker/taker pair
///
/// The item and amount sequences are what actually moves; they may be a
/// subset of what the taker offered (range strategies drop out-of-band ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub price: U256,
    pub item_ids: Vec<U256>,
    pub amounts: Vec<U256>,
    /// Whether the maker's order nonce is spent by this fill
    pub is_nonce_invalidated: bool,
}

impl SettlementResult {
    /// A full fill that spends the maker's order nonce.
    pub fn filled(price: U256, item_ids: Vec<U256>, amounts: Vec<U256>) -> Self {
        Self {
            price,
            item_ids,
            amounts,
            is_nonce_invalidated: true,
        }
    }

    /// Total number of units transferred.
    pub fn total_amount(&self) -> U256 {
        self.amounts.iter().fold(U256::ZERO, |acc, a| acc.saturating_add(*a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filled_invalidates_nonce() {
        let result = SettlementResult::filled(
            U256::from(10u64),
            vec![U256::from(1u64), U256::from(2u64)],
            vec![U256::from(3u64), U256::from(4u64)],
        );
        assert!(result.is_nonce_invalidated);
        assert_eq!(result.total_amount(), U256::from(7u64));
    }
}
