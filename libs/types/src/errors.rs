//! Order error taxonomy
//!
//! Structural and economic order validation failures. Signature, nonce,
//! oracle and caller failures live with the settlement engine.

use crate::ids::{Address, StrategyId};
use thiserror::Error;

/// Order validation errors
///
/// Every variant is an "order invalid" outcome from the caller's point of
/// view; the distinct variants exist for pre-flight diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Order invalid: item ids and amounts must be non-empty")]
    EmptyItems,

    #[error("Order invalid: length mismatch (item ids {item_ids}, amounts {amounts})")]
    LengthMismatch { item_ids: usize, amounts: usize },

    #[error("Order invalid: zero amount at index {index}")]
    ZeroAmount { index: usize },

    #[error("Order invalid: single-unit asset requires amount 1 at index {index}")]
    AmountNotOne { index: usize },

    #[error("Order invalid: item ids must be strictly ascending without duplicates (index {index})")]
    DuplicateOrUnsortedIds { index: usize },

    #[error("Order invalid: maker and taker items differ")]
    ItemsMismatch,

    #[error("Order invalid: maker and taker prices differ")]
    PriceMismatch,

    #[error("Bid too low for the asked price")]
    BidTooLow,

    #[error("Order invalid: {reason}")]
    Invalid { reason: &'static str },

    #[error("Quote type does not match the execution path")]
    QuoteTypeMismatch,

    #[error("Outside of time range: now {now}, window [{start_time}, {end_time})")]
    OutsideOfTimeRange {
        now: u64,
        start_time: u64,
        end_time: u64,
    },

    #[error("Currency not whitelisted: {currency}")]
    CurrencyNotWhitelisted { currency: Address },

    #[error("Currency not supported by strategy: {currency}")]
    CurrencyNotSupported { currency: Address },

    #[error("Strategy not active: {strategy_id}")]
    StrategyNotActive { strategy_id: StrategyId },

    #[error("Net proceeds below the maker's minimum ratio")]
    NetProceedsBelowMinimum,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_error_display() {
        let err = OrderError::LengthMismatch {
            item_ids: 2,
            amounts: 1,
        };
        assert_eq!(
            err.to_string(),
            "Order invalid: length mismatch (item ids 2, amounts 1)"
        );
    }

    #[test]
    fn test_time_range_display() {
        let err = OrderError::OutsideOfTimeRange {
            now: 10,
            start_time: 20,
            end_time: 30,
        };
        assert!(err.to_string().contains("[20, 30)"));
    }

    #[test]
    fn test_strategy_not_active_display() {
        let err = OrderError::StrategyNotActive {
            strategy_id: StrategyId::new(4),
        };
        assert_eq!(err.to_string(), "Strategy not active: 4");
    }
}
