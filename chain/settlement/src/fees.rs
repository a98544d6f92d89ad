//! Fee calculation
//!
//! `protocol_fee = price * protocol_fee_bp / 10_000`, truncated toward zero.
//! The royalty is looked up only for royalty-eligible strategies and is
//! clamped to the headroom left by the protocol fee, so the seller's net
//! proceeds can never go negative.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use types::fee::FeeSplit;
use types::numeric::{mul_bp, ONE_HUNDRED_PERCENT_BP};

use crate::strategy::StrategyRecord;

/// External royalty lookup.
pub trait RoyaltyFeeRegistry: Send + Sync {
    /// Royalty owed on a sale of `collection` at `price`, if a recipient is
    /// registered.
    fn royalty_info(&self, collection: Address, price: U256) -> Option<(Address, U256)>;
}

/// Royalty registry with a fixed rate per collection.
#[derive(Debug, Clone, Default)]
pub struct FixedRateRoyalties {
    rates: HashMap<Address, (Address, u16)>,
}

impl FixedRateRoyalties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `recipient` to receive `rate_bp` of every sale of `collection`.
    pub fn set(&mut self, collection: Address, recipient: Address, rate_bp: u16) {
        self.rates
            .insert(collection, (recipient, rate_bp.min(ONE_HUNDRED_PERCENT_BP)));
    }
}

impl RoyaltyFeeRegistry for FixedRateRoyalties {
    fn royalty_info(&self, collection: Address, price: U256) -> Option<(Address, U256)> {
        self.rates
            .get(&collection)
            .map(|(recipient, rate_bp)| (*recipient, mul_bp(price, *rate_bp)))
    }
}

/// Splits settled prices into protocol fee, royalty and net proceeds.
#[derive(Clone, Default)]
pub struct FeeCalculator {
    royalties: Option<Arc<dyn RoyaltyFeeRegistry>>,
}

impl fmt::Debug for FeeCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeeCalculator")
            .field("has_royalty_registry", &self.royalties.is_some())
            .finish()
    }
}

impl FeeCalculator {
    pub fn new(royalties: Option<Arc<dyn RoyaltyFeeRegistry>>) -> Self {
        Self { royalties }
    }

    /// Point at a different royalty registry, or none.
    pub fn set_royalty_registry(&mut self, royalties: Option<Arc<dyn RoyaltyFeeRegistry>>) {
        self.royalties = royalties;
    }

    pub fn has_royalty_registry(&self) -> bool {
        self.royalties.is_some()
    }

    /// Split `price` under `strategy`'s fee policy.
    pub fn split(&self, price: U256, strategy: &StrategyRecord, collection: Address) -> FeeSplit {
        let protocol_fee = mul_bp(price, strategy.protocol_fee_bp);
        let headroom = price - protocol_fee;

        let (royalty_recipient, royalty_fee) = match (&self.royalties, strategy.has_royalties) {
            (Some(registry), true) => match registry.royalty_info(collection, price) {
                Some((recipient, amount)) if !recipient.is_zero() && !amount.is_zero() => {
                    (Some(recipient), amount.min(headroom))
                }
                _ => (None, U256::ZERO),
            },
            _ => (None, U256::ZERO),
        };

        FeeSplit {
            price,
            protocol_fee,
            royalty_recipient,
            royalty_fee,
            net_proceeds: headroom - royalty_fee,
        }
    }
}
