//! Fee split types
//!
//! Proceeds of a settled price are split three ways: protocol fee, creator
//! royalty and the seller's net proceeds.

use crate::ids::{Address, U256};
use serde::{Deserialize, Serialize};

/// Split of a settled price
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub price: U256,
    pub protocol_fee: U256,
    /// `None` when no royalty is due
    pub royalty_recipient: Option<Address>,
    pub royalty_fee: U256,
    pub net_proceeds: U256,
}

impl FeeSplit {
    /// A split with no fees at all.
    pub fn fee_free(price: U256) -> Self {
        Self {
            price,
            protocol_fee: U256::ZERO,
            royalty_recipient: None,
            royalty_fee: U256::ZERO,
            net_proceeds: price,
        }
    }

    /// `protocol_fee + royalty_fee + net_proceeds == price`
    pub fn is_balanced(&self) -> bool {
        self.protocol_fee
            .checked_add(self.royalty_fee)
            .and_then(|fees| fees.checked_add(self.net_proceeds))
            == Some(self.price)
    }
}
