//! Maker and taker order types
//!
//! A maker order is signed off-chain and immutable once signed. A taker order
//! is the unsigned counter-offer submitted at settlement time by its own
//! sender.

use crate::errors::OrderError;
use crate::ids::{Address, Bytes, Nonce, StrategyId, U256};
use crate::numeric::ONE_HUNDRED_PERCENT_BP;
use serde::{Deserialize, Serialize};

/// Quote type of a maker order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuoteType {
    /// Offer to buy: `price` is the maximum the maker pays
    #[default]
    Bid,
    /// Offer to sell: `price` is the minimum the maker accepts
    Ask,
}

impl QuoteType {
    /// Get the opposite quote type
    pub fn opposite(&self) -> Self {
        match self {
            QuoteType::Bid => QuoteType::Ask,
            QuoteType::Ask => QuoteType::Bid,
        }
    }

    /// Wire tag used in the signed payload
    pub fn as_u8(&self) -> u8 {
        match self {
            QuoteType::Bid => 0,
            QuoteType::Ask => 1,
        }
    }
}

/// Asset type of the traded collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    /// Single-unit (non-fungible) items: every amount is exactly 1
    #[default]
    Erc721,
    /// Multi-unit (semi-fungible) items
    Erc1155,
}

impl AssetType {
    /// Wire tag used in the signed payload
    pub fn as_u8(&self) -> u8 {
        match self {
            AssetType::Erc721 => 0,
            AssetType::Erc1155 => 1,
        }
    }

    pub fn is_single_unit(&self) -> bool {
        matches!(self, AssetType::Erc721)
    }
}

/// Shape of a maker order's item and amount sequences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemLayout {
    /// `item_ids[i]` trades `amounts[i]`; both sequences have equal length
    Parallel,
    /// `item_ids = [min, max]` inclusive band, `amounts = [desired total]`
    Range,
}

/// Signed maker order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MakerOrder {
    pub quote_type: QuoteType,
    /// Bid or ask generation of the signer at signing time
    pub global_nonce: Nonce,
    /// Group id for batch cancellation
    pub subset_nonce: Nonce,
    /// Unique per signer; spent exactly once
    pub order_nonce: Nonce,
    pub strategy_id: StrategyId,
    pub asset_type: AssetType,
    pub collection: Address,
    pub currency: Address,
    pub signer: Address,
    /// Unix seconds, inclusive
    pub start_time: u64,
    /// Unix seconds, exclusive
    pub end_time: u64,
    /// `minPrice` for an ask, `maxPrice` for a bid
    pub price: U256,
    pub item_ids: Vec<U256>,
    pub amounts: Vec<U256>,
    /// Minimum share of the price the seller must net, in basis points
    pub min_net_ratio_bp: u16,
    pub additional_parameters: Bytes,
    pub affiliate_data: Bytes,
}

impl MakerOrder {
    pub fn is_bid(&self) -> bool {
        self.quote_type == QuoteType::Bid
    }

    pub fn is_ask(&self) -> bool {
        self.quote_type == QuoteType::Ask
    }

    /// Structural validation against the strategy's item layout.
    pub fn validate_structure(&self, layout: ItemLayout) -> Result<(), OrderError> {
        if self.min_net_ratio_bp > ONE_HUNDRED_PERCENT_BP {
            return Err(OrderError::Invalid {
                reason: "minimum net ratio above 100%",
            });
        }

        match layout {
            ItemLayout::Parallel => validate_item_amounts(&self.item_ids, &self.amounts),
            ItemLayout::Range => {
                if self.item_ids.len() != 2 || self.amounts.len() != 1 {
                    return Err(OrderError::LengthMismatch {
                        item_ids: self.item_ids.len(),
                        amounts: self.amounts.len(),
                    });
                }
                if self.amounts[0].is_zero() {
                    return Err(OrderError::ZeroAmount { index: 0 });
                }
                Ok(())
            }
        }
    }

    /// Check that `now` lies within `[start_time, end_time)`.
    pub fn check_time_range(&self, now: u64) -> Result<(), OrderError> {
        if now < self.start_time || now >= self.end_time {
            return Err(OrderError::OutsideOfTimeRange {
                now,
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }
        Ok(())
    }
}

/// Unsigned taker order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TakerOrder {
    /// Receives the items (taker bid) or the net proceeds (taker ask).
    /// The zero address means "the sender".
    pub recipient: Address,
    /// `maxPrice` for a taker bid, `minPrice` for a taker ask
    pub price: U256,
    pub item_ids: Vec<U256>,
    pub amounts: Vec<U256>,
    pub additional_parameters: Bytes,
}

impl TakerOrder {
    /// Resolve the effective recipient for a given sender.
    pub fn recipient_or(&self, sender: Address) -> Address {
        if self.recipient.is_zero() {
            sender
        } else {
            self.recipient
        }
    }
}

/// Shared parallel-sequence rule: non-empty, equal lengths, no zero amount.
pub fn validate_item_amounts(item_ids: &[U256], amounts: &[U256]) -> Result<(), OrderError> {
    if item_ids.is_empty() || amounts.is_empty() {
        return Err(OrderError::EmptyItems);
    }
    if item_ids.len() != amounts.len() {
        return Err(OrderError::LengthMismatch {
            item_ids: item_ids.len(),
            amounts: amounts.len(),
        });
    }
    if let Some(index) = amounts.iter().position(|a| a.is_zero()) {
        return Err(OrderError::ZeroAmount { index });
    }
    Ok(())
}

/// Single-unit assets trade exactly one unit per item id.
pub fn validate_unit_amounts(asset_type: AssetType, amounts: &[U256]) -> Result<(), OrderError> {
    if !asset_type.is_single_unit() {
        return Ok(());
    }
    match amounts.iter().position(|a| *a != U256::from(1u8)) {
        Some(index) => Err(OrderError::AmountNotOne { index }),
        None => Ok(()),
    }
}
