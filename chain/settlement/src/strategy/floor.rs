//! Floor-price strategies
//!
//! Price is the collection floor read from a [`PriceFeedRegistry`], adjusted
//! by a premium (maker asks) or a discount (maker bids) held in the first
//! word of the maker's strategy parameters. Single item, single unit.

use alloy_primitives::U256;
use types::errors::OrderError;
use types::numeric::{mul_bp, ONE_HUNDRED_PERCENT_BP};
use types::order::{validate_item_amounts, ItemLayout, MakerOrder, QuoteType, TakerOrder};
use types::params::decode_word;
use types::trade::SettlementResult;

use super::{check_maker_side, check_taker_bound, ExecutionContext, ExecutionStrategy, ValidationOutcome};
use crate::errors::SettlementError;
use crate::oracle::PriceFeedRegistry;

/// How the floor price is adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloorAdjustment {
    /// Floor plus a fixed amount, maker asks
    FixedPremium,
    /// Floor plus basis points of the floor, maker asks
    BasisPointsPremium,
    /// Floor minus a fixed amount, maker bids
    FixedDiscount,
    /// Floor minus basis points of the floor, maker bids
    BasisPointsDiscount,
}

impl FloorAdjustment {
    pub fn maker_side(&self) -> QuoteType {
        match self {
            FloorAdjustment::FixedPremium | FloorAdjustment::BasisPointsPremium => QuoteType::Ask,
            FloorAdjustment::FixedDiscount | FloorAdjustment::BasisPointsDiscount => QuoteType::Bid,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FloorFromChainlink {
    adjustment: FloorAdjustment,
    feeds: PriceFeedRegistry,
}

impl FloorFromChainlink {
    pub fn new(adjustment: FloorAdjustment, feeds: PriceFeedRegistry) -> Self {
        Self { adjustment, feeds }
    }

    /// Decode the adjustment word, rejecting out-of-range basis points.
    fn adjustment_word(&self, maker: &MakerOrder) -> Result<U256, OrderError> {
        let word = decode_word(&maker.additional_parameters, 0)?;
        let max_bp = U256::from(ONE_HUNDRED_PERCENT_BP);
        match self.adjustment {
            FloorAdjustment::BasisPointsPremium if word > max_bp => Err(OrderError::Invalid {
                reason: "premium above 100%",
            }),
            FloorAdjustment::BasisPointsDiscount if word >= max_bp => Err(OrderError::Invalid {
                reason: "discount of 100% or more",
            }),
            _ => Ok(word),
        }
    }

    fn check_maker(&self, maker: &MakerOrder) -> Result<U256, OrderError> {
        check_maker_side(self, maker)?;
        maker.validate_structure(ItemLayout::Parallel)?;
        check_single_unit(&maker.item_ids, &maker.amounts)?;
        self.adjustment_word(maker)
    }

    /// Adjusted price for a fresh `floor`.
    fn adjusted_price(&self, floor: U256, word: U256, maker: &MakerOrder) -> Result<U256, OrderError> {
        let overflow = OrderError::Invalid {
            reason: "adjusted price overflows",
        };
        let price = match self.adjustment {
            FloorAdjustment::FixedPremium => floor.checked_add(word).ok_or(overflow)?.max(maker.price),
            FloorAdjustment::BasisPointsPremium => floor
                .checked_add(mul_bp(floor, bp(word)))
                .ok_or(overflow)?
                .max(maker.price),
            FloorAdjustment::FixedDiscount => {
                if word >= floor {
                    return Err(OrderError::Invalid {
                        reason: "discount not below floor price",
                    });
                }
                (floor - word).min(maker.price)
            }
            FloorAdjustment::BasisPointsDiscount => (floor - mul_bp(floor, bp(word))).min(maker.price),
        };
        Ok(price)
    }
}

// word is bounded by adjustment_word
fn bp(word: U256) -> u16 {
    u16::try_from(word).unwrap_or(ONE_HUNDRED_PERCENT_BP)
}

fn check_single_unit(item_ids: &[U256], amounts: &[U256]) -> Result<(), OrderError> {
    validate_item_amounts(item_ids, amounts)?;
    if item_ids.len() != 1 || amounts.len() != 1 {
        return Err(OrderError::LengthMismatch {
            item_ids: item_ids.len(),
            amounts: amounts.len(),
        });
    }
    if amounts[0] != U256::from(1u8) {
        return Err(OrderError::AmountNotOne { index: 0 });
    }
    Ok(())
}

impl ExecutionStrategy for FloorFromChainlink {
    fn name(&self) -> &'static str {
        match self.adjustment {
            FloorAdjustment::FixedPremium => "floor_fixed_premium",
            FloorAdjustment::BasisPointsPremium => "floor_basis_points_premium",
            FloorAdjustment::FixedDiscount => "floor_fixed_discount",
            FloorAdjustment::BasisPointsDiscount => "floor_basis_points_discount",
        }
    }

    fn maker_side(&self) -> Option<QuoteType> {
        Some(self.adjustment.maker_side())
    }

    fn validate(&self, maker: &MakerOrder) -> ValidationOutcome {
        self.check_maker(maker).map(|_| ()).into()
    }

    fn execute_with_taker(
        &self,
        ctx: &ExecutionContext,
        taker: &TakerOrder,
        maker: &MakerOrder,
    ) -> Result<SettlementResult, SettlementError> {
        ctx.ensure_engine_caller()?;
        let word = self.check_maker(maker)?;

        check_single_unit(&taker.item_ids, &taker.amounts)?;
        if taker.item_ids[0] != maker.item_ids[0] {
            return Err(OrderError::ItemsMismatch.into());
        }

        let floor = self
            .feeds
            .floor_price(maker.collection, ctx.now(), ctx.max_oracle_latency())?;
        let price = self.adjusted_price(floor, word, maker)?;
        check_taker_bound(maker.quote_type, price, taker)?;

        Ok(SettlementResult::filled(
            price,
            maker.item_ids.clone(),
            maker.amounts.clone(),
        ))
    }
}
