//! Item-id range collection offers
//!
//! A maker bid names an inclusive id band `[min, max]` and a desired total
//! amount. The taker offers strictly ascending ids; the in-band ones are
//! summed and must add up to exactly the desired amount.

use alloy_primitives::U256;
use types::errors::OrderError;
use types::order::{validate_item_amounts, ItemLayout, MakerOrder, QuoteType, TakerOrder};
use types::trade::SettlementResult;

use super::{
    check_exact_price, check_maker_side, ExecutionContext, ExecutionStrategy, UnitAmountPolicy,
    ValidationOutcome,
};
use crate::errors::SettlementError;

#[derive(Debug, Clone, Default)]
pub struct ItemIdsRange {
    unit_amounts: UnitAmountPolicy,
}

impl ItemIdsRange {
    pub fn new(unit_amounts: UnitAmountPolicy) -> Self {
        Self { unit_amounts }
    }

    fn check_maker(&self, maker: &MakerOrder) -> Result<(), OrderError> {
        check_maker_side(self, maker)?;
        maker.validate_structure(ItemLayout::Range)?;
        if maker.item_ids[0] >= maker.item_ids[1] {
            return Err(OrderError::Invalid {
                reason: "item id range is empty",
            });
        }
        Ok(())
    }
}

impl ExecutionStrategy for ItemIdsRange {
    fn name(&self) -> &'static str {
        "item_ids_range"
    }

    fn maker_side(&self) -> Option<QuoteType> {
        Some(QuoteType::Bid)
    }

    fn item_layout(&self) -> ItemLayout {
        ItemLayout::Range
    }

    fn validate(&self, maker: &MakerOrder) -> ValidationOutcome {
        self.check_maker(maker).into()
    }

    fn execute_with_taker(
        &self,
        ctx: &ExecutionContext,
        taker: &TakerOrder,
        maker: &MakerOrder,
    ) -> Result<SettlementResult, SettlementError> {
        ctx.ensure_engine_caller()?;
        self.check_maker(maker)?;
        validate_item_amounts(&taker.item_ids, &taker.amounts)?;

        let (min_id, max_id) = (maker.item_ids[0], maker.item_ids[1]);
        let desired = maker.amounts[0];
        let one = U256::from(1u8);

        let mut item_ids = Vec::new();
        let mut amounts = Vec::new();
        let mut total = U256::ZERO;
        let mut last_id: Option<U256> = None;

        for (index, (&id, &amount)) in taker.item_ids.iter().zip(&taker.amounts).enumerate() {
            if last_id.is_some_and(|last| id <= last) {
                return Err(OrderError::DuplicateOrUnsortedIds { index }.into());
            }
            last_id = Some(id);

            if self.unit_amounts.requires_one(maker.asset_type) && amount != one {
                return Err(OrderError::AmountNotOne { index }.into());
            }

            // out-of-band ids are neither counted nor transferred
            if id < min_id || id > max_id {
                continue;
            }
            total = total.checked_add(amount).ok_or(OrderError::Invalid {
                reason: "offered amount overflows",
            })?;
            item_ids.push(id);
            amounts.push(amount);
        }

        if total != desired {
            return Err(OrderError::Invalid {
                reason: "offered amount differs from desired amount",
            }
            .into());
        }
        check_exact_price(maker, taker)?;

        Ok(SettlementResult::filled(maker.price, item_ids, amounts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use types::order::AssetType;

    fn ctx() -> ExecutionContext {
        ExecutionContext::new(Address::repeat_byte(0xee), Address::repeat_byte(0xee), 0, 0)
    }

    fn u(values: &[u64]) -> Vec<U256> {
        values.iter().map(|v| U256::from(*v)).collect()
    }

    fn bid(min: u64, max: u64, desired: u64) -> MakerOrder {
        MakerOrder {
            quote_type: QuoteType::Bid,
            asset_type: AssetType::Erc721,
            price: U256::from(500u64),
            item_ids: u(&[min, max]),
            amounts: u(&[desired]),
            ..Default::default()
        }
    }

    fn taker(ids: &[u64], amounts: &[u64]) -> TakerOrder {
        TakerOrder {
            price: U256::from(500u64),
            item_ids: u(ids),
            amounts: u(amounts),
            ..Default::default()
        }
    }

    #[test]
    fn test_in_band_offer_fills() {
        let result = ItemIdsRange::default()
            .execute_with_taker(&ctx(), &taker(&[5, 7, 9], &[1, 1, 1]), &bid(5, 10, 3))
            .unwrap();
        assert_eq!(result.item_ids, u(&[5, 7, 9]));
        assert_eq!(result.total_amount(), U256::from(3u64));
        assert_eq!(result.price, U256::from(500u64));
    }

    #[test]
    fn test_out_of_band_ids_are_ignored() {
        let result = ItemIdsRange::default()
            .execute_with_taker(&ctx(), &taker(&[1, 5, 6, 20], &[1, 1, 1, 1]), &bid(5, 10, 2))
            .unwrap();
        assert_eq!(result.item_ids, u(&[5, 6]));
        assert_eq!(result.amounts, u(&[1, 1]));
    }

    #[test]
    fn test_short_offer_rejected() {
        let result = ItemIdsRange::default().execute_with_taker(
            &ctx(),
            &taker(&[5, 6], &[1, 1]),
            &bid(5, 10, 3),
        );
        assert!(matches!(
            result,
            Err(SettlementError::Order(OrderError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_unsorted_or_duplicate_ids_rejected() {
        let strategy = ItemIdsRange::default();
        assert_eq!(
            strategy.execute_with_taker(&ctx(), &taker(&[6, 5], &[1, 1]), &bid(5, 10, 2)),
            Err(OrderError::DuplicateOrUnsortedIds { index: 1 }.into())
        );
        assert_eq!(
            strategy.execute_with_taker(&ctx(), &taker(&[6, 6], &[1, 1]), &bid(5, 10, 2)),
            Err(OrderError::DuplicateOrUnsortedIds { index: 1 }.into())
        );
    }

    #[test]
    fn test_single_unit_amounts() {
        assert_eq!(
            ItemIdsRange::default().execute_with_taker(&ctx(), &taker(&[5], &[2]), &bid(5, 10, 2)),
            Err(OrderError::AmountNotOne { index: 0 }.into())
        );

        let mut multi = bid(5, 10, 4);
        multi.asset_type = AssetType::Erc1155;
        let result = ItemIdsRange::default()
            .execute_with_taker(&ctx(), &taker(&[5, 8], &[3, 1]), &multi)
            .unwrap();
        assert_eq!(result.total_amount(), U256::from(4u64));
    }

    #[test]
    fn test_empty_range_invalid() {
        let outcome = ItemIdsRange::default().validate(&bid(10, 10, 1));
        assert!(!outcome.is_valid);
        assert!(ItemIdsRange::default().validate(&bid(1, 10, 1)).is_valid);
    }

    #[test]
    fn test_maker_ask_rejected() {
        let mut ask = bid(1, 10, 1);
        ask.quote_type = QuoteType::Ask;
        assert_eq!(
            ItemIdsRange::default().validate(&ask).error,
            Some(OrderError::QuoteTypeMismatch.into())
        );
    }

    #[test]
    fn test_taker_ask_above_bid_price() {
        let mut offer = taker(&[5], &[1]);
        offer.price = U256::from(501u64);
        assert_eq!(
            ItemIdsRange::default().execute_with_taker(&ctx(), &offer, &bid(5, 10, 1)),
            Err(OrderError::BidTooLow.into())
        );
    }
}
