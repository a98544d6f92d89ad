//! Standard sale: fixed price, fixed items
//!
//! The taker must take exactly the maker's items and amounts at exactly the
//! maker's price. Serves both maker bids and maker asks; bundles are allowed.

use types::errors::OrderError;
use types::order::{ItemLayout, MakerOrder, TakerOrder};
use types::trade::SettlementResult;

use super::{check_exact_price, ExecutionContext, ExecutionStrategy, UnitAmountPolicy, ValidationOutcome};
use crate::errors::SettlementError;

#[derive(Debug, Clone, Default)]
pub struct StandardSale {
    unit_amounts: UnitAmountPolicy,
}

impl StandardSale {
    pub fn new(unit_amounts: UnitAmountPolicy) -> Self {
        Self { unit_amounts }
    }

    fn check_maker(&self, maker: &MakerOrder) -> Result<(), OrderError> {
        maker.validate_structure(ItemLayout::Parallel)?;
        self.unit_amounts.check(maker.asset_type, &maker.amounts)
    }
}

impl ExecutionStrategy for StandardSale {
    fn name(&self) -> &'static str {
        "standard_sale"
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

        if taker.item_ids != maker.item_ids || taker.amounts != maker.amounts {
            return Err(OrderError::ItemsMismatch.into());
        }
        check_exact_price(maker, taker)?;

        Ok(SettlementResult::filled(
            maker.price,
            maker.item_ids.clone(),
            maker.amounts.clone(),
        ))
    }
}
