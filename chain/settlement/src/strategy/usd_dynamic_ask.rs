//! Asks priced in USD, settled in the exchange currency
//!
//! The maker names a desired price in 18-decimal USD. At execution the
//! figure is converted with the latest rate of the currency/USD feed and
//! floored at the maker's minimum price. The feed prices one asset, so the
//! strategy only accepts orders settling in that asset's currencies.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use types::errors::OrderError;
use types::order::{validate_item_amounts, ItemLayout, MakerOrder, QuoteType, TakerOrder};
use types::params::decode_word;
use types::trade::SettlementResult;

use super::{check_maker_side, check_taker_bound, ExecutionContext, ExecutionStrategy, ValidationOutcome};
use crate::errors::SettlementError;
use crate::oracle::{read_price, PriceFeed};

#[derive(Clone)]
pub struct UsdDynamicAsk {
    feed: Arc<dyn PriceFeed>,
    /// Currencies the feed's asset settles in (native and wrapped)
    currencies: HashSet<Address>,
}

impl fmt::Debug for UsdDynamicAsk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsdDynamicAsk")
            .field("feed_decimals", &self.feed.decimals())
            .field("currencies", &self.currencies)
            .finish()
    }
}

impl UsdDynamicAsk {
    pub fn new(feed: Arc<dyn PriceFeed>, currencies: impl IntoIterator<Item = Address>) -> Self {
        Self {
            feed,
            currencies: currencies.into_iter().collect(),
        }
    }

    fn check_maker(&self, maker: &MakerOrder) -> Result<U256, OrderError> {
        check_maker_side(self, maker)?;
        if !self.currencies.contains(&maker.currency) {
            return Err(OrderError::CurrencyNotSupported {
                currency: maker.currency,
            });
        }
        maker.validate_structure(ItemLayout::Parallel)?;
        decode_word(&maker.additional_parameters, 0)
    }

    /// `desired_usd * 10^decimals / answer`
    fn convert(&self, desired_usd: U256, answer: U256) -> Result<U256, OrderError> {
        let scale = U256::from(10u8)
            .checked_pow(U256::from(self.feed.decimals()))
            .ok_or(OrderError::Invalid {
                reason: "feed decimals out of range",
            })?;
        let scaled = desired_usd.checked_mul(scale).ok_or(OrderError::Invalid {
            reason: "desired price overflows",
        })?;
        Ok(scaled / answer)
    }
}

impl ExecutionStrategy for UsdDynamicAsk {
    fn name(&self) -> &'static str {
        "usd_dynamic_ask"
    }

    fn maker_side(&self) -> Option<QuoteType> {
        Some(QuoteType::Ask)
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
        let desired_usd = self.check_maker(maker)?;

        validate_item_amounts(&taker.item_ids, &taker.amounts)?;
        if taker.item_ids != maker.item_ids || taker.amounts != maker.amounts {
            return Err(OrderError::ItemsMismatch.into());
        }

        let answer = read_price(self.feed.as_ref(), ctx.now(), ctx.max_oracle_latency())?;
        let price = self.convert(desired_usd, answer)?.max(maker.price);
        check_taker_bound(QuoteType::Ask, price, taker)?;

        Ok(SettlementResult::filled(
            price,
            maker.item_ids.clone(),
            maker.amounts.clone(),
        ))
    }
}
