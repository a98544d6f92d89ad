//! Execution strategies and their registry
//!
//! A strategy decides, for one maker order and one taker order, whether the
//! trade is admissible and what exactly settles: price, items and amounts.
//! Strategies are resolved by id from the [`StrategyRegistry`] at match time.

pub mod floor;
pub mod item_ids_range;
pub mod standard;
pub mod usd_dynamic_ask;

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use types::errors::OrderError;
use types::ids::StrategyId;
use types::numeric::ONE_HUNDRED_PERCENT_BP;
use types::order::{AssetType, ItemLayout, MakerOrder, QuoteType, TakerOrder};
use types::trade::SettlementResult;

use crate::errors::{CallerError, ConfigError, SettlementError};
use crate::security::AccessControl;

/// Call context handed to a strategy by the matching engine. Only the
/// engine builds one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionContext {
    caller: Address,
    matching_engine: Address,
    /// unix seconds
    now: u64,
    max_oracle_latency: u64,
}

impl ExecutionContext {
    pub(crate) fn new(caller: Address, matching_engine: Address, now: u64, max_oracle_latency: u64) -> Self {
        Self {
            caller,
            matching_engine,
            now,
            max_oracle_latency,
        }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }

    /// The only caller strategies accept.
    pub fn matching_engine(&self) -> Address {
        self.matching_engine
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn max_oracle_latency(&self) -> u64 {
        self.max_oracle_latency
    }

    pub fn ensure_engine_caller(&self) -> Result<(), CallerError> {
        if self.caller != self.matching_engine {
            return Err(CallerError::WrongCaller);
        }
        Ok(())
    }
}

/// Result of a pre-flight check. Never an abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub error: Option<SettlementError>,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(error: impl Into<SettlementError>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

impl<E: Into<SettlementError>> From<Result<(), E>> for ValidationOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => ValidationOutcome::valid(),
            Err(e) => ValidationOutcome::invalid(e),
        }
    }
}

/// Whether single-unit assets must trade exactly one unit per item id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitAmountPolicy {
    #[default]
    ExactlyOneForSingleUnit,
    Unrestricted,
}

impl UnitAmountPolicy {
    pub fn check(&self, asset_type: AssetType, amounts: &[U256]) -> Result<(), OrderError> {
        match self {
            UnitAmountPolicy::ExactlyOneForSingleUnit => {
                types::order::validate_unit_amounts(asset_type, amounts)
            }
            UnitAmountPolicy::Unrestricted => Ok(()),
        }
    }

    pub fn requires_one(&self, asset_type: AssetType) -> bool {
        matches!(self, UnitAmountPolicy::ExactlyOneForSingleUnit) && asset_type.is_single_unit()
    }
}

/// Pluggable pricing and matching policy.
pub trait ExecutionStrategy: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Maker quote type this strategy serves; `None` serves both.
    fn maker_side(&self) -> Option<QuoteType> {
        None
    }

    fn item_layout(&self) -> ItemLayout {
        ItemLayout::Parallel
    }

    /// Pure pre-flight check of a maker order.
    fn validate(&self, maker: &MakerOrder) -> ValidationOutcome;

    /// Settlement terms for a maker/taker pair. Only the matching engine may
    /// call this.
    fn execute_with_taker(
        &self,
        ctx: &ExecutionContext,
        taker: &TakerOrder,
        maker: &MakerOrder,
    ) -> Result<SettlementResult, SettlementError>;
}

/// Reject a maker order of the wrong side for `strategy`.
pub(crate) fn check_maker_side(
    strategy: &dyn ExecutionStrategy,
    maker: &MakerOrder,
) -> Result<(), OrderError> {
    match strategy.maker_side() {
        Some(side) if side != maker.quote_type => Err(OrderError::QuoteTypeMismatch),
        _ => Ok(()),
    }
}

/// Fixed-price law: maker and taker prices must be equal.
///
/// A taker on the losing side of the maker's bound gets `BidTooLow`; any
/// other difference is `PriceMismatch`.
pub(crate) fn check_exact_price(maker: &MakerOrder, taker: &TakerOrder) -> Result<(), OrderError> {
    check_taker_bound(maker.quote_type, maker.price, taker)?;
    if taker.price != maker.price {
        return Err(OrderError::PriceMismatch);
    }
    Ok(())
}

/// The taker's bound must admit `price`: a taker bid's maximum must reach
/// it, a taker ask's minimum must not exceed it.
pub(crate) fn check_taker_bound(
    maker_side: QuoteType,
    price: U256,
    taker: &TakerOrder,
) -> Result<(), OrderError> {
    let admitted = match maker_side {
        QuoteType::Ask => taker.price >= price,
        QuoteType::Bid => taker.price <= price,
    };
    if !admitted {
        return Err(OrderError::BidTooLow);
    }
    Ok(())
}

/// One registered strategy.
#[derive(Clone)]
pub struct StrategyRecord {
    pub is_active: bool,
    pub has_royalties: bool,
    pub protocol_fee_bp: u16,
    pub max_protocol_fee_bp: u16,
    pub implementation: Arc<dyn ExecutionStrategy>,
}

impl fmt::Debug for StrategyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRecord")
            .field("name", &self.implementation.name())
            .field("is_active", &self.is_active)
            .field("has_royalties", &self.has_royalties)
            .field("protocol_fee_bp", &self.protocol_fee_bp)
            .field("max_protocol_fee_bp", &self.max_protocol_fee_bp)
            .finish()
    }
}

impl StrategyRecord {
    /// An active record.
    pub fn new(
        has_royalties: bool,
        protocol_fee_bp: u16,
        max_protocol_fee_bp: u16,
        implementation: Arc<dyn ExecutionStrategy>,
    ) -> Self {
        Self {
            is_active: true,
            has_royalties,
            protocol_fee_bp,
            max_protocol_fee_bp,
            implementation,
        }
    }
}

/// Catalog of strategies, indexed by [`StrategyId`].
#[derive(Debug, Clone)]
pub struct StrategyRegistry {
    access_control: AccessControl,
    protocol_fee_ceiling_bp: u16,
    strategies: Vec<StrategyRecord>,
}

impl StrategyRegistry {
    /// Create a registry holding the built-in standard strategy at id 0.
    pub fn new(
        owner: Address,
        protocol_fee_ceiling_bp: u16,
        standard_protocol_fee_bp: u16,
        standard_max_protocol_fee_bp: u16,
    ) -> Result<Self, ConfigError> {
        let ceiling = protocol_fee_ceiling_bp.min(ONE_HUNDRED_PERCENT_BP);
        check_fees(standard_protocol_fee_bp, standard_max_protocol_fee_bp, ceiling)?;
        Ok(Self {
            access_control: AccessControl::new(owner),
            protocol_fee_ceiling_bp: ceiling,
            strategies: vec![StrategyRecord::new(
                true,
                standard_protocol_fee_bp,
                standard_max_protocol_fee_bp,
                Arc::new(standard::StandardSale::default()),
            )],
        })
    }

    /// Register a strategy. Owner-only.
    pub fn add_strategy(
        &mut self,
        caller: Address,
        has_royalties: bool,
        protocol_fee_bp: u16,
        max_protocol_fee_bp: u16,
        implementation: Arc<dyn ExecutionStrategy>,
    ) -> Result<StrategyId, SettlementError> {
        self.access_control.ensure_owner(caller)?;
        check_fees(protocol_fee_bp, max_protocol_fee_bp, self.protocol_fee_ceiling_bp)?;

        let strategy_id = StrategyId::new(self.strategies.len() as u64);
        self.strategies.push(StrategyRecord::new(
            has_royalties,
            protocol_fee_bp,
            max_protocol_fee_bp,
            implementation,
        ));
        Ok(strategy_id)
    }

    /// Change fee, royalty eligibility and activity of a strategy. Owner-only.
    pub fn update_strategy(
        &mut self,
        caller: Address,
        strategy_id: StrategyId,
        has_royalties: bool,
        protocol_fee_bp: u16,
        is_active: bool,
    ) -> Result<(), SettlementError> {
        self.access_control.ensure_owner(caller)?;
        let ceiling = self.protocol_fee_ceiling_bp;
        let record = self
            .strategies
            .get_mut(strategy_id.as_index())
            .ok_or(ConfigError::StrategyNotFound { strategy_id })?;
        check_fees(protocol_fee_bp, record.max_protocol_fee_bp, ceiling)?;

        record.has_royalties = has_royalties;
        record.protocol_fee_bp = protocol_fee_bp;
        record.is_active = is_active;
        Ok(())
    }

    pub fn view_strategy(&self, strategy_id: StrategyId) -> Result<&StrategyRecord, ConfigError> {
        self.strategies
            .get(strategy_id.as_index())
            .ok_or(ConfigError::StrategyNotFound { strategy_id })
    }

    /// Resolve an active strategy for settlement.
    pub fn active_strategy(&self, strategy_id: StrategyId) -> Result<&StrategyRecord, OrderError> {
        match self.strategies.get(strategy_id.as_index()) {
            Some(record) if record.is_active => Ok(record),
            _ => Err(OrderError::StrategyNotActive { strategy_id }),
        }
    }

    /// Item layout of a strategy; unknown ids are treated as parallel.
    pub fn item_layout(&self, strategy_id: StrategyId) -> ItemLayout {
        self.strategies
            .get(strategy_id.as_index())
            .map_or(ItemLayout::Parallel, |r| r.implementation.item_layout())
    }

    pub(crate) fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<Address, CallerError> {
        self.access_control.transfer_ownership(caller, new_owner)
    }
}

fn check_fees(protocol_fee_bp: u16, max_protocol_fee_bp: u16, ceiling_bp: u16) -> Result<(), ConfigError> {
    if protocol_fee_bp > max_protocol_fee_bp || max_protocol_fee_bp > ceiling_bp {
        return Err(ConfigError::ProtocolFeeTooHigh {
            protocol_fee_bp,
            max_protocol_fee_bp,
            ceiling_bp,
        });
    }
    Ok(())
}
