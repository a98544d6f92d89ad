//! Exchange events
//!
//! Events are immutable records emitted by state-changing operations, one
//! per successful call, in the order the operations happened.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use types::fee::FeeSplit;
use types::ids::{Nonce, StrategyId};
use uuid::Uuid;

/// A settled trade, from either execution path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub settlement_id: Uuid,
    pub order_hash: B256,
    pub order_nonce: Nonce,
    pub strategy_id: StrategyId,
    pub maker: Address,
    pub taker: Address,
    pub currency: Address,
    pub collection: Address,
    pub item_ids: Vec<U256>,
    pub amounts: Vec<U256>,
    pub fees: FeeSplit,
    pub affiliate_data: Bytes,
    /// Opaque payload submitted with the taker order
    pub auxiliary_data: Bytes,
}

/// Order nonces cancelled by their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNoncesCancelled {
    pub user: Address,
    pub order_nonces: Vec<Nonce>,
}

/// Subset nonces cancelled by their owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubsetNoncesCancelled {
    pub user: Address,
    pub subset_nonces: Vec<Nonce>,
}

/// New bid/ask generations after a bump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBidAskNonces {
    pub user: Address,
    pub bid_nonce: Nonce,
    pub ask_nonce: Nonce,
}

/// Strategy registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStrategy {
    pub strategy_id: StrategyId,
    pub name: String,
    pub has_royalties: bool,
    pub protocol_fee_bp: u16,
    pub max_protocol_fee_bp: u16,
}

/// Strategy parameters changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyUpdated {
    pub strategy_id: StrategyId,
    pub is_active: bool,
    pub has_royalties: bool,
    pub protocol_fee_bp: u16,
}

/// Enum wrapper for all exchange events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeEvent {
    /// A taker bought from a maker ask
    TakerBid(Settlement),
    /// A taker sold into a maker bid
    TakerAsk(Settlement),
    OrderNoncesCancelled(OrderNoncesCancelled),
    SubsetNoncesCancelled(SubsetNoncesCancelled),
    NewBidAskNonces(NewBidAskNonces),
    NewStrategy(NewStrategy),
    StrategyUpdated(StrategyUpdated),
    CurrencyStatusUpdated { currency: Address, is_allowed: bool },
    NewMaxOracleLatency { max_latency: u64 },
    NewRoyaltyRegistry { enabled: bool },
    OwnershipTransferred { previous_owner: Address, new_owner: Address },
    ContractSignerUpdated { address: Address, is_contract: bool },
}

impl ExchangeEvent {
    /// The settlement carried by a `TakerBid`/`TakerAsk` event.
    pub fn settlement(&self) -> Option<&Settlement> {
        match self {
            ExchangeEvent::TakerBid(s) | ExchangeEvent::TakerAsk(s) => Some(s),
            _ => None,
        }
    }
}
