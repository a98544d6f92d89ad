//! Settlement error types
//!
//! Error taxonomy for signature, nonce, oracle, caller, configuration and
//! transfer failures. Structural order failures come from
//! [`types::errors::OrderError`]. Any of them aborts a settlement attempt
//! with no state change.

use alloy_primitives::{Address, U256};
use thiserror::Error;
use types::errors::OrderError;
use types::ids::StrategyId;

/// Signature authentication errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Signature length invalid: {length} bytes")]
    LengthInvalid { length: usize },

    #[error("Signature parameter v invalid: {v}")]
    VInvalid { v: u8 },

    #[error("Signature parameter s invalid: above half curve order")]
    SInvalid,

    #[error("Null signer address")]
    NullSigner,

    #[error("Signature does not match signer {signer}")]
    Mismatch { signer: Address },
}

/// Replay-protection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NonceError {
    #[error("Order nonce {nonce} already executed or cancelled")]
    AlreadyExecutedOrCancelled { nonce: U256 },

    #[error("Generation mismatch: order {order}, current {current}")]
    GenerationMismatch { order: U256, current: U256 },

    #[error("Subset nonce {nonce} cancelled")]
    SubsetCancelled { nonce: U256 },

    #[error("Empty batch: no nonces to cancel")]
    EmptyBatch,

    #[error("Nothing to increment")]
    NothingToIncrement,
}

/// Price oracle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Oracle price stale: updated at {updated_at}, now {now}, max latency {max_latency}s")]
    PriceStale {
        updated_at: u64,
        now: u64,
        max_latency: u64,
    },

    #[error("Oracle price not positive: {answer}")]
    PriceNonPositive { answer: i128 },

    #[error("No price feed for {collection}")]
    FeedUnavailable { collection: Address },
}

/// Caller authorization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallerError {
    #[error("Wrong caller: strategies execute only through the matching engine")]
    WrongCaller,

    #[error("Unauthorized: caller is not the owner")]
    Unauthorized,
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Strategy protocol fee too high: fee {protocol_fee_bp}bp, max {max_protocol_fee_bp}bp, ceiling {ceiling_bp}bp")]
    ProtocolFeeTooHigh {
        protocol_fee_bp: u16,
        max_protocol_fee_bp: u16,
        ceiling_bp: u16,
    },

    #[error("Strategy not found: {strategy_id}")]
    StrategyNotFound { strategy_id: StrategyId },

    #[error("Oracle latency too high: {latency}s, maximum {maximum}s")]
    LatencyTooHigh { latency: u64, maximum: u64 },

    #[error("Protocol fee recipient is the zero address")]
    ZeroFeeRecipient,

    #[error("Price feed decimals invalid: {decimals}")]
    FeedDecimalsInvalid { decimals: u8 },

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

/// Errors raised by the transfer collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient {currency} balance for {owner}: required {required}, available {available}")]
    InsufficientBalance {
        owner: Address,
        currency: Address,
        required: U256,
        available: U256,
    },

    #[error("Item {item_id} of {collection} not held by {owner} in amount {amount}")]
    ItemNotHeld {
        owner: Address,
        collection: Address,
        item_id: U256,
        amount: U256,
    },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,

    #[error("Transfer rejected: {reason}")]
    Rejected { reason: String },
}

/// Top-level settlement error
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Nonce invalid: {0}")]
    Nonce(#[from] NonceError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Caller error: {0}")]
    Caller(#[from] CallerError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl SettlementError {
    /// Composite "nonce invalid" class seen by callers.
    pub fn is_nonce_invalid(&self) -> bool {
        matches!(self, SettlementError::Nonce(_))
    }
}
