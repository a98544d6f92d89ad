//! Identifier types for settlement entities
//!
//! Participants, collections and currencies are identified by 20-byte EVM
//! addresses. Nonces are full-width 256-bit words so they round-trip with the
//! signed EIP-712 payload unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use alloy_primitives::{Address, Bytes, B256, U256};

/// Replay-protection nonce (generation, order or subset).
pub type Nonce = U256;

/// Identifier of a registered execution strategy
///
/// Ids are allocated sequentially by the strategy registry. Id 0 is reserved
/// for the built-in standard sale strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyId(u64);

impl StrategyId {
    /// The built-in standard sale strategy.
    pub const STANDARD: StrategyId = StrategyId(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Index into the registry table.
    pub fn as_index(&self) -> usize {
        self.0 as usize
    }

    /// Whether this is the reserved standard sale id.
    pub fn is_standard(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for StrategyId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for StrategyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
