//! Price oracle access
//!
//! Feeds expose their latest round and their decimals. Reads are checked
//! against the current call's timestamp: an answer older than the configured
//! maximum latency is stale, and a non-positive answer is unusable.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::errors::{CallerError, ConfigError, OracleError, SettlementError};
use crate::security::AccessControl;

/// Decimals every floor-price feed must report.
pub const FLOOR_FEED_DECIMALS: u8 = 18;

/// Latest round reported by a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundData {
    pub answer: i128,
    pub updated_at: u64,
}

/// External price feed.
pub trait PriceFeed: Send + Sync {
    fn latest_round(&self) -> RoundData;
    fn decimals(&self) -> u8;
}

/// Feed reporting a fixed round, for manual pricing and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPriceFeed {
    pub round: RoundData,
    pub decimals: u8,
}

impl FixedPriceFeed {
    pub fn new(answer: i128, updated_at: u64, decimals: u8) -> Self {
        Self {
            round: RoundData { answer, updated_at },
            decimals,
        }
    }
}

impl PriceFeed for FixedPriceFeed {
    fn latest_round(&self) -> RoundData {
        self.round
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Read a fresh, positive answer from `feed`.
pub fn read_price(feed: &dyn PriceFeed, now: u64, max_latency: u64) -> Result<U256, OracleError> {
    let round = feed.latest_round();
    if now.saturating_sub(round.updated_at) > max_latency {
        return Err(OracleError::PriceStale {
            updated_at: round.updated_at,
            now,
            max_latency,
        });
    }
    if round.answer <= 0 {
        return Err(OracleError::PriceNonPositive {
            answer: round.answer,
        });
    }
    debug!(answer = round.answer, updated_at = round.updated_at, "Oracle answer read");
    Ok(U256::from(round.answer as u128))
}

/// Floor-price feeds keyed by collection.
///
/// Shared between the strategies that read it and the owner who maintains
/// it; updates take effect for every later settlement.
#[derive(Clone)]
pub struct PriceFeedRegistry {
    inner: Arc<RwLock<RegistryInner>>,
}

struct RegistryInner {
    access_control: AccessControl,
    feeds: HashMap<Address, Arc<dyn PriceFeed>>,
}

impl fmt::Debug for PriceFeedRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("PriceFeedRegistry")
            .field("owner", &inner.access_control.owner())
            .field("collections", &inner.feeds.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PriceFeedRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                access_control: AccessControl::new(owner),
                feeds: HashMap::new(),
            })),
        }
    }

    /// Set the floor-price feed of `collection`. Owner-only; the feed must
    /// report 18 decimals.
    pub fn set_feed(
        &self,
        caller: Address,
        collection: Address,
        feed: Arc<dyn PriceFeed>,
    ) -> Result<(), SettlementError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.access_control.ensure_owner(caller)?;
        let decimals = feed.decimals();
        if decimals != FLOOR_FEED_DECIMALS {
            return Err(ConfigError::FeedDecimalsInvalid { decimals }.into());
        }
        inner.feeds.insert(collection, feed);
        Ok(())
    }

    /// Remove the feed of `collection`. Owner-only.
    pub fn remove_feed(&self, caller: Address, collection: Address) -> Result<(), CallerError> {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        inner.access_control.ensure_owner(caller)?;
        inner.feeds.remove(&collection);
        Ok(())
    }

    /// Fresh floor price of `collection`.
    pub fn floor_price(
        &self,
        collection: Address,
        now: u64,
        max_latency: u64,
    ) -> Result<U256, OracleError> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        let feed = inner
            .feeds
            .get(&collection)
            .ok_or(OracleError::FeedUnavailable { collection })?;
        read_price(feed.as_ref(), now, max_latency)
    }
}
