//! Replay protection
//!
//! Per-user state, created lazily:
//! - bid and ask generation counters; orders signed under an older
//!   generation are invalid once the user bumps past it
//! - order nonces flagged executed-or-cancelled (write-once)
//! - cancelled subset nonces (write-once)
//!
//! Users mutate only their own state. The matching engine is the only other
//! writer, and only to flag an order nonce as executed.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use tracing::debug;
use types::ids::Nonce;
use types::order::{MakerOrder, QuoteType};

use crate::errors::NonceError;
use crate::events::{ExchangeEvent, NewBidAskNonces, OrderNoncesCancelled, SubsetNoncesCancelled};

/// Replay-protection state of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserNonceState {
    pub bid_nonce: Nonce,
    pub ask_nonce: Nonce,
    executed_or_cancelled: HashSet<Nonce>,
    cancelled_subsets: HashSet<Nonce>,
}

impl UserNonceState {
    /// Current generation for one side.
    pub fn generation(&self, quote_type: QuoteType) -> Nonce {
        match quote_type {
            QuoteType::Bid => self.bid_nonce,
            QuoteType::Ask => self.ask_nonce,
        }
    }
}

/// Registry of every user's replay-protection state.
#[derive(Debug, Clone, Default)]
pub struct NonceRegistry {
    users: HashMap<Address, UserNonceState>,
}

impl NonceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel order nonces of `caller`. Already-flagged nonces are a no-op.
    pub fn cancel_order_nonces(
        &mut self,
        caller: Address,
        nonces: &[Nonce],
    ) -> Result<ExchangeEvent, NonceError> {
        if nonces.is_empty() {
            return Err(NonceError::EmptyBatch);
        }
        let state = self.users.entry(caller).or_default();
        for nonce in nonces {
            state.executed_or_cancelled.insert(*nonce);
        }
        debug!(user = %caller, count = nonces.len(), "Order nonces cancelled");
        Ok(ExchangeEvent::OrderNoncesCancelled(OrderNoncesCancelled {
            user: caller,
            order_nonces: nonces.to_vec(),
        }))
    }

    /// Cancel subset nonces of `caller`. Already-cancelled ids are a no-op.
    pub fn cancel_subset_nonces(
        &mut self,
        caller: Address,
        nonces: &[Nonce],
    ) -> Result<ExchangeEvent, NonceError> {
        if nonces.is_empty() {
            return Err(NonceError::EmptyBatch);
        }
        let state = self.users.entry(caller).or_default();
        for nonce in nonces {
            state.cancelled_subsets.insert(*nonce);
        }
        debug!(user = %caller, count = nonces.len(), "Subset nonces cancelled");
        Ok(ExchangeEvent::SubsetNoncesCancelled(SubsetNoncesCancelled {
            user: caller,
            subset_nonces: nonces.to_vec(),
        }))
    }

    /// Advance the bid and/or ask generation of `caller` by one.
    pub fn bump_generations(
        &mut self,
        caller: Address,
        bid: bool,
        ask: bool,
    ) -> Result<ExchangeEvent, NonceError> {
        if !bid && !ask {
            return Err(NonceError::NothingToIncrement);
        }
        let state = self.users.entry(caller).or_default();
        if bid {
            state.bid_nonce = state.bid_nonce.wrapping_add(U256::from(1u8));
        }
        if ask {
            state.ask_nonce = state.ask_nonce.wrapping_add(U256::from(1u8));
        }
        debug!(user = %caller, bid_nonce = %state.bid_nonce, ask_nonce = %state.ask_nonce, "Generations bumped");
        Ok(ExchangeEvent::NewBidAskNonces(NewBidAskNonces {
            user: caller,
            bid_nonce: state.bid_nonce,
            ask_nonce: state.ask_nonce,
        }))
    }

    /// Current `(bid, ask)` generations of `user`.
    pub fn view_generations(&self, user: Address) -> (Nonce, Nonce) {
        self.users
            .get(&user)
            .map(|s| (s.bid_nonce, s.ask_nonce))
            .unwrap_or((U256::ZERO, U256::ZERO))
    }

    pub fn is_order_nonce_spent(&self, user: Address, nonce: Nonce) -> bool {
        self.users
            .get(&user)
            .map_or(false, |s| s.executed_or_cancelled.contains(&nonce))
    }

    pub fn is_subset_cancelled(&self, user: Address, nonce: Nonce) -> bool {
        self.users
            .get(&user)
            .map_or(false, |s| s.cancelled_subsets.contains(&nonce))
    }

    /// Check every replay condition a maker order must satisfy.
    pub fn check_order(&self, order: &MakerOrder) -> Result<(), NonceError> {
        let default_state = UserNonceState::default();
        let state = self.users.get(&order.signer).unwrap_or(&default_state);

        let current = state.generation(order.quote_type);
        if order.global_nonce != current {
            return Err(NonceError::GenerationMismatch {
                order: order.global_nonce,
                current,
            });
        }
        if state.executed_or_cancelled.contains(&order.order_nonce) {
            return Err(NonceError::AlreadyExecutedOrCancelled {
                nonce: order.order_nonce,
            });
        }
        if state.cancelled_subsets.contains(&order.subset_nonce) {
            return Err(NonceError::SubsetCancelled {
                nonce: order.subset_nonce,
            });
        }
        Ok(())
    }

    /// Flag an order nonce as executed. Returns `false` if it already was.
    pub(crate) fn mark_executed(&mut self, user: Address, nonce: Nonce) -> bool {
        self.users
            .entry(user)
            .or_default()
            .executed_or_cancelled
            .insert(nonce)
    }

    /// Undo a flag set by [`mark_executed`](Self::mark_executed) within the
    /// same aborted settlement.
    pub(crate) fn rollback_executed(&mut self, user: Address, nonce: Nonce) {
        if let Some(state) = self.users.get_mut(&user) {
            state.executed_or_cancelled.remove(&nonce);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn order(quote_type: QuoteType, global: u64, order_nonce: u64, subset: u64) -> MakerOrder {
        MakerOrder {
            quote_type,
            signer: user(),
            global_nonce: U256::from(global),
            order_nonce: U256::from(order_nonce),
            subset_nonce: U256::from(subset),
            ..Default::default()
        }
    }

    #[test]
    fn test_fresh_user_accepts_generation_zero() {
        let registry = NonceRegistry::new();
        assert_eq!(registry.view_generations(user()), (U256::ZERO, U256::ZERO));
        assert!(registry.check_order(&order(QuoteType::Bid, 0, 1, 0)).is_ok());
    }

    #[test]
    fn test_cancel_empty_batch_rejected() {
        let mut registry = NonceRegistry::new();
        assert_eq!(
            registry.cancel_order_nonces(user(), &[]),
            Err(NonceError::EmptyBatch)
        );
        assert_eq!(
            registry.cancel_subset_nonces(user(), &[]),
            Err(NonceError::EmptyBatch)
        );
    }

    #[test]
    fn test_cancel_order_nonce_is_idempotent() {
        let mut registry = NonceRegistry::new();
        let nonces = [U256::from(5u64)];
        registry.cancel_order_nonces(user(), &nonces).unwrap();
        let event = registry.cancel_order_nonces(user(), &nonces).unwrap();
        assert!(matches!(event, ExchangeEvent::OrderNoncesCancelled(_)));
        assert!(registry.is_order_nonce_spent(user(), U256::from(5u64)));
        assert_eq!(
            registry.check_order(&order(QuoteType::Ask, 0, 5, 0)),
            Err(NonceError::AlreadyExecutedOrCancelled {
                nonce: U256::from(5u64)
            })
        );
    }

    #[test]
    fn test_cancel_subset() {
        let mut registry = NonceRegistry::new();
        registry
            .cancel_subset_nonces(user(), &[U256::from(9u64)])
            .unwrap();
        assert!(registry.is_subset_cancelled(user(), U256::from(9u64)));
        assert_eq!(
            registry.check_order(&order(QuoteType::Ask, 0, 1, 9)),
            Err(NonceError::SubsetCancelled {
                nonce: U256::from(9u64)
            })
        );
        assert!(registry.check_order(&order(QuoteType::Ask, 0, 1, 8)).is_ok());
    }

    #[test]
    fn test_bump_nothing_rejected() {
        let mut registry = NonceRegistry::new();
        assert_eq!(
            registry.bump_generations(user(), false, false),
            Err(NonceError::NothingToIncrement)
        );
    }

    #[test]
    fn test_bump_bid_invalidates_only_bids() {
        let mut registry = NonceRegistry::new();
        registry.bump_generations(user(), true, false).unwrap();
        assert_eq!(registry.view_generations(user()), (U256::from(1u64), U256::ZERO));

        assert_eq!(
            registry.check_order(&order(QuoteType::Bid, 0, 1, 0)),
            Err(NonceError::GenerationMismatch {
                order: U256::ZERO,
                current: U256::from(1u64)
            })
        );
        assert!(registry.check_order(&order(QuoteType::Bid, 1, 1, 0)).is_ok());
        assert!(registry.check_order(&order(QuoteType::Ask, 0, 1, 0)).is_ok());
    }

    #[test]
    fn test_bump_both() {
        let mut registry = NonceRegistry::new();
        let event = registry.bump_generations(user(), true, true).unwrap();
        match event {
            ExchangeEvent::NewBidAskNonces(e) => {
                assert_eq!(e.bid_nonce, U256::from(1u64));
                assert_eq!(e.ask_nonce, U256::from(1u64));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_mark_executed_and_rollback() {
        let mut registry = NonceRegistry::new();
        assert!(registry.mark_executed(user(), U256::from(3u64)));
        assert!(!registry.mark_executed(user(), U256::from(3u64)));
        registry.rollback_executed(user(), U256::from(3u64));
        assert!(!registry.is_order_nonce_spent(user(), U256::from(3u64)));
    }

    #[test]
    fn test_users_are_isolated() {
        let mut registry = NonceRegistry::new();
        registry
            .cancel_order_nonces(user(), &[U256::from(1u64)])
            .unwrap();
        assert!(!registry.is_order_nonce_spent(Address::repeat_byte(0x0b), U256::from(1u64)));
    }
}
