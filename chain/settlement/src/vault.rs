//! Vault: in-memory custody of currency balances and item holdings
//!
//! The matching engine moves value through the [`TransferManager`] seam. A
//! [`TransferBatch`] carries everything one settlement moves:
//! - one item leg (maker to taker, or taker to maker)
//! - up to three currency legs (protocol fee, royalty, net proceeds)
//!
//! The vault applies a batch atomically: legs are staged on a copy of the
//! books and committed only when every leg succeeds.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use types::order::AssetType;

use crate::errors::TransferError;

/// One currency movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// The item movement of a settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTransfer {
    pub asset_type: AssetType,
    pub collection: Address,
    pub from: Address,
    pub to: Address,
    pub item_ids: Vec<U256>,
    pub amounts: Vec<U256>,
}

/// Everything a single settlement moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferBatch {
    /// Settlement currency; the zero address is the native currency
    pub currency: Address,
    pub payments: Vec<CurrencyTransfer>,
    pub items: ItemTransfer,
}

/// Executes the value movements of a settlement.
///
/// Implementations must apply a batch all-or-nothing: on error, no leg of
/// the batch may remain applied.
pub trait TransferManager {
    fn settle(&mut self, batch: &TransferBatch) -> Result<(), TransferError>;
}

#[derive(Debug, Clone, Default)]
struct Books {
    /// (owner, currency) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (collection, item id, owner) -> units held
    holdings: HashMap<(Address, U256, Address), U256>,
}

impl Books {
    fn safe_credit(&mut self, owner: Address, currency: Address, amount: U256) -> Result<(), TransferError> {
        let current = self.balances.entry((owner, currency)).or_default();
        *current = current.checked_add(amount).ok_or(TransferError::Overflow)?;
        Ok(())
    }

    fn safe_debit(&mut self, owner: Address, currency: Address, amount: U256) -> Result<(), TransferError> {
        let available = self.balances.get(&(owner, currency)).copied().unwrap_or_default();
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                owner,
                currency,
                required: amount,
                available,
            });
        }
        self.balances.insert((owner, currency), available - amount);
        Ok(())
    }

    fn move_item(
        &mut self,
        collection: Address,
        item_id: U256,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        let held = self
            .holdings
            .get(&(collection, item_id, from))
            .copied()
            .unwrap_or_default();
        if held < amount {
            return Err(TransferError::ItemNotHeld {
                owner: from,
                collection,
                item_id,
                amount,
            });
        }
        self.holdings.insert((collection, item_id, from), held - amount);

        let target = self.holdings.entry((collection, item_id, to)).or_default();
        *target = target.checked_add(amount).ok_or(TransferError::Overflow)?;
        Ok(())
    }
}

/// In-memory custody backing settlements.
#[derive(Debug, Clone, Default)]
pub struct Vault {
    books: Books,
    /// Addresses that refuse incoming transfers
    refusing: HashSet<Address>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `currency` to `owner`.
    pub fn deposit_currency(&mut self, owner: Address, currency: Address, amount: U256) -> Result<(), TransferError> {
        self.books.safe_credit(owner, currency, amount)
    }

    /// Give `owner` `amount` units of `item_id`.
    pub fn mint_item(
        &mut self,
        collection: Address,
        item_id: U256,
        owner: Address,
        amount: U256,
    ) -> Result<(), TransferError> {
        let held = self.books.holdings.entry((collection, item_id, owner)).or_default();
        *held = held.checked_add(amount).ok_or(TransferError::Overflow)?;
        Ok(())
    }

    pub fn balance_of(&self, owner: Address, currency: Address) -> U256 {
        self.books
            .balances
            .get(&(owner, currency))
            .copied()
            .unwrap_or_default()
    }

    pub fn item_balance(&self, collection: Address, item_id: U256, owner: Address) -> U256 {
        self.books
            .holdings
            .get(&(collection, item_id, owner))
            .copied()
            .unwrap_or_default()
    }

    /// Make `recipient` refuse every incoming leg.
    pub fn refuse_transfers_to(&mut self, recipient: Address) {
        self.refusing.insert(recipient);
    }

    fn check_recipient(&self, to: Address) -> Result<(), TransferError> {
        if to.is_zero() {
            return Err(TransferError::Rejected {
                reason: "transfer to the zero address".to_string(),
            });
        }
        if self.refusing.contains(&to) {
            return Err(TransferError::Rejected {
                reason: format!("recipient {to} refuses transfers"),
            });
        }
        Ok(())
    }
}

impl TransferManager for Vault {
    fn settle(&mut self, batch: &TransferBatch) -> Result<(), TransferError> {
        let mut staged = self.books.clone();

        let items = &batch.items;
        if items.item_ids.len() != items.amounts.len() {
            return Err(TransferError::Rejected {
                reason: "item and amount counts differ".to_string(),
            });
        }
        self.check_recipient(items.to)?;
        for (item_id, amount) in items.item_ids.iter().zip(&items.amounts) {
            if items.asset_type.is_single_unit() && *amount != U256::from(1u8) {
                return Err(TransferError::Rejected {
                    reason: format!("single-unit item {item_id} moved in amount {amount}"),
                });
            }
            staged.move_item(items.collection, *item_id, items.from, items.to, *amount)?;
        }

        for payment in batch.payments.iter().filter(|p| !p.amount.is_zero()) {
            self.check_recipient(payment.to)?;
            staged.safe_debit(payment.from, batch.currency, payment.amount)?;
            staged.safe_credit(payment.to, batch.currency, payment.amount)?;
        }

        self.books = staged;
        Ok(())
    }
}
