//! Matching engine
//!
//! Settles one taker order against one signed maker order. Every attempt
//! runs the same sequence and short-circuits on the first failure:
//!
//! 1. maker structure, against the item layout of its strategy
//! 2. time window `[start_time, end_time)`
//! 3. currency whitelist
//! 4. signature over the domain-separated order digest
//! 5. nonces (generation, order nonce, subset nonce)
//! 6. strategy lookup and active flag
//! 7. strategy execution
//! 8. order nonce flipped to executed
//! 9. fee split
//! 10. transfers through the [`TransferManager`]
//!
//! The fee split is pure and computed before the nonce flip; a failing
//! transfer undoes the flip, so an attempt either fully settles or leaves
//! no trace.

use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use tracing::{debug, info, warn};
use types::errors::OrderError;
use types::fee::FeeSplit;
use types::ids::{Nonce, StrategyId};
use types::numeric::mul_bp;
use types::order::{MakerOrder, QuoteType, TakerOrder};
use types::trade::SettlementResult;
use uuid::Uuid;

use crate::config::{EngineConfig, MAX_ORACLE_LATENCY_LIMIT};
use crate::errors::{CallerError, ConfigError, SettlementError};
use crate::events::{ExchangeEvent, NewStrategy, Settlement, StrategyUpdated};
use crate::fees::{FeeCalculator, RoyaltyFeeRegistry};
use crate::hashing::{domain_separator_for, order_digest};
use crate::nonce::NonceRegistry;
use crate::security::AccessControl;
use crate::signature::{ContractSigner, SignatureVerifier};
use crate::strategy::{
    check_maker_side, ExecutionContext, ExecutionStrategy, StrategyRecord, StrategyRegistry,
    ValidationOutcome,
};
use crate::vault::{CurrencyTransfer, ItemTransfer, TransferBatch, TransferManager};

/// Settlement orchestrator owning all replay, strategy and fee state.
#[derive(Debug)]
pub struct MatchingEngine {
    config: EngineConfig,
    domain_separator: B256,
    access_control: AccessControl,
    strategies: StrategyRegistry,
    nonces: NonceRegistry,
    signatures: SignatureVerifier,
    fees: FeeCalculator,
    currencies: HashSet<Address>,
    /// Emitted events log (append-only)
    events: Vec<ExchangeEvent>,
}

impl MatchingEngine {
    pub fn new(
        config: EngineConfig,
        royalties: Option<Arc<dyn RoyaltyFeeRegistry>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let strategies = StrategyRegistry::new(
            config.owner,
            config.protocol_fee_ceiling_bp,
            config.standard_protocol_fee_bp,
            config.standard_max_protocol_fee_bp,
        )?;

        Ok(Self {
            domain_separator: domain_separator_for(&config),
            access_control: AccessControl::new(config.owner),
            strategies,
            nonces: NonceRegistry::new(),
            signatures: SignatureVerifier::new(),
            fees: FeeCalculator::new(royalties),
            currencies: HashSet::new(),
            events: Vec::new(),
            config,
        })
    }

    /// The engine's own address, the only caller strategies accept.
    pub fn address(&self) -> Address {
        self.config.verifying_contract
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn domain_separator(&self) -> B256 {
        self.domain_separator
    }

    /// Digest a maker must sign.
    pub fn hash_maker_order(&self, maker: &MakerOrder) -> B256 {
        order_digest(&self.domain_separator, maker)
    }

    // ───────────────────────── Settlement ─────────────────────────

    /// Buy from a maker ask. `sender` pays; the items go to the taker's
    /// recipient.
    ///
    /// `auxiliary` is an opaque per-call payload (proofs, affiliate data).
    /// It is not authenticated and only travels into the settlement event.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_taker_bid<T: TransferManager>(
        &mut self,
        sender: Address,
        taker: &TakerOrder,
        maker: &MakerOrder,
        signature: &[u8],
        auxiliary: &[u8],
        current_time: u64,
        transfers: &mut T,
    ) -> Result<ExchangeEvent, SettlementError> {
        let signed = SignedMaker { maker, signature, auxiliary };
        self.execute(QuoteType::Bid, sender, taker, signed, current_time, transfers)
    }

    /// Sell into a maker bid. The maker pays; the net proceeds go to the
    /// taker's recipient.
    #[allow(clippy::too_many_arguments)]
    pub fn execute_taker_ask<T: TransferManager>(
        &mut self,
        sender: Address,
        taker: &TakerOrder,
        maker: &MakerOrder,
        signature: &[u8],
        auxiliary: &[u8],
        current_time: u64,
        transfers: &mut T,
    ) -> Result<ExchangeEvent, SettlementError> {
        let signed = SignedMaker { maker, signature, auxiliary };
        self.execute(QuoteType::Ask, sender, taker, signed, current_time, transfers)
    }

    fn execute<T: TransferManager>(
        &mut self,
        taker_side: QuoteType,
        sender: Address,
        taker: &TakerOrder,
        signed: SignedMaker<'_>,
        current_time: u64,
        transfers: &mut T,
    ) -> Result<ExchangeEvent, SettlementError> {
        let maker = signed.maker;
        let result = self.try_execute(taker_side, sender, taker, signed, current_time, transfers);
        match &result {
            Ok(event) => {
                if let Some(settlement) = event.settlement() {
                    info!(
                        settlement_id = %settlement.settlement_id,
                        order_hash = %settlement.order_hash,
                        strategy_id = %settlement.strategy_id,
                        maker = %settlement.maker,
                        taker = %settlement.taker,
                        price = %settlement.fees.price,
                        protocol_fee = %settlement.fees.protocol_fee,
                        royalty_fee = %settlement.fees.royalty_fee,
                        "Settlement executed"
                    );
                }
            }
            Err(e) => warn!(
                signer = %maker.signer,
                order_nonce = %maker.order_nonce,
                strategy_id = %maker.strategy_id,
                error = %e,
                "Settlement rejected"
            ),
        }
        result
    }

    fn try_execute<T: TransferManager>(
        &mut self,
        taker_side: QuoteType,
        sender: Address,
        taker: &TakerOrder,
        signed: SignedMaker<'_>,
        current_time: u64,
        transfers: &mut T,
    ) -> Result<ExchangeEvent, SettlementError> {
        let SignedMaker { maker, signature, auxiliary } = signed;
        if maker.quote_type != taker_side.opposite() {
            return Err(OrderError::QuoteTypeMismatch.into());
        }

        // 1-6
        let (order_hash, record) = self.check_settleable(maker, signature, current_time)?;

        // 7
        let ctx = self.execution_context(current_time);
        let result = record.implementation.execute_with_taker(&ctx, taker, maker)?;

        // 9, pure
        let fees = self.fees.split(result.price, &record, maker.collection);
        if maker.is_ask() {
            check_net_proceeds(maker, &fees)?;
        }
        let batch = self.transfer_batch(taker_side, sender, taker, maker, &result, &fees);

        // 8
        let flipped = result.is_nonce_invalidated && self.nonces.mark_executed(maker.signer, maker.order_nonce);
        if flipped {
            debug!(user = %maker.signer, order_nonce = %maker.order_nonce, "Order nonce executed");
        }

        // 10
        if let Err(e) = transfers.settle(&batch) {
            if flipped {
                self.nonces.rollback_executed(maker.signer, maker.order_nonce);
                debug!(user = %maker.signer, order_nonce = %maker.order_nonce, "Order nonce restored");
            }
            return Err(e.into());
        }

        let settlement = Settlement {
            settlement_id: Uuid::now_v7(),
            order_hash,
            order_nonce: maker.order_nonce,
            strategy_id: maker.strategy_id,
            maker: maker.signer,
            taker: sender,
            currency: maker.currency,
            collection: maker.collection,
            item_ids: result.item_ids,
            amounts: result.amounts,
            fees,
            affiliate_data: maker.affiliate_data.clone(),
            auxiliary_data: Bytes::copy_from_slice(auxiliary),
        };
        let event = match taker_side {
            QuoteType::Bid => ExchangeEvent::TakerBid(settlement),
            QuoteType::Ask => ExchangeEvent::TakerAsk(settlement),
        };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Steps 1 to 6. Read-only.
    fn check_settleable(
        &self,
        maker: &MakerOrder,
        signature: &[u8],
        current_time: u64,
    ) -> Result<(B256, StrategyRecord), SettlementError> {
        maker.validate_structure(self.strategies.item_layout(maker.strategy_id))?;
        maker.check_time_range(current_time)?;
        if !self.currencies.contains(&maker.currency) {
            return Err(OrderError::CurrencyNotWhitelisted {
                currency: maker.currency,
            }
            .into());
        }

        let order_hash = self.hash_maker_order(maker);
        self.signatures.verify(maker.signer, order_hash, signature)?;

        self.nonces.check_order(maker)?;

        let record = self.strategies.active_strategy(maker.strategy_id)?;
        check_maker_side(record.implementation.as_ref(), maker)?;
        Ok((order_hash, record.clone()))
    }

    fn execution_context(&self, current_time: u64) -> ExecutionContext {
        ExecutionContext::new(
            self.address(),
            self.address(),
            current_time,
            self.config.max_oracle_latency,
        )
    }

    fn transfer_batch(
        &self,
        taker_side: QuoteType,
        sender: Address,
        taker: &TakerOrder,
        maker: &MakerOrder,
        result: &SettlementResult,
        fees: &FeeSplit,
    ) -> TransferBatch {
        let recipient = taker.recipient_or(sender);
        let (payer, seller, item_from, item_to) = match taker_side {
            QuoteType::Bid => (sender, maker.signer, maker.signer, recipient),
            QuoteType::Ask => (maker.signer, recipient, sender, maker.signer),
        };

        let mut payments = vec![CurrencyTransfer {
            from: payer,
            to: self.config.protocol_fee_recipient,
            amount: fees.protocol_fee,
        }];
        if let Some(royalty_recipient) = fees.royalty_recipient {
            payments.push(CurrencyTransfer {
                from: payer,
                to: royalty_recipient,
                amount: fees.royalty_fee,
            });
        }
        payments.push(CurrencyTransfer {
            from: payer,
            to: seller,
            amount: fees.net_proceeds,
        });

        TransferBatch {
            currency: maker.currency,
            payments,
            items: ItemTransfer {
                asset_type: maker.asset_type,
                collection: maker.collection,
                from: item_from,
                to: item_to,
                item_ids: result.item_ids.clone(),
                amounts: result.amounts.clone(),
            },
        }
    }

    /// Pre-flight check of a signed maker order. Never mutates state.
    pub fn check_maker_order(&self, maker: &MakerOrder, signature: &[u8], current_time: u64) -> ValidationOutcome {
        match self.check_settleable(maker, signature, current_time) {
            Ok((_, record)) => record.implementation.validate(maker),
            Err(e) => ValidationOutcome::invalid(e),
        }
    }

    // ───────────────────────── User Nonces ─────────────────────────

    pub fn cancel_order_nonces(&mut self, caller: Address, nonces: &[Nonce]) -> Result<ExchangeEvent, SettlementError> {
        let event = self.nonces.cancel_order_nonces(caller, nonces)?;
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn cancel_subset_nonces(&mut self, caller: Address, nonces: &[Nonce]) -> Result<ExchangeEvent, SettlementError> {
        let event = self.nonces.cancel_subset_nonces(caller, nonces)?;
        self.events.push(event.clone());
        Ok(event)
    }

    /// Invalidate every open order of the chosen sides signed by `caller`.
    pub fn increment_bid_ask_nonces(
        &mut self,
        caller: Address,
        bid: bool,
        ask: bool,
    ) -> Result<ExchangeEvent, SettlementError> {
        let event = self.nonces.bump_generations(caller, bid, ask)?;
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn view_generations(&self, user: Address) -> (Nonce, Nonce) {
        self.nonces.view_generations(user)
    }

    pub fn is_order_nonce_executed_or_cancelled(&self, user: Address, nonce: Nonce) -> bool {
        self.nonces.is_order_nonce_spent(user, nonce)
    }

    pub fn is_subset_nonce_cancelled(&self, user: Address, nonce: Nonce) -> bool {
        self.nonces.is_subset_cancelled(user, nonce)
    }

    // ───────────────────────── Strategies ─────────────────────────

    pub fn add_strategy(
        &mut self,
        caller: Address,
        has_royalties: bool,
        protocol_fee_bp: u16,
        max_protocol_fee_bp: u16,
        implementation: Arc<dyn ExecutionStrategy>,
    ) -> Result<StrategyId, SettlementError> {
        let name = implementation.name().to_string();
        let strategy_id = self.strategies.add_strategy(
            caller,
            has_royalties,
            protocol_fee_bp,
            max_protocol_fee_bp,
            implementation,
        )?;
        info!(%strategy_id, %name, protocol_fee_bp, max_protocol_fee_bp, "Strategy added");
        self.events.push(ExchangeEvent::NewStrategy(NewStrategy {
            strategy_id,
            name,
            has_royalties,
            protocol_fee_bp,
            max_protocol_fee_bp,
        }));
        Ok(strategy_id)
    }

    pub fn update_strategy(
        &mut self,
        caller: Address,
        strategy_id: StrategyId,
        has_royalties: bool,
        protocol_fee_bp: u16,
        is_active: bool,
    ) -> Result<ExchangeEvent, SettlementError> {
        self.strategies
            .update_strategy(caller, strategy_id, has_royalties, protocol_fee_bp, is_active)?;
        info!(%strategy_id, is_active, has_royalties, protocol_fee_bp, "Strategy updated");
        let event = ExchangeEvent::StrategyUpdated(StrategyUpdated {
            strategy_id,
            is_active,
            has_royalties,
            protocol_fee_bp,
        });
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn view_strategy(&self, strategy_id: StrategyId) -> Result<&StrategyRecord, ConfigError> {
        self.strategies.view_strategy(strategy_id)
    }

    // ───────────────────────── Administration ─────────────────────────

    pub fn update_currency_status(
        &mut self,
        caller: Address,
        currency: Address,
        is_allowed: bool,
    ) -> Result<ExchangeEvent, CallerError> {
        self.access_control.ensure_owner(caller)?;
        if is_allowed {
            self.currencies.insert(currency);
        } else {
            self.currencies.remove(&currency);
        }
        info!(%currency, is_allowed, "Currency status updated");
        let event = ExchangeEvent::CurrencyStatusUpdated { currency, is_allowed };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn is_currency_allowed(&self, currency: Address) -> bool {
        self.currencies.contains(&currency)
    }

    /// Point royalty lookups at a different registry, or disable them.
    pub fn set_royalty_registry(
        &mut self,
        caller: Address,
        royalties: Option<Arc<dyn RoyaltyFeeRegistry>>,
    ) -> Result<ExchangeEvent, CallerError> {
        self.access_control.ensure_owner(caller)?;
        self.fees.set_royalty_registry(royalties);
        let enabled = self.fees.has_royalty_registry();
        info!(enabled, "Royalty registry updated");
        let event = ExchangeEvent::NewRoyaltyRegistry { enabled };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn set_max_oracle_latency(&mut self, caller: Address, max_latency: u64) -> Result<ExchangeEvent, SettlementError> {
        self.access_control.ensure_owner(caller)?;
        if max_latency > MAX_ORACLE_LATENCY_LIMIT {
            return Err(ConfigError::LatencyTooHigh {
                latency: max_latency,
                maximum: MAX_ORACLE_LATENCY_LIMIT,
            }
            .into());
        }
        self.config.max_oracle_latency = max_latency;
        info!(max_latency, "Max oracle latency updated");
        let event = ExchangeEvent::NewMaxOracleLatency { max_latency };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn transfer_ownership(&mut self, caller: Address, new_owner: Address) -> Result<ExchangeEvent, CallerError> {
        let previous_owner = self.access_control.transfer_ownership(caller, new_owner)?;
        self.strategies.transfer_ownership(caller, new_owner)?;
        self.config.owner = new_owner;
        info!(%previous_owner, %new_owner, "Ownership transferred");
        let event = ExchangeEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn owner(&self) -> Address {
        self.access_control.owner()
    }

    /// Declare `address` a contract account whose orders are approved by
    /// `validator` instead of an ECDSA signature. Owner-only.
    pub fn register_contract_signer(
        &mut self,
        caller: Address,
        address: Address,
        validator: Arc<dyn ContractSigner>,
    ) -> Result<ExchangeEvent, CallerError> {
        self.access_control.ensure_owner(caller)?;
        self.signatures.register_contract_signer(address, validator);
        info!(%address, "Contract signer registered");
        let event = ExchangeEvent::ContractSignerUpdated {
            address,
            is_contract: true,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    /// Return `address` to plain ECDSA verification. Owner-only.
    pub fn remove_contract_signer(&mut self, caller: Address, address: Address) -> Result<ExchangeEvent, CallerError> {
        self.access_control.ensure_owner(caller)?;
        self.signatures.remove_contract_signer(&address);
        info!(%address, "Contract signer removed");
        let event = ExchangeEvent::ContractSignerUpdated {
            address,
            is_contract: false,
        };
        self.events.push(event.clone());
        Ok(event)
    }

    pub fn is_contract_signer(&self, address: Address) -> bool {
        self.signatures.is_contract(&address)
    }

    // ───────────────────────── Events ─────────────────────────

    pub fn events(&self) -> &[ExchangeEvent] {
        &self.events
    }

    /// Drain all events (consume and clear).
    pub fn drain_events(&mut self) -> Vec<ExchangeEvent> {
        std::mem::take(&mut self.events)
    }
}

/// A maker order with the bytes submitted alongside it.
#[derive(Clone, Copy)]
struct SignedMaker<'a> {
    maker: &'a MakerOrder,
    signature: &'a [u8],
    auxiliary: &'a [u8],
}

/// A maker ask may demand a minimum share of the price as net proceeds.
fn check_net_proceeds(maker: &MakerOrder, fees: &FeeSplit) -> Result<(), OrderError> {
    if maker.min_net_ratio_bp == 0 {
        return Ok(());
    }
    if fees.net_proceeds < mul_bp(fees.price, maker.min_net_ratio_bp) {
        return Err(OrderError::NetProceedsBelowMinimum);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{NonceError, SignatureError, TransferError};
    use crate::signature::OrderSigner;
    use crate::vault::Vault;
    use alloy_primitives::U256;

    const NOW: u64 = 1_700_000_000;

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn currency() -> Address {
        Address::repeat_byte(0xcc)
    }

    fn collection() -> Address {
        Address::repeat_byte(0xc0)
    }

    fn taker_address() -> Address {
        Address::repeat_byte(0x0b)
    }

    fn setup() -> (MatchingEngine, OrderSigner, Vault) {
        let config = EngineConfig {
            owner: owner(),
            verifying_contract: Address::repeat_byte(0xee),
            protocol_fee_recipient: Address::repeat_byte(0xfe),
            ..Default::default()
        };
        let mut engine = MatchingEngine::new(config, None).unwrap();
        engine.update_currency_status(owner(), currency(), true).unwrap();

        let signer = OrderSigner::from_secret(&[0x42; 32]).unwrap();
        let mut vault = Vault::new();
        vault
            .mint_item(collection(), U256::from(1u64), signer.address(), U256::from(1u64))
            .unwrap();
        vault
            .deposit_currency(taker_address(), currency(), U256::from(1_000_000u64))
            .unwrap();
        (engine, signer, vault)
    }

    fn ask(signer: &OrderSigner) -> MakerOrder {
        MakerOrder {
            quote_type: QuoteType::Ask,
            order_nonce: U256::from(1u64),
            collection: collection(),
            currency: currency(),
            signer: signer.address(),
            start_time: NOW - 10,
            end_time: NOW + 10,
            price: U256::from(100_000u64),
            item_ids: vec![U256::from(1u64)],
            amounts: vec![U256::from(1u64)],
            ..Default::default()
        }
    }

    fn taker_for(maker: &MakerOrder) -> TakerOrder {
        TakerOrder {
            price: maker.price,
            item_ids: maker.item_ids.clone(),
            amounts: maker.amounts.clone(),
            ..Default::default()
        }
    }

    fn sign(engine: &MatchingEngine, signer: &OrderSigner, maker: &MakerOrder) -> Vec<u8> {
        signer.sign_digest(engine.hash_maker_order(maker)).unwrap().to_vec()
    }

    #[test]
    fn test_taker_bid_settles_and_records_event() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);

        let event = engine
            .execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[0xaf, 0x01], NOW, &mut vault)
            .unwrap();
        let settlement = event.settlement().unwrap();
        assert!(matches!(event, ExchangeEvent::TakerBid(_)));
        assert_eq!(settlement.auxiliary_data, Bytes::from_static(&[0xaf, 0x01]));
        assert_eq!(settlement.fees.protocol_fee, U256::from(1_500u64));
        assert_eq!(settlement.order_hash, engine.hash_maker_order(&maker));

        assert_eq!(vault.item_balance(collection(), U256::from(1u64), taker_address()), U256::from(1u64));
        assert_eq!(vault.balance_of(signer.address(), currency()), U256::from(98_500u64));
        assert!(engine.is_order_nonce_executed_or_cancelled(signer.address(), U256::from(1u64)));
        assert!(matches!(engine.events().last(), Some(ExchangeEvent::TakerBid(_))));
    }

    #[test]
    fn test_wrong_entry_point_for_maker_side() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        assert_eq!(
            engine.execute_taker_ask(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault),
            Err(OrderError::QuoteTypeMismatch.into())
        );
    }

    #[test]
    fn test_failed_transfer_restores_nonce() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        let poor_taker = Address::repeat_byte(0x0c);

        let result = engine.execute_taker_bid(poor_taker, &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault);
        assert!(matches!(
            result,
            Err(SettlementError::Transfer(TransferError::InsufficientBalance { .. }))
        ));
        assert!(!engine.is_order_nonce_executed_or_cancelled(signer.address(), U256::from(1u64)));
        assert!(engine.events().iter().all(|e| e.settlement().is_none()));

        engine
            .execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault)
            .unwrap();
    }

    #[test]
    fn test_time_window_is_half_open() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        let result = engine.execute_taker_bid(
            taker_address(),
            &taker_for(&maker),
            &maker,
            &signature,
            &[],
            maker.end_time,
            &mut vault,
        );
        assert!(matches!(
            result,
            Err(SettlementError::Order(OrderError::OutsideOfTimeRange { .. }))
        ));
        assert!(engine.check_maker_order(&maker, &signature, maker.start_time).is_valid);
    }

    #[test]
    fn test_currency_must_be_whitelisted() {
        let (mut engine, signer, mut vault) = setup();
        engine.update_currency_status(owner(), currency(), false).unwrap();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        assert_eq!(
            engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault),
            Err(OrderError::CurrencyNotWhitelisted { currency: currency() }.into())
        );
    }

    #[test]
    fn test_signature_by_other_key_rejected() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let impostor = OrderSigner::from_secret(&[0x43; 32]).unwrap();
        let signature = sign(&engine, &impostor, &maker);
        assert!(matches!(
            engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault),
            Err(SettlementError::Signature(SignatureError::Mismatch { .. }))
        ));
    }

    #[test]
    fn test_inactive_strategy() {
        let (mut engine, signer, mut vault) = setup();
        engine
            .update_strategy(owner(), StrategyId::STANDARD, true, 150, false)
            .unwrap();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        assert_eq!(
            engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault),
            Err(OrderError::StrategyNotActive {
                strategy_id: StrategyId::STANDARD
            }
            .into())
        );
    }

    #[test]
    fn test_min_net_ratio() {
        let (mut engine, signer, mut vault) = setup();
        let mut maker = ask(&signer);
        maker.min_net_ratio_bp = 9_900;
        let signature = sign(&engine, &signer, &maker);
        assert_eq!(
            engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault),
            Err(OrderError::NetProceedsBelowMinimum.into())
        );

        maker.min_net_ratio_bp = 9_850;
        let signature = sign(&engine, &signer, &maker);
        assert!(engine
            .execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault)
            .is_ok());
    }

    #[test]
    fn test_cancelled_subset_blocks_settlement() {
        let (mut engine, signer, mut vault) = setup();
        let maker = ask(&signer);
        let signature = sign(&engine, &signer, &maker);
        engine.cancel_subset_nonces(signer.address(), &[U256::ZERO]).unwrap();

        let result =
            engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &signature, &[], NOW, &mut vault);
        assert_eq!(
            result,
            Err(NonceError::SubsetCancelled { nonce: U256::ZERO }.into())
        );
        assert!(result.unwrap_err().is_nonce_invalid());
    }

    #[test]
    fn test_admin_operations_require_owner() {
        let (mut engine, _, _) = setup();
        let eve = Address::repeat_byte(0x66);
        assert_eq!(
            engine.update_currency_status(eve, currency(), true),
            Err(CallerError::Unauthorized)
        );
        assert_eq!(
            engine.set_royalty_registry(eve, None),
            Err(CallerError::Unauthorized)
        );
        assert_eq!(
            engine.set_max_oracle_latency(eve, 60),
            Err(SettlementError::Caller(CallerError::Unauthorized))
        );
        assert_eq!(
            engine.transfer_ownership(eve, eve),
            Err(CallerError::Unauthorized)
        );
    }

    #[test]
    fn test_max_oracle_latency_bounds() {
        let (mut engine, _, _) = setup();
        engine.set_max_oracle_latency(owner(), 600).unwrap();
        assert_eq!(engine.config().max_oracle_latency, 600);
        assert!(matches!(
            engine.set_max_oracle_latency(owner(), MAX_ORACLE_LATENCY_LIMIT + 1),
            Err(SettlementError::Config(ConfigError::LatencyTooHigh { .. }))
        ));
    }

    #[test]
    fn test_ownership_transfer_moves_strategy_control() {
        let (mut engine, _, _) = setup();
        let new_owner = Address::repeat_byte(0x02);
        engine.transfer_ownership(owner(), new_owner).unwrap();
        assert_eq!(engine.owner(), new_owner);
        assert!(engine
            .update_strategy(owner(), StrategyId::STANDARD, true, 100, true)
            .is_err());
        assert!(engine
            .update_strategy(new_owner, StrategyId::STANDARD, true, 100, true)
            .is_ok());
    }

    #[derive(Debug)]
    struct ApproveAll;

    impl ContractSigner for ApproveAll {
        fn is_valid_signature(&self, _hash: B256, _signature: &[u8]) -> [u8; 4] {
            crate::signature::ERC1271_MAGIC_VALUE
        }
    }

    #[test]
    fn test_contract_signer_registration_requires_owner() {
        let (mut engine, signer, mut vault) = setup();
        let eve = Address::repeat_byte(0x66);
        assert_eq!(
            engine.register_contract_signer(eve, signer.address(), Arc::new(ApproveAll)),
            Err(CallerError::Unauthorized)
        );
        assert!(!engine.is_contract_signer(signer.address()));

        // the victim is still a plain key: junk signatures fail recovery
        let maker = ask(&signer);
        let result = engine.execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &[], &[], NOW, &mut vault);
        assert!(matches!(
            result,
            Err(SettlementError::Signature(SignatureError::LengthInvalid { .. }))
        ));
        assert_eq!(vault.item_balance(collection(), U256::from(1u64), signer.address()), U256::from(1u64));
        assert_eq!(vault.balance_of(signer.address(), currency()), U256::ZERO);
    }

    #[test]
    fn test_owner_registered_contract_signer() {
        let (mut engine, _, mut vault) = setup();
        let contract = Address::repeat_byte(0x7c);
        vault
            .mint_item(collection(), U256::from(9u64), contract, U256::from(1u64))
            .unwrap();
        let event = engine
            .register_contract_signer(owner(), contract, Arc::new(ApproveAll))
            .unwrap();
        assert_eq!(
            event,
            ExchangeEvent::ContractSignerUpdated {
                address: contract,
                is_contract: true
            }
        );

        let maker = MakerOrder {
            signer: contract,
            item_ids: vec![U256::from(9u64)],
            ..ask(&OrderSigner::from_secret(&[0x42; 32]).unwrap())
        };
        assert!(engine
            .execute_taker_bid(taker_address(), &taker_for(&maker), &maker, &[], &[], NOW, &mut vault)
            .is_ok());

        engine.remove_contract_signer(owner(), contract).unwrap();
        assert!(!engine.is_contract_signer(contract));
        assert!(matches!(
            engine.check_maker_order(&maker, &[], NOW).error,
            Some(SettlementError::Signature(_))
        ));
    }

    #[test]
    fn test_drain_events() {
        let (mut engine, _, _) = setup();
        assert_eq!(engine.drain_events().len(), 1);
        assert!(engine.events().is_empty());
    }
}
