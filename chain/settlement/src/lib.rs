//! Settlement engine for peer-to-peer asset exchange
//!
//! Makers sign orders off-chain; takers submit a counter-order together with
//! the signed maker order, and the [`engine::MatchingEngine`] settles the pair
//! atomically.
//!
//! # Modules
//! - `errors`: Error taxonomy, one enum per concern plus `SettlementError`
//! - `events`: Exchange events emitted by every state change
//! - `security`: Single-owner access control
//! - `config`: Engine configuration, loadable from JSON
//! - `hashing`: EIP-712 domain separator and maker-order digests
//! - `signature`: secp256k1 and contract-signer verification, order signing
//! - `nonce`: Replay protection (generations, order nonces, subset nonces)
//! - `fees`: Protocol fee and royalty split
//! - `oracle`: Price feeds with staleness checks
//! - `strategy`: Strategy trait, registry and the built-in strategies
//! - `vault`: Transfer seam and in-memory custody
//! - `engine`: The matching engine

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod fees;
pub mod hashing;
pub mod nonce;
pub mod oracle;
pub mod security;
pub mod signature;
pub mod strategy;
pub mod vault;

pub use engine::MatchingEngine;
pub use errors::SettlementError;
