//! Types library for the settlement engine
//!
//! This library provides the core type definitions shared by the settlement
//! engine and its off-chain clients: signed maker orders, taker orders,
//! settlement results and fee splits.
//!
//! # Version
//! v1.0.0 - Frozen wire format
//!
//! # Modules
//! - `ids`: Identifier aliases (StrategyId, Nonce) and EVM primitives
//! - `numeric`: Basis-point arithmetic on `U256`
//! - `order`: Maker/taker order types and structural validation
//! - `params`: Strategy parameter word decoding
//! - `trade`: Settlement result types
//! - `fee`: Fee split types
//! - `errors`: Structural order error taxonomy

// Public modules
pub mod ids;
pub mod numeric;
pub mod order;
pub mod params;
pub mod trade;
pub mod fee;
pub mod errors;
