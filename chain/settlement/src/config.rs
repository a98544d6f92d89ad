//! Engine configuration
//!
//! Deployment parameters for one settlement engine instance: the EIP-712
//! domain, the privileged owner, fee policy and oracle freshness.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use types::numeric::ONE_HUNDRED_PERCENT_BP;

use crate::errors::ConfigError;

/// Upper bound accepted for `max_oracle_latency` (seconds).
pub const MAX_ORACLE_LATENCY_LIMIT: u64 = 86_400;

/// Configuration for the matching engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// EIP-712 domain name
    pub domain_name: String,
    /// EIP-712 domain version
    pub domain_version: String,
    /// Chain the signatures are bound to
    pub chain_id: u64,
    /// Address of this engine; bound into the domain and used as the only
    /// caller strategies accept
    pub verifying_contract: Address,
    /// Privileged operator
    pub owner: Address,
    /// Receives protocol fees
    pub protocol_fee_recipient: Address,
    /// Ceiling for any strategy's `max_protocol_fee_bp`
    pub protocol_fee_ceiling_bp: u16,
    /// Protocol fee of the built-in standard strategy
    pub standard_protocol_fee_bp: u16,
    /// Maximum protocol fee of the built-in standard strategy
    pub standard_max_protocol_fee_bp: u16,
    /// Oracle answers older than this many seconds are stale
    pub max_oracle_latency: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain_name: "SettlementProtocol".to_string(),
            domain_version: "2".to_string(),
            chain_id: 1,
            verifying_contract: Address::ZERO,
            owner: Address::ZERO,
            protocol_fee_recipient: Address::ZERO,
            protocol_fee_ceiling_bp: 5_000,
            standard_protocol_fee_bp: 150,
            standard_max_protocol_fee_bp: 300,
            max_oracle_latency: 3_600,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check fee bounds, the fee recipient and latency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol_fee_ceiling_bp > ONE_HUNDRED_PERCENT_BP {
            return Err(ConfigError::Parse(format!(
                "protocol_fee_ceiling_bp {} exceeds 10000",
                self.protocol_fee_ceiling_bp
            )));
        }
        if self.standard_protocol_fee_bp > self.standard_max_protocol_fee_bp
            || self.standard_max_protocol_fee_bp > self.protocol_fee_ceiling_bp
        {
            return Err(ConfigError::ProtocolFeeTooHigh {
                protocol_fee_bp: self.standard_protocol_fee_bp,
                max_protocol_fee_bp: self.standard_max_protocol_fee_bp,
                ceiling_bp: self.protocol_fee_ceiling_bp,
            });
        }
        if self.protocol_fee_recipient.is_zero() {
            return Err(ConfigError::ZeroFeeRecipient);
        }
        if self.max_oracle_latency > MAX_ORACLE_LATENCY_LIMIT {
            return Err(ConfigError::LatencyTooHigh {
                latency: self.max_oracle_latency,
                maximum: MAX_ORACLE_LATENCY_LIMIT,
            });
        }
        Ok(())
    }
}
