//! Batch, gas and receipt-polling configuration

use alloy_primitives::Bytes;
use std::time::Duration;

use crate::protocol::default_extra_options;

/// One gwei in wei
const GWEI: u128 = 1_000_000_000;

/// Gas parameters for transactions signed on the device.
///
/// Gas is fixed rather than estimated: the device signs each transaction once
/// and the batch is broadcast later, so limits are chosen with headroom.
///
/// # Examples
///
/// ```rust
/// use permit2_bridge::GasConfig;
///
/// let gas = GasConfig::default().with_max_fee_per_gas(50_000_000_000);
/// assert_eq!(gas.bridge_gas_limit, 500_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasConfig {
    /// Gas limit for `receiveAndBridgeGasless`.
    pub bridge_gas_limit: u64,
    /// Gas limit for the ERC20 approval of Permit2.
    pub approve_gas_limit: u64,
    /// EIP-1559 max fee per gas, in wei.
    pub max_fee_per_gas: u128,
    /// EIP-1559 max priority fee per gas, in wei.
    pub max_priority_fee_per_gas: u128,
}

impl Default for GasConfig {
    /// - `bridge_gas_limit`: 500 000
    /// - `approve_gas_limit`: 120 000
    /// - `max_fee_per_gas`: 30 gwei
    /// - `max_priority_fee_per_gas`: 1.5 gwei
    fn default() -> Self {
        Self {
            bridge_gas_limit: 500_000,
            approve_gas_limit: 120_000,
            max_fee_per_gas: 30 * GWEI,
            max_priority_fee_per_gas: 3 * GWEI / 2,
        }
    }
}

impl GasConfig {
    pub fn with_bridge_gas_limit(mut self, limit: u64) -> Self {
        self.bridge_gas_limit = limit;
        self
    }

    pub fn with_approve_gas_limit(mut self, limit: u64) -> Self {
        self.approve_gas_limit = limit;
        self
    }

    pub fn with_max_fee_per_gas(mut self, wei: u128) -> Self {
        self.max_fee_per_gas = wei;
        self
    }

    pub fn with_max_priority_fee_per_gas(mut self, wei: u128) -> Self {
        self.max_priority_fee_per_gas = wei;
        self
    }
}

/// Configuration for a batch run.
///
/// # Examples
///
/// ```rust
/// use permit2_bridge::BatchConfig;
///
/// let config = BatchConfig::default()
///     .with_signing_timeout_secs(60)
///     .with_slippage_bps(50);
/// assert_eq!(config.permit_validity_secs, 3600);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Seconds to wait for the device to answer a single signing request.
    pub signing_timeout_secs: u64,
    /// Permit deadline, in seconds after the latest block timestamp.
    pub permit_validity_secs: u64,
    /// Number of nonce bitmap words scanned before giving up.
    pub max_nonce_words: u32,
    /// Slippage tolerated on the destination amount, in basis points.
    pub slippage_bps: u16,
    /// LayerZero executor options passed to the validator.
    pub extra_options: Bytes,
    pub gas: GasConfig,
}

impl Default for BatchConfig {
    /// - `signing_timeout_secs`: 120
    /// - `permit_validity_secs`: 3600 (1 hour)
    /// - `max_nonce_words`: 4 (1024 nonces)
    /// - `slippage_bps`: 0, so `minAmountLD` equals the amount
    /// - `extra_options`: `lzReceive` with 60 000 gas
    fn default() -> Self {
        Self {
            signing_timeout_secs: 120,
            permit_validity_secs: 3600,
            max_nonce_words: 4,
            slippage_bps: 0,
            extra_options: default_extra_options(),
            gas: GasConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn with_signing_timeout_secs(mut self, secs: u64) -> Self {
        self.signing_timeout_secs = secs;
        self
    }

    pub fn with_permit_validity_secs(mut self, secs: u64) -> Self {
        self.permit_validity_secs = secs;
        self
    }

    /// Sets how many bitmap words to scan. Zero is treated as one.
    pub fn with_max_nonce_words(mut self, words: u32) -> Self {
        self.max_nonce_words = words.max(1);
        self
    }

    pub fn with_slippage_bps(mut self, bps: u16) -> Self {
        self.slippage_bps = bps;
        self
    }

    pub fn with_extra_options(mut self, options: Bytes) -> Self {
        self.extra_options = options;
        self
    }

    pub fn with_gas(mut self, gas: GasConfig) -> Self {
        self.gas = gas;
        self
    }

    pub fn signing_timeout(&self) -> Duration {
        Duration::from_secs(self.signing_timeout_secs)
    }
}

/// Configuration for receipt polling.
///
/// Used while waiting for a Permit2 approval to be mined before the permit
/// that depends on it is signed.
///
/// # Examples
///
/// ```rust
/// use permit2_bridge::PollingConfig;
///
/// let config = PollingConfig::default().with_max_attempts(10);
/// assert_eq!(config.total_timeout_secs(), 20);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Maximum number of receipt lookups before giving up.
    pub max_attempts: u32,
    /// Seconds to wait between lookups.
    pub poll_interval_secs: u64,
}

impl Default for PollingConfig {
    /// - `max_attempts`: 60
    /// - `poll_interval_secs`: 2
    fn default() -> Self {
        Self {
            max_attempts: 60,
            poll_interval_secs: 2,
        }
    }
}

impl PollingConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }

    /// Returns `max_attempts * poll_interval_secs`.
    pub fn total_timeout_secs(&self) -> u64 {
        self.max_attempts as u64 * self.poll_interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_defaults() {
        let gas = GasConfig::default();
        assert_eq!(gas.bridge_gas_limit, 500_000);
        assert_eq!(gas.approve_gas_limit, 120_000);
        assert_eq!(gas.max_fee_per_gas, 30_000_000_000);
        assert_eq!(gas.max_priority_fee_per_gas, 1_500_000_000);
    }

    #[test]
    fn batch_defaults() {
        let config = BatchConfig::default();
        assert_eq!(config.signing_timeout(), Duration::from_secs(120));
        assert_eq!(config.permit_validity_secs, 3600);
        assert_eq!(config.max_nonce_words, 4);
        assert_eq!(config.slippage_bps, 0);
        assert_eq!(config.extra_options, default_extra_options());
    }

    #[test]
    fn builder_methods() {
        let config = BatchConfig::default()
            .with_signing_timeout_secs(30)
            .with_permit_validity_secs(600)
            .with_max_nonce_words(0)
            .with_gas(GasConfig::default().with_bridge_gas_limit(700_000));
        assert_eq!(config.signing_timeout_secs, 30);
        assert_eq!(config.permit_validity_secs, 600);
        assert_eq!(config.max_nonce_words, 1);
        assert_eq!(config.gas.bridge_gas_limit, 700_000);
    }

    #[test]
    fn polling_timeout() {
        let config = PollingConfig::default();
        assert_eq!(config.total_timeout_secs(), 120);
        let config = config.with_poll_interval_secs(5).with_max_attempts(3);
        assert_eq!(config.total_timeout_secs(), 15);
    }

    #[test]
    fn polling_config_is_copy() {
        let config = PollingConfig::default();
        let copied = config;
        assert_eq!(config, copied);
    }
}
