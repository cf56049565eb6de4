//! Alloy-based chain client implementation.

use alloy_network::Ethereum;
use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::BlockNumberOrTag;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn, Instrument};

use crate::batch::PollingConfig;
use crate::chain::ChainConfig;
use crate::contracts::erc20::Erc20Contract;
use crate::contracts::permit2::Permit2Contract;
use crate::contracts::validator::{BridgeRequest, ValidatorContract};
use crate::error::{BridgeError, Result};
use crate::protocol::NonceBitmap;
use crate::providers::TokioClock;
use crate::spans;
use crate::traits::{ChainClient, Clock};

/// Production chain client wrapping Alloy's [`Provider`] trait.
///
/// # Type Parameters
///
/// - `P`: The underlying Alloy provider implementation
/// - `C`: Clock used between receipt polls
///
/// # Examples
///
/// ```rust,no_run
/// use permit2_bridge::providers::AlloyChainClient;
/// use permit2_bridge::ChainRegistry;
/// use alloy_chains::NamedChain;
///
/// # fn example() -> Result<(), permit2_bridge::BridgeError> {
/// let registry = ChainRegistry::sepolia_testnets().with_env_overrides()?;
/// let base = registry.require(NamedChain::BaseSepolia)?;
/// let client = AlloyChainClient::connect(base);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlloyChainClient<P, C = TokioClock>
where
    P: Provider<Ethereum> + Clone,
    C: Clock,
{
    provider: P,
    clock: C,
    polling: PollingConfig,
}

impl AlloyChainClient<DynProvider<Ethereum>, TokioClock> {
    /// Connects an HTTP provider to the chain's configured RPC URL.
    pub fn connect(config: &ChainConfig) -> Self {
        debug!(
            chain = %config.chain(),
            rpc_url = %config.rpc_url(),
            event = "chain_client_connecting"
        );
        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url().clone())
            .erased();
        Self::new(provider)
    }
}

impl<P> AlloyChainClient<P, TokioClock>
where
    P: Provider<Ethereum> + Clone,
{
    /// Creates a new [`AlloyChainClient`] wrapping the given Alloy provider.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            clock: TokioClock::new(),
            polling: PollingConfig::default(),
        }
    }
}

impl<P, C> AlloyChainClient<P, C>
where
    P: Provider<Ethereum> + Clone,
    C: Clock,
{
    /// Replaces the clock used between receipt polls.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> AlloyChainClient<P, C2> {
        AlloyChainClient {
            provider: self.provider,
            clock,
            polling: self.polling,
        }
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }

    /// Returns a reference to the underlying Alloy provider.
    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P, C> ChainClient for AlloyChainClient<P, C>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
    C: Clock,
{
    async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    async fn pending_nonce(&self, owner: Address) -> Result<u64> {
        let nonce = self.provider.get_transaction_count(owner).pending().await?;
        trace!(owner = %owner, nonce, event = "pending_nonce_retrieved");
        Ok(nonce)
    }

    async fn latest_block_timestamp(&self) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| BridgeError::Provider("latest block not available".to_string()))?;
        Ok(block.header.timestamp)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let erc20 = Erc20Contract::new(token, self.provider.clone());
        Ok(erc20.balance_of(owner).await?)
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        let erc20 = Erc20Contract::new(token, self.provider.clone());
        Ok(erc20.allowance(owner, spender).await?)
    }

    async fn nonce_bitmap(
        &self,
        permit2: Address,
        owner: Address,
        word: U256,
    ) -> Result<NonceBitmap> {
        let permit2 = Permit2Contract::new(permit2, self.provider.clone());
        Ok(permit2.nonce_bitmap(owner, word).await?)
    }

    async fn quote_bridge(&self, validator: Address, request: &BridgeRequest) -> Result<U256> {
        let validator = ValidatorContract::new(validator, self.provider.clone());
        Ok(validator.quote_bridge(request).await?)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        Ok(self.provider.get_balance(owner).await?)
    }

    #[instrument(skip(self, raw), fields(raw_len = raw.len()))]
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        let pending = self.provider.send_raw_transaction(raw).await?;
        let tx_hash = *pending.tx_hash();
        debug!(tx_hash = %tx_hash, event = "raw_transaction_accepted");
        Ok(tx_hash)
    }

    async fn wait_for_success(&self, tx_hash: TxHash) -> Result<()> {
        let span = spans::wait_for_receipt(
            tx_hash,
            self.polling.max_attempts,
            self.polling.poll_interval_secs,
        );

        async {
            let started = self.clock.now();
            for attempt in 1..=self.polling.max_attempts {
                if let Some(receipt) = self.provider.get_transaction_receipt(tx_hash).await? {
                    if !receipt.status() {
                        let reason = format!("transaction {tx_hash} reverted");
                        spans::record_error_with_context("TransactionFailed", &reason, None);
                        return Err(BridgeError::TransactionFailed { reason });
                    }
                    info!(
                        tx_hash = %tx_hash,
                        attempt,
                        elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64,
                        event = "transaction_confirmed"
                    );
                    return Ok(());
                }

                trace!(tx_hash = %tx_hash, attempt, event = "receipt_not_found");
                self.clock
                    .sleep(Duration::from_secs(self.polling.poll_interval_secs))
                    .await;
            }

            warn!(
                tx_hash = %tx_hash,
                attempts = self.polling.max_attempts,
                event = "receipt_timeout"
            );
            spans::record_error_with_context(
                "ReceiptTimeout",
                &format!("no receipt for {tx_hash}"),
                None,
            );
            Err(BridgeError::ReceiptTimeout { tx_hash })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeClock;
    use alloy_primitives::B256;
    use alloy_provider::mock::Asserter;
    use serde_json::json;

    const TX_HASH: B256 = B256::repeat_byte(0xab);

    fn mocked_receipt(tx_hash: TxHash, status: &str) -> serde_json::Value {
        json!({
            "transactionHash": tx_hash,
            "transactionIndex": "0x1",
            "blockHash": "0x1234567890123456789012345678901234567890123456789012345678901234",
            "blockNumber": "0x1",
            "from": "0x1234567890123456789012345678901234567890",
            "to": "0x5678901234567890123456789012345678901234",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x77359400",
            "cumulativeGasUsed": "0x5208",
            "status": status,
            "type": "0x2",
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "logs": []
        })
    }

    fn mocked_client(
        asserter: Asserter,
        clock: FakeClock,
    ) -> AlloyChainClient<impl Provider<Ethereum> + Clone, FakeClock> {
        let provider = ProviderBuilder::new().connect_mocked_client(asserter);
        AlloyChainClient::new(provider)
            .with_clock(clock)
            .with_polling(PollingConfig::default().with_max_attempts(3))
    }

    #[tokio::test]
    async fn test_wait_for_success_polls_until_receipt() {
        let asserter = Asserter::new();
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&mocked_receipt(TX_HASH, "0x1"));
        let clock = FakeClock::new();

        mocked_client(asserter, clock.clone())
            .wait_for_success(TX_HASH)
            .await
            .unwrap();

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_wait_for_success_reports_revert() {
        let asserter = Asserter::new();
        asserter.push_success(&serde_json::Value::Null);
        asserter.push_success(&mocked_receipt(TX_HASH, "0x0"));
        let clock = FakeClock::new();

        let err = mocked_client(asserter, clock.clone())
            .wait_for_success(TX_HASH)
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::TransactionFailed { .. }), "{err}");
        assert_eq!(clock.sleep_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_for_success_times_out_after_max_attempts() {
        let asserter = Asserter::new();
        for _ in 0..3 {
            asserter.push_success(&serde_json::Value::Null);
        }
        let clock = FakeClock::new();

        let err = mocked_client(asserter, clock.clone())
            .wait_for_success(TX_HASH)
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::ReceiptTimeout { tx_hash } if tx_hash == TX_HASH));
        assert_eq!(clock.sleep_count(), 3);
    }

    #[tokio::test]
    async fn test_pending_nonce_reads_transaction_count() {
        let asserter = Asserter::new();
        asserter.push_success(&"0x7");

        let nonce = mocked_client(asserter, FakeClock::new())
            .pending_nonce(Address::repeat_byte(0x0a))
            .await
            .unwrap();

        assert_eq!(nonce, 7);
    }
}
