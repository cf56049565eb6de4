//! Test utilities and fake implementations of the batch seams
//!
//! These fakes stand in for RPC nodes and the hardware device so batch
//! behaviour can be exercised without a network or a Ledger. They cover the
//! adversarial cases the orchestrator has to survive:
//!
//! - RPC endpoints that report the wrong chain or fail reads
//! - Exhausted nonce bitmap words
//! - A user rejecting a request on the device, or never answering it
//! - Nodes rejecting a broadcast or answering slowly

use alloy_consensus::TxEip1559;
use alloy_primitives::{keccak256, Address, Bytes, Signature, TxHash, U256};
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::contracts::validator::BridgeRequest;
use crate::error::{BridgeError, Result};
use crate::protocol::{NonceBitmap, PermitSingle, PermitTransferFrom};
use crate::traits::{ChainClient, Clock, DeviceSigner};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Fake Chain Client
// ============================================================================

#[derive(Debug, Default)]
struct ChainState {
    chain_id: u64,
    pending_nonce: u64,
    block_timestamp: u64,
    quote_fee: U256,
    balances: HashMap<(Address, Address), U256>,
    native_balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
    nonce_words: HashMap<U256, U256>,
    read_failure: Option<String>,
    quote_failure: Option<String>,
    broadcast_failure: Option<String>,
    broadcast_delay: Option<Duration>,
    revert_receipts: bool,
    sent: Vec<Bytes>,
    quotes: Vec<BridgeRequest>,
    awaited: Vec<TxHash>,
}

/// A scripted chain that records what it is asked to broadcast.
///
/// Clones share state, so a test can keep a handle after moving the client
/// into a [`BatchBridge`](crate::BatchBridge).
///
/// Broadcasts return `keccak256(raw)` as the hash, matching a real node, and
/// bump the pending account nonce.
///
/// # Example
///
/// ```rust
/// use permit2_bridge::testing::FakeChainClient;
/// use alloy_primitives::{Address, U256};
///
/// let client = FakeChainClient::new(84532)
///     .with_balance(Address::repeat_byte(1), Address::repeat_byte(2), U256::from(10u64));
/// ```
#[derive(Clone, Debug, Default)]
pub struct FakeChainClient {
    state: Arc<Mutex<ChainState>>,
}

impl FakeChainClient {
    pub fn new(chain_id: u64) -> Self {
        let client = Self::default();
        {
            let mut state = lock(&client.state);
            state.chain_id = chain_id;
            state.block_timestamp = 1_700_000_000;
        }
        client
    }

    pub fn with_balance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.set_balance(token, owner, amount);
        self
    }

    pub fn with_allowance(
        self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Self {
        self.set_allowance(token, owner, spender, amount);
        self
    }

    pub fn with_pending_nonce(self, nonce: u64) -> Self {
        lock(&self.state).pending_nonce = nonce;
        self
    }

    pub fn with_block_timestamp(self, timestamp: u64) -> Self {
        lock(&self.state).block_timestamp = timestamp;
        self
    }

    pub fn with_quote_fee(self, fee: U256) -> Self {
        lock(&self.state).quote_fee = fee;
        self
    }

    /// Sets the bits of one nonce bitmap word. Unset words read as zero.
    pub fn with_nonce_word(self, word: u64, bits: U256) -> Self {
        lock(&self.state).nonce_words.insert(U256::from(word), bits);
        self
    }

    pub fn with_native_balance(self, owner: Address, amount: U256) -> Self {
        lock(&self.state).native_balances.insert(owner, amount);
        self
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        lock(&self.state).balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        lock(&self.state)
            .allowances
            .insert((token, owner, spender), amount);
    }

    /// Report `chain_id` instead of the configured one
    pub fn set_chain_id(&self, chain_id: u64) {
        lock(&self.state).chain_id = chain_id;
    }

    /// Make every read fail with a provider error
    pub fn fail_reads(&self, reason: &str) {
        lock(&self.state).read_failure = Some(reason.to_string());
    }

    /// Make `quote_bridge` fail
    pub fn fail_quotes(&self, reason: &str) {
        lock(&self.state).quote_failure = Some(reason.to_string());
    }

    /// Make `send_raw_transaction` fail
    pub fn fail_broadcasts(&self, reason: &str) {
        lock(&self.state).broadcast_failure = Some(reason.to_string());
    }

    /// Stall every `send_raw_transaction` for `delay` before answering
    pub fn delay_broadcasts(&self, delay: Duration) {
        lock(&self.state).broadcast_delay = Some(delay);
    }

    /// Make `wait_for_success` report a revert
    pub fn revert_receipts(&self) {
        lock(&self.state).revert_receipts = true;
    }

    /// Raw transactions received, in broadcast order
    pub fn sent_transactions(&self) -> Vec<Bytes> {
        lock(&self.state).sent.clone()
    }

    /// Requests passed to `quote_bridge`
    pub fn quoted_requests(&self) -> Vec<BridgeRequest> {
        lock(&self.state).quotes.clone()
    }

    /// Hashes passed to `wait_for_success`
    pub fn awaited_receipts(&self) -> Vec<TxHash> {
        lock(&self.state).awaited.clone()
    }

    fn check_reads(&self) -> Result<()> {
        match &lock(&self.state).read_failure {
            Some(reason) => Err(BridgeError::Provider(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn chain_id(&self) -> Result<u64> {
        self.check_reads()?;
        Ok(lock(&self.state).chain_id)
    }

    async fn pending_nonce(&self, _owner: Address) -> Result<u64> {
        self.check_reads()?;
        Ok(lock(&self.state).pending_nonce)
    }

    async fn latest_block_timestamp(&self) -> Result<u64> {
        self.check_reads()?;
        Ok(lock(&self.state).block_timestamp)
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn nonce_bitmap(
        &self,
        _permit2: Address,
        _owner: Address,
        word: U256,
    ) -> Result<NonceBitmap> {
        self.check_reads()?;
        let bits = lock(&self.state)
            .nonce_words
            .get(&word)
            .copied()
            .unwrap_or_default();
        Ok(NonceBitmap::new(word, bits))
    }

    async fn quote_bridge(&self, _validator: Address, request: &BridgeRequest) -> Result<U256> {
        self.check_reads()?;
        let mut state = lock(&self.state);
        if let Some(reason) = &state.quote_failure {
            return Err(BridgeError::ContractCall(reason.clone()));
        }
        state.quotes.push(request.clone());
        Ok(state.quote_fee)
    }

    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.check_reads()?;
        Ok(lock(&self.state)
            .native_balances
            .get(&owner)
            .copied()
            .unwrap_or_default())
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash> {
        let delay = lock(&self.state).broadcast_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = lock(&self.state);
        if let Some(reason) = &state.broadcast_failure {
            return Err(BridgeError::Provider(reason.clone()));
        }
        state.sent.push(Bytes::copy_from_slice(raw));
        state.pending_nonce += 1;
        Ok(keccak256(raw))
    }

    async fn wait_for_success(&self, tx_hash: TxHash) -> Result<()> {
        let mut state = lock(&self.state);
        state.awaited.push(tx_hash);
        if state.revert_receipts {
            return Err(BridgeError::TransactionFailed {
                reason: format!("transaction {tx_hash} reverted"),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Scripted Device
// ============================================================================

/// What a device was asked to sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceRequest {
    Permit { chain_id: u64, nonce: U256 },
    PermitSingle { chain_id: u64 },
    Transaction { chain_id: u64, nonce: u64 },
}

#[derive(Debug, Default)]
struct Script {
    rejected: HashSet<usize>,
    delayed: HashMap<usize, Duration>,
    requests: Vec<DeviceRequest>,
}

/// Wraps a [`DeviceSigner`] to inject user behaviour.
///
/// Requests are numbered from zero in the order they arrive. A rejected
/// request fails with [`BridgeError::Signing`]; a delayed request sleeps on
/// the tokio timer first, so a paused runtime can drive it past the signing
/// timeout. The wrapper also tracks how many requests were in flight at once.
#[derive(Clone, Debug)]
pub struct ScriptedDevice<D> {
    inner: D,
    script: Arc<Mutex<Script>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl<D: DeviceSigner> ScriptedDevice<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            script: Arc::new(Mutex::new(Script::default())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The user presses "reject" on request `index`
    pub fn reject_request(&self, index: usize) {
        lock(&self.script).rejected.insert(index);
    }

    /// The user takes `delay` to answer request `index`
    pub fn delay_request(&self, index: usize, delay: Duration) {
        lock(&self.script).delayed.insert(index, delay);
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<DeviceRequest> {
        lock(&self.script).requests.clone()
    }

    /// Highest number of requests that were pending at the same time
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, request: DeviceRequest) -> Result<InFlight<'_>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        let (index, rejected, delay) = {
            let mut script = lock(&self.script);
            let index = script.requests.len();
            script.requests.push(request);
            (
                index,
                script.rejected.contains(&index),
                script.delayed.get(&index).copied(),
            )
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if rejected {
            return Err(BridgeError::Signing(format!(
                "request {index} rejected on device"
            )));
        }
        Ok(guard)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl<D: DeviceSigner> DeviceSigner for ScriptedDevice<D> {
    fn address(&self) -> Address {
        self.inner.address()
    }

    async fn sign_permit(
        &self,
        permit: &PermitTransferFrom,
        domain: &Eip712Domain,
    ) -> Result<Signature> {
        let chain_id = domain.chain_id.map(|id| id.to::<u64>()).unwrap_or_default();
        let _guard = self
            .enter(DeviceRequest::Permit {
                chain_id,
                nonce: permit.nonce,
            })
            .await?;
        self.inner.sign_permit(permit, domain).await
    }

    async fn sign_permit_single(
        &self,
        permit: &PermitSingle,
        domain: &Eip712Domain,
    ) -> Result<Signature> {
        let chain_id = domain.chain_id.map(|id| id.to::<u64>()).unwrap_or_default();
        let _guard = self.enter(DeviceRequest::PermitSingle { chain_id }).await?;
        self.inner.sign_permit_single(permit, domain).await
    }

    async fn sign_transaction(&self, tx: &mut TxEip1559) -> Result<Signature> {
        let _guard = self
            .enter(DeviceRequest::Transaction {
                chain_id: tx.chain_id,
                nonce: tx.nonce,
            })
            .await?;
        self.inner.sign_transaction(tx).await
    }
}

// ============================================================================
// Fake Clock
// ============================================================================

/// A fake clock that allows fast-forwarding time in tests.
///
/// Receipt polling sleeps through it without actually waiting.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current_time: Arc<Mutex<Instant>>,
    sleep_log: Arc<Mutex<Vec<Duration>>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self {
            current_time: Arc::new(Mutex::new(Instant::now())),
            sleep_log: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-forward the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        *lock(&self.current_time) += duration;
    }

    /// Get the total time "slept" by this clock
    pub fn total_sleep_time(&self) -> Duration {
        lock(&self.sleep_log).iter().sum()
    }

    /// Get the number of times sleep was called
    pub fn sleep_count(&self) -> usize {
        lock(&self.sleep_log).len()
    }
}

#[async_trait]
impl Clock for FakeClock {
    async fn sleep(&self, duration: Duration) {
        lock(&self.sleep_log).push(duration);
        self.advance(duration);
    }

    fn now(&self) -> Instant {
        *lock(&self.current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HardwareDevice;
    use alloy_signer_local::PrivateKeySigner;

    #[tokio::test]
    async fn test_fake_clock_tracks_sleep_calls() {
        let clock = FakeClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_secs(2)).await;
        clock.sleep(Duration::from_secs(3)).await;

        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.total_sleep_time(), Duration::from_secs(5));
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_fake_chain_client_broadcast_bumps_nonce() {
        let client = FakeChainClient::new(84532).with_pending_nonce(7);
        let owner = Address::repeat_byte(0x01);

        let hash = client.send_raw_transaction(&[0x02, 0xaa]).await.unwrap();

        assert_eq!(hash, keccak256([0x02, 0xaa]));
        assert_eq!(client.pending_nonce(owner).await.unwrap(), 8);
        assert_eq!(client.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_fake_chain_client_failures() {
        let client = FakeChainClient::new(1);
        client.fail_broadcasts("nonce too low");
        client.fail_reads("connection refused");

        assert!(matches!(
            client.send_raw_transaction(&[0x01]).await,
            Err(BridgeError::Provider(reason)) if reason == "nonce too low"
        ));
        assert!(matches!(
            client.chain_id().await,
            Err(BridgeError::Provider(_))
        ));
        assert!(client.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_fake_chain_client_unset_word_is_empty() {
        let client = FakeChainClient::new(1).with_nonce_word(0, U256::MAX);
        let owner = Address::repeat_byte(0x01);

        let full = client
            .nonce_bitmap(Address::ZERO, owner, U256::ZERO)
            .await
            .unwrap();
        let next = client
            .nonce_bitmap(Address::ZERO, owner, U256::from(1u64))
            .await
            .unwrap();

        assert_eq!(full.first_unused(), None);
        assert_eq!(next.first_unused(), Some(U256::from(256u64)));
    }

    #[tokio::test]
    async fn test_scripted_device_rejects_selected_request() {
        let device = ScriptedDevice::new(HardwareDevice::new(PrivateKeySigner::random()));
        device.reject_request(1);

        let mut tx = TxEip1559 {
            chain_id: 84532,
            ..Default::default()
        };
        assert!(device.sign_transaction(&mut tx).await.is_ok());
        let second = device.sign_transaction(&mut tx).await;

        assert!(matches!(second, Err(BridgeError::Signing(_))));
        assert_eq!(device.requests().len(), 2);
        assert_eq!(device.max_in_flight(), 1);
    }
}
