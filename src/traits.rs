//! Core trait abstractions for batch bridging.
//!
//! The orchestrator talks to the outside world through three seams: chain RPC
//! ([`ChainClient`]), the hardware signer ([`DeviceSigner`]) and time
//! ([`Clock`]). Production implementations live in [`crate::providers`]; the
//! fakes in [`crate::testing`] script them for tests, including failure modes
//! such as a rejected signature or a dropped broadcast.
//!
//! # Example: Implementing a Test Fake
//!
//! ```rust,ignore
//! use permit2_bridge::{ChainClient, Result};
//!
//! struct ReadOnlyClient {
//!     chain_id: u64,
//! }
//!
//! #[async_trait::async_trait]
//! impl ChainClient for ReadOnlyClient {
//!     async fn chain_id(&self) -> Result<u64> {
//!         Ok(self.chain_id)
//!     }
//!     // ...
//! }
//! ```

use alloy_consensus::TxEip1559;
use alloy_primitives::{Address, Signature, TxHash, U256};
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use std::time::{Duration, Instant};

use crate::contracts::validator::BridgeRequest;
use crate::error::Result;
use crate::protocol::{NonceBitmap, PermitSingle, PermitTransferFrom};

/// Trait for the per-chain RPC operations the orchestrator performs.
///
/// One client serves one chain. Reads are issued during the sequential
/// preparation pass; `send_raw_transaction` is also called concurrently
/// across chains during broadcast.
///
/// # Test Scenarios
///
/// Implementing this trait with fakes enables testing:
/// - Zero balances and missing allowances
/// - Exhausted nonce bitmap words
/// - RPC pointing at the wrong chain
/// - Broadcast rejections on one chain of a batch
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain id reported by the RPC endpoint.
    async fn chain_id(&self) -> Result<u64>;

    /// Next account nonce for `owner`, counting pending transactions.
    async fn pending_nonce(&self, owner: Address) -> Result<u64>;

    /// Timestamp of the latest block, in seconds.
    async fn latest_block_timestamp(&self) -> Result<u64>;

    /// ERC20 balance of `owner`.
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;

    /// ERC20 allowance `owner` has granted `spender`.
    async fn token_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256>;

    /// One word of `owner`'s Permit2 SignatureTransfer nonce bitmap.
    async fn nonce_bitmap(&self, permit2: Address, owner: Address, word: U256)
        -> Result<NonceBitmap>;

    /// Native fee the validator charges for `request`.
    async fn quote_bridge(&self, validator: Address, request: &BridgeRequest) -> Result<U256>;

    /// Native balance of `owner`.
    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// Broadcasts an EIP-2718 encoded signed transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the node rejects the transaction.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash>;

    /// Waits until `tx_hash` is mined.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::TransactionFailed`](crate::BridgeError::TransactionFailed)
    /// if it reverted and [`BridgeError::ReceiptTimeout`](crate::BridgeError::ReceiptTimeout)
    /// if it was not mined in time.
    async fn wait_for_success(&self, tx_hash: TxHash) -> Result<()>;
}

/// Trait for the signing device holding the owner's key.
///
/// Each call may block on a human confirming on the device. Callers issue
/// requests one at a time and bound them with a timeout.
#[async_trait]
pub trait DeviceSigner: Send + Sync {
    /// Address of the signing account.
    fn address(&self) -> Address;

    /// Signs a SignatureTransfer permit as EIP-712 typed data.
    async fn sign_permit(
        &self,
        permit: &PermitTransferFrom,
        domain: &Eip712Domain,
    ) -> Result<Signature>;

    /// Signs an AllowanceTransfer permit as EIP-712 typed data.
    async fn sign_permit_single(
        &self,
        permit: &PermitSingle,
        domain: &Eip712Domain,
    ) -> Result<Signature>;

    /// Signs a transaction's signature hash.
    async fn sign_transaction(&self, tx: &mut TxEip1559) -> Result<Signature>;
}

/// Trait for time-based operations.
///
/// Receipt polling sleeps through this trait so tests can fast-forward.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Asynchronously sleeps for the given duration.
    async fn sleep(&self, duration: Duration);

    /// Returns the current instant in time.
    fn now(&self) -> Instant;
}
