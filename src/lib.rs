//! # permit2-bridge
//!
//! Batch cross-chain USDC transfers from a single hardware-wallet account,
//! using Permit2 signature transfers and a LayerZero bridge validator.
//!
//! Each [`Relation`] moves a share of the owner's USDC from one chain to
//! another. The owner signs a Permit2 `PermitTransferFrom` for the source
//! chain's validator, then signs the raw transaction that hands the permit to
//! `receiveAndBridgeGasless`. Signing happens one request at a time on the
//! device; the signed transactions are then broadcast to every chain at once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use permit2_bridge::{BatchBridge, BatchConfig, BridgeError, ChainRegistry, Relation};
//! use permit2_bridge::providers::{AlloyChainClient, HardwareDevice};
//! use alloy_chains::NamedChain;
//! use alloy_signer_local::PrivateKeySigner;
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), BridgeError> {
//! let registry = ChainRegistry::sepolia_testnets().with_env_overrides()?;
//! let clients: HashMap<_, _> = registry
//!     .chains()
//!     .map(|config| (config.chain(), AlloyChainClient::connect(config)))
//!     .collect();
//!
//! let bridge = BatchBridge::builder()
//!     .registry(registry)
//!     .clients(clients)
//!     .device(HardwareDevice::new(PrivateKeySigner::random()))
//!     .config(BatchConfig::default().with_slippage_bps(50))
//!     .build();
//!
//! let relations = [
//!     Relation::new(NamedChain::BaseSepolia, NamedChain::ArbitrumSepolia),
//!     "sepolia->optimism-sepolia:25".parse()?,
//! ];
//!
//! // Sign everything first, then broadcast.
//! let prepared = bridge.prepare(&relations).await;
//! for relation in prepared.prepared() {
//!     println!("{relation}");
//! }
//! let report = bridge.send(prepared).await;
//!
//! if !report.all_succeeded() {
//!     for outcome in report.failed() {
//!         eprintln!("{outcome}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! With the `ledger` feature, `HardwareDevice::ledger(HDPath::Legacy(0))`
//! signs on a connected Ledger instead.
//!
//! ## Failure Model
//!
//! A relation that cannot be prepared (wrong chain id behind the RPC URL,
//! rejected on the device, no free permit nonce) is reported as failed and
//! the batch moves on. Relations with nothing to move are skipped. Broadcast
//! failures are isolated per relation and nothing is rolled back.
//!
//! ## Public API
//!
//! - [`BatchBridge`], [`Relation`] and [`BatchReport`] - batch orchestration
//! - [`ChainRegistry`] and [`ChainConfig`] - supported chains and addresses
//! - [`ChainClient`], [`DeviceSigner`] and [`Clock`] - the I/O seams, with
//!   implementations in [`providers`] and fakes in [`testing`]
//! - [`PermitTransferFrom`], [`NonceBitmap`], [`LzOptions`] - protocol types
//! - [`contracts`] - typed bindings for USDC, Permit2 and the validator
//! - [`BridgeError`] and [`Result`] - error types

mod batch;
mod chain;
mod error;
mod protocol;
mod traits;
mod transaction;

pub mod balances;
pub mod contracts;
pub mod providers;
pub mod testing;

pub use batch::{
    BatchBridge, BatchConfig, BatchReport, FailureStage, GasConfig, PollingConfig, PreparedBatch,
    PreparedRelation, Relation, RelationOutcome, RelationStatus,
};
pub use chain::{
    ChainConfig, ChainRegistry, ARBITRUM_SEPOLIA_RPC_URL, ARBITRUM_SEPOLIA_USDC_ADDRESS,
    ARBITRUM_SEPOLIA_VALIDATOR_ADDRESS, BASE_SEPOLIA_RPC_URL, BASE_SEPOLIA_USDC_ADDRESS,
    BASE_SEPOLIA_VALIDATOR_ADDRESS, ETHEREUM_SEPOLIA_RPC_URL, ETHEREUM_SEPOLIA_USDC_ADDRESS,
    ETHEREUM_SEPOLIA_VALIDATOR_ADDRESS, OPTIMISM_SEPOLIA_RPC_URL, OPTIMISM_SEPOLIA_USDC_ADDRESS,
    OPTIMISM_SEPOLIA_VALIDATOR_ADDRESS, PERMIT2_ADDRESS,
};
pub use error::{BridgeError, Result};
pub use protocol::{
    apply_slippage, default_extra_options, format_usdc, parse_usdc, permit2_domain, share_of,
    typed_data_json, EndpointId, InvalidEndpointId, LzOptions, NonceBitmap, PermitDetails,
    PermitSingle, PermitTransferFrom, TokenPermissions, DEFAULT_LZ_RECEIVE_GAS, MAX_BPS,
    PERMIT2_DOMAIN_NAME, USDC_DECIMALS,
};
pub use traits::{ChainClient, Clock, DeviceSigner};
pub use transaction::{eip1559_transaction, encode_signed, SignedTransaction};

// Public module for advanced users who need custom instrumentation
pub mod spans;
