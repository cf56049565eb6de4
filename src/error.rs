use alloy_chains::NamedChain;
use alloy_primitives::{Address, TxHash};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Chain not supported: {0}")]
    UnsupportedChain(NamedChain),

    #[error("Chain not configured: {chain}")]
    ChainNotConfigured { chain: NamedChain },

    #[error("No RPC client registered for {chain}")]
    MissingClient { chain: NamedChain },

    #[error("Chain id mismatch: expected {expected}, RPC reported {actual}")]
    ChainIdMismatch { expected: u64, actual: u64 },

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Contract call failed: {0}")]
    ContractCall(String),

    #[error("Device signing failed: {0}")]
    Signing(String),

    #[error("Device did not answer {operation} request within {timeout_secs}s")]
    DeviceTimeout {
        operation: &'static str,
        timeout_secs: u64,
    },

    #[error("No unused Permit2 nonce for {owner} in the first {words_scanned} bitmap words")]
    NonceSpaceExhausted { owner: Address, words_scanned: u32 },

    #[error("Nothing to transfer: {reason}")]
    ZeroAmount { reason: String },

    #[error("Transaction failed: {reason}")]
    TransactionFailed { reason: String },

    #[error("Timed out waiting for receipt of {tx_hash}")]
    ReceiptTimeout { tx_hash: TxHash },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("RPC error: {0}")]
    Rpc(#[from] alloy_json_rpc::RpcError<alloy_transport::TransportErrorKind>),

    #[error("ABI encoding/decoding error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Hex conversion error: {0}")]
    Hex(#[from] alloy_primitives::hex::FromHexError),
}

impl From<alloy_contract::Error> for BridgeError {
    fn from(err: alloy_contract::Error) -> Self {
        BridgeError::ContractCall(err.to_string())
    }
}

impl From<alloy_signer::Error> for BridgeError {
    fn from(err: alloy_signer::Error) -> Self {
        BridgeError::Signing(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
