//! OpenTelemetry span helpers for batch operations
//!
//! Span names are static and prefixed `permit2_bridge.`; identifiers travel as
//! structured attributes. Every span declares the `error.*` and
//! `otel.status_code` fields so [`record_error`] and
//! [`record_error_with_context`] can fill them in on failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use permit2_bridge::spans;
//! use alloy_chains::NamedChain;
//!
//! let span = spans::prepare_relation(
//!     0,
//!     "base-sepolia->arbitrum-sepolia",
//!     &NamedChain::BaseSepolia,
//!     &NamedChain::ArbitrumSepolia,
//! );
//! let _guard = span.enter();
//! ```

use alloy_chains::NamedChain;
use alloy_primitives::{Address, TxHash};
use tracing::Span;

/// Create span for the sequential preparation pass over a batch.
///
/// Parent: Caller's span
/// Children: permit2_bridge.prepare_relation (one per relation)
#[inline]
pub fn prepare_batch(owner: &Address, relations: usize) -> Span {
    tracing::info_span!(
        "permit2_bridge.prepare_batch",
        owner = %owner,
        relations = relations,
        prepared = tracing::field::Empty,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for preparing a single relation.
///
/// Parent: permit2_bridge.prepare_batch
/// Children: approve, nonce scan and device signature spans
#[inline]
pub fn prepare_relation(
    index: usize,
    relation: &str,
    source_chain: &NamedChain,
    destination_chain: &NamedChain,
) -> Span {
    tracing::info_span!(
        "permit2_bridge.prepare_relation",
        index = index,
        relation = %relation,
        source_chain = %source_chain,
        destination_chain = %destination_chain,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for the one-time ERC20 approval of Permit2.
///
/// Parent: permit2_bridge.prepare_relation
/// Children: permit2_bridge.device_signature, permit2_bridge.wait_for_receipt
#[inline]
pub fn approve_permit2(token: &Address, permit2: &Address, chain: &NamedChain) -> Span {
    tracing::info_span!(
        "permit2_bridge.approve_permit2",
        token = %token,
        permit2 = %permit2,
        chain = %chain,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for scanning nonce bitmap words for an unused nonce.
#[inline]
pub fn scan_permit_nonce(owner: &Address, chain: &NamedChain, max_words: u32) -> Span {
    tracing::debug_span!(
        "permit2_bridge.scan_permit_nonce",
        owner = %owner,
        chain = %chain,
        max_words = max_words,
    )
}

/// Create span for one request to the signing device.
///
/// `kind` is `"permit"`, `"approve_transaction"` or `"bridge_transaction"`.
///
/// Parent: permit2_bridge.prepare_relation
/// Children: None
#[inline]
pub fn device_signature(kind: &'static str, chain: &NamedChain, timeout_secs: u64) -> Span {
    tracing::info_span!(
        "permit2_bridge.device_signature",
        kind = kind,
        chain = %chain,
        timeout_secs = timeout_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for the concurrent broadcast of a prepared batch.
///
/// Parent: Caller's span
/// Children: permit2_bridge.broadcast_relation (one per prepared relation)
#[inline]
pub fn send_batch(transactions: usize) -> Span {
    tracing::info_span!(
        "permit2_bridge.send_batch",
        transactions = transactions,
        successful = tracing::field::Empty,
        failed = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for broadcasting one signed transaction.
#[inline]
pub fn broadcast_relation(relation: &str, chain: &NamedChain, tx_hash: TxHash) -> Span {
    tracing::info_span!(
        "permit2_bridge.broadcast_relation",
        relation = %relation,
        chain = %chain,
        tx_hash = %tx_hash,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Create span for polling a transaction receipt.
#[inline]
pub fn wait_for_receipt(tx_hash: TxHash, max_attempts: u32, poll_interval_secs: u64) -> Span {
    tracing::info_span!(
        "permit2_bridge.wait_for_receipt",
        tx_hash = %tx_hash,
        max_attempts = max_attempts,
        poll_interval_secs = poll_interval_secs,
        error.type = tracing::field::Empty,
        error.message = tracing::field::Empty,
        error.context = tracing::field::Empty,
        otel.status_code = "OK",
    )
}

/// Record error attributes on the current span.
///
/// Follows OpenTelemetry semantic conventions: `error.type` holds the leading
/// part of the message and `error.message` the whole of it.
pub fn record_error<E: std::error::Error>(error: &E) {
    let message = error.to_string();
    let current_span = tracing::Span::current();
    current_span.record(
        "error.type",
        message.split(':').next().unwrap_or("Unknown"),
    );
    current_span.record("error.message", message.as_str());
    current_span.record("otel.status_code", "ERROR");

    if let Some(source) = error.source() {
        current_span.record("error.context", source.to_string());
    }
}

/// Record error attributes with custom context on the current span.
pub fn record_error_with_context(
    error_type: &str,
    error_message: &str,
    additional_context: Option<&str>,
) {
    let current_span = tracing::Span::current();
    current_span.record("error.type", error_type);
    current_span.record("error.message", error_message);
    current_span.record("otel.status_code", "ERROR");

    if let Some(context) = additional_context {
        current_span.record("error.context", context);
    }
}
