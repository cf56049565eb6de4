//! Production implementations of the seams in [`crate::traits`].
//!
//! [`AlloyChainClient`] talks JSON-RPC to a chain, [`HardwareDevice`] adapts an
//! alloy signer (a Ledger with the `ledger` feature) and [`TokioClock`] sleeps
//! on the Tokio timer.

mod alloy;
mod device;
mod tokio_clock;

pub use self::alloy::AlloyChainClient;
pub use self::device::HardwareDevice;
pub use self::tokio_clock::TokioClock;
