//! Chain configuration and contract addresses
//!
//! This module contains the chain table the batch orchestrator resolves
//! relations against: RPC endpoints, USDC, Permit2 and validator addresses, and
//! LayerZero endpoint IDs.

mod addresses;
mod registry;

pub use addresses::*;
pub use registry::{ChainConfig, ChainRegistry};
