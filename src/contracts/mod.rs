//! Contract bindings
//!
//! This module contains Alloy-generated contract bindings and instrumented
//! wrappers for the three contracts a transfer touches: the USDC token, the
//! Permit2 singleton, and the bridge validator.
//!
//! Reads go through wrappers generic over any alloy `Provider`; writes are
//! exposed as calldata builders so transactions can be signed raw on a
//! hardware device.

pub mod erc20;
pub mod permit2;
pub mod validator;
