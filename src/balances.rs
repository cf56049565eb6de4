// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Balance reads for showing what a batch would move.
//!
//! Reads for one chain run concurrently through [`futures::join!`]; reads
//! across chains in [`account_overview`] do too.
//!
//! # Example
//!
//! ```rust,ignore
//! use permit2_bridge::balances::account_overview;
//!
//! for state in account_overview(&registry, &clients, owner).await {
//!     println!("{state}");
//! }
//! ```

use alloy_chains::NamedChain;
use alloy_primitives::{
    utils::{format_ether, format_units},
    Address, U256,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::chain::{ChainConfig, ChainRegistry};
use crate::error::Result;
use crate::protocol::USDC_DECIMALS;
use crate::traits::ChainClient;

/// USDC balance of `owner` on the chain `config` describes.
pub async fn token_balance<C: ChainClient>(
    client: &C,
    config: &ChainConfig,
    owner: Address,
) -> Result<U256> {
    let balance = client.token_balance(config.usdc(), owner).await?;
    debug!(
        chain = %config.chain(),
        owner = %owner,
        balance = %balance,
        event = "usdc_balance_retrieved"
    );
    Ok(balance)
}

/// Native balance of `owner`, which pays for gas and bridge fees.
pub async fn native_balance<C: ChainClient>(client: &C, owner: Address) -> Result<U256> {
    let balance = client.native_balance(owner).await?;
    debug!(owner = %owner, balance = %balance, event = "native_balance_retrieved");
    Ok(balance)
}

/// Owner's funds on one chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub chain: NamedChain,
    /// USDC, in base units
    pub usdc: U256,
    /// Native token, in wei
    pub native: U256,
    /// USDC allowance granted to Permit2
    pub permit2_allowance: U256,
}

impl AccountState {
    /// Whether moving `amount` needs a Permit2 approval first.
    pub fn needs_approval(&self, amount: U256) -> bool {
        self.permit2_allowance < amount
    }

    pub fn has_sufficient_balance(&self, amount: U256) -> bool {
        self.usdc >= amount
    }

    /// Whether anything can be bridged: some USDC and some gas.
    pub fn can_bridge(&self) -> bool {
        !self.usdc.is_zero() && !self.native.is_zero()
    }
}

impl fmt::Display for AccountState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let usdc = format_units(self.usdc, USDC_DECIMALS).unwrap_or_else(|_| self.usdc.to_string());
        write!(
            f,
            "{}: {usdc} USDC, {} ETH",
            self.chain,
            format_ether(self.native)
        )
    }
}

/// Reads balances and the Permit2 allowance on one chain.
pub async fn account_state<C: ChainClient>(
    client: &C,
    config: &ChainConfig,
    owner: Address,
) -> Result<AccountState> {
    let (usdc, native, allowance) = futures::join!(
        token_balance(client, config, owner),
        native_balance(client, owner),
        client.token_allowance(config.usdc(), owner, config.permit2()),
    );

    Ok(AccountState {
        chain: config.chain(),
        usdc: usdc?,
        native: native?,
        permit2_allowance: allowance?,
    })
}

/// Reads [`AccountState`] on every registered chain that has a client.
///
/// Chains whose reads fail are logged and left out.
pub async fn account_overview<C: ChainClient>(
    registry: &ChainRegistry,
    clients: &HashMap<NamedChain, C>,
    owner: Address,
) -> Vec<AccountState> {
    let reads = registry.chains().filter_map(|config| {
        clients
            .get(&config.chain())
            .map(|client| async move { (config.chain(), account_state(client, config, owner).await) })
    });

    join_all(reads)
        .await
        .into_iter()
        .filter_map(|(chain, state)| match state {
            Ok(state) => Some(state),
            Err(err) => {
                warn!(chain = %chain, error = %err, event = "account_state_unavailable");
                None
            }
        })
        .collect()
}
