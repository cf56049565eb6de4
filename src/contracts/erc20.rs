// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! ERC20 contract bindings for balance and Permit2 approval operations
//!
//! Permit2 can only move tokens the owner has approved it for, so every source
//! chain needs a one-time `approve(Permit2, max)` before its first gasless
//! transfer.

use alloy_network::Ethereum;
use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use Erc20::{approveCall, Erc20Instance};

/// ERC20 contract wrapper
///
/// # Example
///
/// ```rust,no_run
/// use permit2_bridge::contracts::erc20::{approve_calldata, Erc20Contract};
/// use permit2_bridge::PERMIT2_ADDRESS;
/// use alloy_primitives::{address, U256};
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new().connect("https://sepolia.base.org").await?;
/// let usdc = address!("036cbd53842c5426634e7929541ec2318f3dcf7e");
/// let owner = address!("1234567890123456789012345678901234567890");
///
/// let erc20 = Erc20Contract::new(usdc, provider);
/// let allowance = erc20.allowance(owner, PERMIT2_ADDRESS).await?;
///
/// if allowance < U256::from(1_000_000u64) {
///     let calldata = approve_calldata(PERMIT2_ADDRESS, U256::MAX);
///     // Sign and send calldata to the token...
/// }
/// # Ok(())
/// # }
/// ```
pub struct Erc20Contract<P: Provider<Ethereum>> {
    instance: Erc20Instance<P>,
}

impl<P: Provider<Ethereum>> Erc20Contract<P> {
    /// Create a new ERC20 contract wrapper
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "erc20_contract_initialized"
        );
        Self {
            instance: Erc20Instance::new(address, provider),
        }
    }

    /// Get the current allowance for a spender
    ///
    /// # Arguments
    ///
    /// * `owner` - The address that owns the tokens
    /// * `spender` - The address that is allowed to spend the tokens
    pub async fn allowance(
        &self,
        owner: Address,
        spender: Address,
    ) -> Result<U256, alloy_contract::Error> {
        debug!(
            owner = %owner,
            spender = %spender,
            contract_address = %self.instance.address(),
            event = "checking_allowance"
        );

        let result = self.instance.allowance(owner, spender).call().await?;

        info!(
            owner = %owner,
            spender = %spender,
            allowance = %result,
            contract_address = %self.instance.address(),
            event = "allowance_retrieved"
        );

        Ok(result)
    }

    /// Get the token balance of an address
    pub async fn balance_of(&self, account: Address) -> Result<U256, alloy_contract::Error> {
        debug!(
            account = %account,
            contract_address = %self.instance.address(),
            event = "checking_balance"
        );

        let result = self.instance.balanceOf(account).call().await?;

        info!(
            account = %account,
            balance = %result,
            contract_address = %self.instance.address(),
            event = "balance_retrieved"
        );

        Ok(result)
    }

    /// Get the token's decimals
    pub async fn decimals(&self) -> Result<u8, alloy_contract::Error> {
        self.instance.decimals().call().await
    }

    /// Returns the contract address
    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

/// Calldata for `approve(spender, amount)`
///
/// The orchestrator signs approvals as raw transactions on the device, so this
/// returns encoded calldata rather than a `TransactionRequest`.
pub fn approve_calldata(spender: Address, amount: U256) -> Bytes {
    info!(
        spender = %spender,
        amount = %amount,
        event = "approve_calldata_created"
    );
    approveCall { spender, amount }.abi_encode().into()
}

// Minimal ERC20 interface for balance and approval operations
sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Erc20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
    }
);
