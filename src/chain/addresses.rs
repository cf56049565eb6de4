// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Contract addresses for the supported testnets
//!
//! This module centralizes the Permit2, USDC and bridge validator addresses for
//! every chain in the built-in registry.

use alloy_primitives::{address, Address};

/// Canonical Permit2 deployment, identical on every EVM chain.
///
/// <https://docs.uniswap.org/contracts/v4/deployments>
pub const PERMIT2_ADDRESS: Address = address!("000000000022d473030f116ddee9f6b43ac78ba3");

// USDC Addresses

/// <https://sepolia.etherscan.io/address/0x07b091cC0eef5b03A41eB4bDD059B388cd3560D1>
pub const ETHEREUM_SEPOLIA_USDC_ADDRESS: Address =
    address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1");

/// <https://sepolia.arbiscan.io/address/0x004690Ee41C0Dd2AcEf094D01b93b60aa9a06bb9>
pub const ARBITRUM_SEPOLIA_USDC_ADDRESS: Address =
    address!("004690ee41c0dd2acef094d01b93b60aa9a06bb9");

/// <https://sepolia.basescan.org/address/0x036CbD53842c5426634e7929541eC2318f3dCF7e>
pub const BASE_SEPOLIA_USDC_ADDRESS: Address =
    address!("036cbd53842c5426634e7929541ec2318f3dcf7e");

/// <https://sepolia-optimism.etherscan.io/address/0x4cd092a9d4623Fa16411F65d0339B5815895Ca24>
pub const OPTIMISM_SEPOLIA_USDC_ADDRESS: Address =
    address!("4cd092a9d4623fa16411f65d0339b5815895ca24");

// Bridge Validator Addresses

pub const ETHEREUM_SEPOLIA_VALIDATOR_ADDRESS: Address =
    address!("d3605455441b7bf57489e05d6b1b678e269bde3f");

pub const ARBITRUM_SEPOLIA_VALIDATOR_ADDRESS: Address =
    address!("bd57b37fef0fda7151a0c0bda957ae37bd84ab6b");

pub const BASE_SEPOLIA_VALIDATOR_ADDRESS: Address =
    address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1");

pub const OPTIMISM_SEPOLIA_VALIDATOR_ADDRESS: Address =
    address!("004690ee41c0dd2acef094d01b93b60aa9a06bb9");

// Public RPC Endpoints

pub const ETHEREUM_SEPOLIA_RPC_URL: &str = "https://ethereum-sepolia-rpc.publicnode.com";
pub const ARBITRUM_SEPOLIA_RPC_URL: &str = "https://sepolia-rollup.arbitrum.io/rpc";
pub const BASE_SEPOLIA_RPC_URL: &str = "https://sepolia.base.org";
pub const OPTIMISM_SEPOLIA_RPC_URL: &str = "https://sepolia.optimism.io";
