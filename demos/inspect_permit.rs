// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Shows exactly what the device is asked to sign for one relation
//!
//! Builds a Permit2 `PermitTransferFrom` for Base Sepolia, prints the EIP-712
//! typed-data document, its digest, and the `receiveAndBridgeGasless`
//! calldata the signature ends up in. Nothing touches the network.
//!
//! Run with: `cargo run --example inspect_permit`

use alloy_chains::NamedChain;
use alloy_primitives::{hex, U256};
use alloy_signer_local::PrivateKeySigner;
use permit2_bridge::contracts::validator::{receive_and_bridge_gasless_calldata, BridgeRequest};
use permit2_bridge::providers::HardwareDevice;
use permit2_bridge::{
    apply_slippage, format_usdc, parse_usdc, permit2_domain, typed_data_json, BridgeError,
    ChainRegistry, DeviceSigner, LzOptions, PermitTransferFrom, DEFAULT_LZ_RECEIVE_GAS,
};

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    println!("🔏 Permit2 Bridge Permit Inspection");
    println!("===================================\n");

    let registry = ChainRegistry::sepolia_testnets();
    let source = registry.require(NamedChain::BaseSepolia)?;
    let destination = registry.require(NamedChain::ArbitrumSepolia)?;

    // A throwaway key plays the device here.
    let device = HardwareDevice::new(PrivateKeySigner::random());
    let owner = device.address();

    let amount = parse_usdc("12.5")?;
    let permit = PermitTransferFrom::new(
        source.usdc(),
        amount,
        source.validator(),
        U256::from(3u64),
        U256::from(1_700_003_600u64),
    );
    let domain = permit2_domain(source.chain_id(), source.permit2());

    println!("📍 Relation: {} -> {}", source.label(), destination.label());
    println!("   Owner:     {owner}");
    println!("   Amount:    {} USDC", format_usdc(amount));
    println!("   Spender:   {}", source.validator());
    println!("   Dst EID:   {}\n", destination.endpoint_id());

    println!("1️⃣  Typed data shown on the device:");
    let typed = typed_data_json(&permit, &domain)?;
    println!("{}\n", serde_json::to_string_pretty(&typed)?);

    println!("2️⃣  Digest:");
    println!("   Domain separator: {}", domain.separator());
    println!("   Signing hash:     {}\n", permit.signing_hash(&domain));

    let signature = device.sign_permit(&permit, &domain).await?;
    let recovered = signature
        .recover_address_from_prehash(&permit.signing_hash(&domain))
        .map_err(|e| BridgeError::Signing(e.to_string()))?;
    println!("3️⃣  Signature recovers to owner: {}\n", recovered == owner);

    let request = BridgeRequest {
        token: source.usdc(),
        dst_eid: destination.endpoint_id(),
        dst_address: owner,
        amount,
        min_amount: apply_slippage(amount, 50),
        extra_options: LzOptions::new()
            .lz_receive(DEFAULT_LZ_RECEIVE_GAS, 0)
            .build(),
    };
    let calldata = receive_and_bridge_gasless_calldata(&permit, owner, &signature, &request);

    println!("4️⃣  receiveAndBridgeGasless calldata ({} bytes):", calldata.len());
    println!("   0x{}", hex::encode(&calldata));
    println!("   minAmountLD: {} USDC", format_usdc(request.min_amount));

    Ok(())
}
