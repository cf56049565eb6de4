// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Batch USDC transfer across the Sepolia testnets
//!
//! Prepares every relation given on the command line, signing one request at
//! a time, then broadcasts them all at once.
//!
//! Relations are written `source->destination[:percentage]`, for example
//! `base-sepolia->arbitrum-sepolia:50`. Without `--send` the batch is only
//! prepared and printed.
//!
//! Environment variables (set these in .env file):
//! - TESTNET_PRIVATE_KEY: signing key, unless built with `--features ledger`
//! - SEPOLIA_RPC_URL, ARBITRUM_SEPOLIA_RPC_URL, BASE_SEPOLIA_RPC_URL,
//!   OPTIMISM_SEPOLIA_RPC_URL: (optional) RPC overrides
//!
//! Run with:
//! `cargo run --example batch_transfer -- base-sepolia->arbitrum-sepolia:50 sepolia->base-sepolia --send`

#[cfg(not(feature = "ledger"))]
use alloy_signer_local::PrivateKeySigner;
use permit2_bridge::balances::account_overview;
use permit2_bridge::providers::{AlloyChainClient, HardwareDevice};
use permit2_bridge::{BatchBridge, BatchConfig, BridgeError, ChainRegistry, DeviceSigner, Relation};
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BridgeError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🌉 Permit2 Batch Bridge");
    println!("=======================\n");

    let mut send = false;
    let mut relations = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--send" {
            send = true;
        } else {
            relations.push(arg.parse::<Relation>()?);
        }
    }
    if relations.is_empty() {
        relations.push("base-sepolia->arbitrum-sepolia:50".parse()?);
    }

    let registry = ChainRegistry::sepolia_testnets().with_env_overrides()?;
    let clients: HashMap<_, _> = registry
        .chains()
        .map(|config| (config.chain(), AlloyChainClient::connect(config)))
        .collect();

    #[cfg(feature = "ledger")]
    let device = {
        println!("🔌 Connecting to Ledger (m/44'/60'/0'/0)...");
        HardwareDevice::ledger(alloy_signer_ledger::HDPath::Legacy(0)).await?
    };
    #[cfg(not(feature = "ledger"))]
    let device = {
        let key = dotenvy::var("TESTNET_PRIVATE_KEY")
            .map_err(|_| BridgeError::InvalidConfig("TESTNET_PRIVATE_KEY must be set".into()))?;
        let signer: PrivateKeySigner = key
            .parse()
            .map_err(|_| BridgeError::InvalidConfig("invalid TESTNET_PRIVATE_KEY".into()))?;
        HardwareDevice::new(signer)
    };
    let owner = device.address();

    println!("📍 Owner: {owner}\n");
    println!("1️⃣  Balances:");
    for state in account_overview(&registry, &clients, owner).await {
        println!("   {state}");
    }
    println!();

    let bridge = BatchBridge::builder()
        .registry(registry)
        .clients(clients)
        .device(device)
        .config(BatchConfig::default().with_signing_timeout_secs(180))
        .build();

    println!("2️⃣  Preparing {} relation(s), confirm each request on the device...", relations.len());
    let prepared = bridge.prepare(&relations).await;
    for relation in prepared.prepared() {
        println!("   ✅ {relation}");
    }
    for outcome in prepared.settled() {
        println!("   ⚠️  {outcome}");
    }
    println!();

    if !send {
        println!("Dry run: pass --send to broadcast.");
        return Ok(());
    }

    println!("3️⃣  Broadcasting...");
    let report = bridge.send(prepared).await;
    print!("{report}");

    if report.all_succeeded() {
        println!("\n🎉 All relations sent");
    } else {
        println!("\n❗ Some relations were not sent");
    }

    Ok(())
}
