//! Chain table used to resolve relations
//!
//! A [`ChainRegistry`] maps each supported chain to the RPC endpoint and the
//! contract addresses a transfer from or to it needs. The built-in table covers
//! the four Sepolia testnets the validator is deployed on; other deployments can
//! be loaded from JSON.

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use bon::Builder;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::addresses::*;
use crate::error::{BridgeError, Result};
use crate::protocol::EndpointId;

/// Addresses and endpoints for a single chain
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct ChainConfig {
    chain: NamedChain,
    #[builder(into)]
    label: String,
    rpc_url: Url,
    usdc: Address,
    validator: Address,
    #[builder(default = PERMIT2_ADDRESS)]
    permit2: Address,
    endpoint_id: EndpointId,
}

impl ChainConfig {
    pub fn chain(&self) -> NamedChain {
        self.chain
    }

    /// EVM chain id, used for the EIP-712 domain and transaction envelopes.
    pub fn chain_id(&self) -> u64 {
        self.chain as u64
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub fn usdc(&self) -> Address {
        self.usdc
    }

    pub fn validator(&self) -> Address {
        self.validator
    }

    pub fn permit2(&self) -> Address {
        self.permit2
    }

    pub fn endpoint_id(&self) -> EndpointId {
        self.endpoint_id
    }

    /// Name of the environment variable that overrides this chain's RPC URL,
    /// e.g. `BASE_SEPOLIA_RPC_URL`.
    pub fn rpc_env_var(&self) -> String {
        format!(
            "{}_RPC_URL",
            self.chain.to_string().to_uppercase().replace('-', "_")
        )
    }
}

/// On-disk shape of a chain entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChainConfig {
    chain_id: u64,
    label: String,
    rpc_url: String,
    usdc: Address,
    validator: Address,
    #[serde(default)]
    permit2: Option<Address>,
    #[serde(default)]
    endpoint_id: Option<EndpointId>,
}

impl TryFrom<RawChainConfig> for ChainConfig {
    type Error = BridgeError;

    fn try_from(raw: RawChainConfig) -> Result<Self> {
        let chain = NamedChain::try_from(raw.chain_id)
            .map_err(|_| BridgeError::InvalidConfig(format!("unknown chain id {}", raw.chain_id)))?;
        let rpc_url = Url::parse(&raw.rpc_url).map_err(|e| BridgeError::InvalidUrl {
            reason: format!("{}: {e}", raw.rpc_url),
        })?;
        let endpoint_id = match raw.endpoint_id {
            Some(eid) => eid,
            None => EndpointId::for_chain(chain)?,
        };

        Ok(ChainConfig {
            chain,
            label: raw.label,
            rpc_url,
            usdc: raw.usdc,
            validator: raw.validator,
            permit2: raw.permit2.unwrap_or(PERMIT2_ADDRESS),
            endpoint_id,
        })
    }
}

/// Ordered set of [`ChainConfig`]s, at most one per chain
///
/// # Example
///
/// ```rust
/// use permit2_bridge::ChainRegistry;
/// use alloy_chains::NamedChain;
///
/// let registry = ChainRegistry::sepolia_testnets();
/// let base = registry.get(NamedChain::BaseSepolia).unwrap();
/// assert_eq!(base.endpoint_id().as_u32(), 40245);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The Sepolia testnets the bridge validator is deployed on, with public
    /// RPC endpoints.
    pub fn sepolia_testnets() -> Self {
        let entries = [
            (
                NamedChain::Sepolia,
                "Ethereum Sepolia",
                ETHEREUM_SEPOLIA_RPC_URL,
                ETHEREUM_SEPOLIA_USDC_ADDRESS,
                ETHEREUM_SEPOLIA_VALIDATOR_ADDRESS,
                EndpointId::Sepolia,
            ),
            (
                NamedChain::ArbitrumSepolia,
                "Arbitrum Sepolia",
                ARBITRUM_SEPOLIA_RPC_URL,
                ARBITRUM_SEPOLIA_USDC_ADDRESS,
                ARBITRUM_SEPOLIA_VALIDATOR_ADDRESS,
                EndpointId::ArbitrumSepolia,
            ),
            (
                NamedChain::BaseSepolia,
                "Base Sepolia",
                BASE_SEPOLIA_RPC_URL,
                BASE_SEPOLIA_USDC_ADDRESS,
                BASE_SEPOLIA_VALIDATOR_ADDRESS,
                EndpointId::BaseSepolia,
            ),
            (
                NamedChain::OptimismSepolia,
                "OP Sepolia",
                OPTIMISM_SEPOLIA_RPC_URL,
                OPTIMISM_SEPOLIA_USDC_ADDRESS,
                OPTIMISM_SEPOLIA_VALIDATOR_ADDRESS,
                EndpointId::OptimismSepolia,
            ),
        ];

        let mut registry = Self::new();
        for (chain, label, rpc, usdc, validator, endpoint_id) in entries {
            // The constants above are valid URLs.
            let Ok(rpc_url) = Url::parse(rpc) else {
                continue;
            };
            registry.insert(
                ChainConfig::builder()
                    .chain(chain)
                    .label(label)
                    .rpc_url(rpc_url)
                    .usdc(usdc)
                    .validator(validator)
                    .endpoint_id(endpoint_id)
                    .build(),
            );
        }
        registry
    }

    /// Parses a JSON array of chain entries.
    ///
    /// Each entry carries `chainId`, `label`, `rpcUrl`, `usdc` and `validator`;
    /// `permit2` defaults to the canonical deployment and `endpointId` to the
    /// LayerZero endpoint of the chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a chain id is unknown, or an
    /// RPC URL does not parse.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawChainConfig> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for entry in raw {
            registry.insert(ChainConfig::try_from(entry)?);
        }
        info!(
            chains = registry.chains.len(),
            event = "chain_registry_loaded"
        );
        Ok(registry)
    }

    /// Replaces RPC URLs from `<CHAIN>_RPC_URL` variables, reading `.env` if
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidUrl`] if a variable is set to something
    /// that is not a URL.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        for config in &mut self.chains {
            let var = config.rpc_env_var();
            if let Ok(value) = dotenvy::var(&var) {
                config.rpc_url = Url::parse(&value).map_err(|e| BridgeError::InvalidUrl {
                    reason: format!("{var}: {e}"),
                })?;
                debug!(
                    chain = %config.chain,
                    variable = %var,
                    event = "rpc_url_overridden"
                );
            }
        }
        Ok(self)
    }

    /// Adds a chain, replacing any existing entry for the same chain.
    pub fn insert(&mut self, config: ChainConfig) {
        match self.chains.iter_mut().find(|c| c.chain == config.chain) {
            Some(existing) => *existing = config,
            None => self.chains.push(config),
        }
    }

    pub fn get(&self, chain: NamedChain) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain == chain)
    }

    /// Like [`get`](Self::get), but a missing chain is an error.
    pub fn require(&self, chain: NamedChain) -> Result<&ChainConfig> {
        self.get(chain)
            .ok_or(BridgeError::ChainNotConfigured { chain })
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainConfig> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
