//! LayerZero endpoint identifiers
//!
//! The bridge validator forwards tokens through LayerZero, which addresses
//! destination chains by endpoint ID (EID) rather than by EVM chain id. This
//! module provides a strongly-typed enum of the V2 endpoints the bridge knows
//! about, with conversions to and from the raw `uint32` used in calldata.
//!
//! Reference: <https://docs.layerzero.network/v2/deployments/deployed-contracts>

use alloy_chains::NamedChain;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BridgeError, Result};

/// LayerZero V2 endpoint identifier
///
/// # Example
///
/// ```rust
/// use permit2_bridge::EndpointId;
///
/// let eid: u32 = EndpointId::BaseSepolia.into();
/// assert_eq!(eid, 40245);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
#[repr(u32)]
#[non_exhaustive]
pub enum EndpointId {
    /// Ethereum mainnet (EID: 30101)
    Ethereum = 30101,
    /// BNB Smart Chain (EID: 30102)
    BnbSmartChain = 30102,
    /// Avalanche C-Chain (EID: 30106)
    Avalanche = 30106,
    /// Polygon PoS (EID: 30109)
    Polygon = 30109,
    /// Arbitrum One (EID: 30110)
    Arbitrum = 30110,
    /// OP Mainnet (EID: 30111)
    Optimism = 30111,
    /// Base (EID: 30184)
    Base = 30184,
    /// Ethereum Sepolia (EID: 40161)
    Sepolia = 40161,
    /// Arbitrum Sepolia (EID: 40231)
    ArbitrumSepolia = 40231,
    /// OP Sepolia (EID: 40232)
    OptimismSepolia = 40232,
    /// Base Sepolia (EID: 40245)
    BaseSepolia = 40245,
}

impl EndpointId {
    /// Returns the numeric endpoint ID
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Attempts to create an EndpointId from a u32 value
    ///
    /// # Example
    ///
    /// ```rust
    /// use permit2_bridge::EndpointId;
    ///
    /// assert_eq!(EndpointId::from_u32(40161), Some(EndpointId::Sepolia));
    /// assert_eq!(EndpointId::from_u32(7), None);
    /// ```
    #[inline]
    pub const fn from_u32(value: u32) -> Option<Self> {
        match value {
            30101 => Some(Self::Ethereum),
            30102 => Some(Self::BnbSmartChain),
            30106 => Some(Self::Avalanche),
            30109 => Some(Self::Polygon),
            30110 => Some(Self::Arbitrum),
            30111 => Some(Self::Optimism),
            30184 => Some(Self::Base),
            40161 => Some(Self::Sepolia),
            40231 => Some(Self::ArbitrumSepolia),
            40232 => Some(Self::OptimismSepolia),
            40245 => Some(Self::BaseSepolia),
            _ => None,
        }
    }

    /// Returns the endpoint for an EVM chain
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedChain`] when LayerZero has no endpoint
    /// for the chain in this table.
    pub fn for_chain(chain: NamedChain) -> Result<Self> {
        let eid = match chain {
            NamedChain::Mainnet => Self::Ethereum,
            NamedChain::BinanceSmartChain => Self::BnbSmartChain,
            NamedChain::Avalanche => Self::Avalanche,
            NamedChain::Polygon => Self::Polygon,
            NamedChain::Arbitrum => Self::Arbitrum,
            NamedChain::Optimism => Self::Optimism,
            NamedChain::Base => Self::Base,
            NamedChain::Sepolia => Self::Sepolia,
            NamedChain::ArbitrumSepolia => Self::ArbitrumSepolia,
            NamedChain::OptimismSepolia => Self::OptimismSepolia,
            NamedChain::BaseSepolia => Self::BaseSepolia,
            _ => return Err(BridgeError::UnsupportedChain(chain)),
        };
        Ok(eid)
    }

    /// Returns the chain name as a string
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ethereum => "Ethereum",
            Self::BnbSmartChain => "BNB Smart Chain",
            Self::Avalanche => "Avalanche",
            Self::Polygon => "Polygon",
            Self::Arbitrum => "Arbitrum",
            Self::Optimism => "Optimism",
            Self::Base => "Base",
            Self::Sepolia => "Sepolia",
            Self::ArbitrumSepolia => "Arbitrum Sepolia",
            Self::OptimismSepolia => "OP Sepolia",
            Self::BaseSepolia => "Base Sepolia",
        }
    }
}

impl From<EndpointId> for u32 {
    #[inline]
    fn from(eid: EndpointId) -> Self {
        eid.as_u32()
    }
}

impl TryFrom<u32> for EndpointId {
    type Error = InvalidEndpointId;

    #[inline]
    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        Self::from_u32(value).ok_or(InvalidEndpointId(value))
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.as_u32())
    }
}

/// Error returned when a u32 is not a known LayerZero endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidEndpointId(pub u32);

impl fmt::Display for InvalidEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown LayerZero endpoint id: {}", self.0)
    }
}

impl std::error::Error for InvalidEndpointId {}
