use alloy_chains::NamedChain;
use alloy_primitives::Address;
use bon::Builder;
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};
use crate::protocol::validate_percentage;

/// One source to destination transfer in a batch
///
/// `percentage` selects the share of the owner's USDC balance on the source
/// chain to move; `recipient` defaults to the owner. `color` is a display
/// label carried through to the report untouched.
///
/// # Example
///
/// ```rust
/// use permit2_bridge::Relation;
/// use alloy_chains::NamedChain;
///
/// let relation = Relation::builder()
///     .source(NamedChain::BaseSepolia)
///     .destination(NamedChain::ArbitrumSepolia)
///     .percentage(25)
///     .build();
///
/// assert_eq!(relation.key(), "base-sepolia->arbitrum-sepolia");
/// assert_eq!(relation.recipient, None);
/// ```
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub source: NamedChain,
    pub destination: NamedChain,
    #[builder(into)]
    pub color: Option<String>,
    #[builder(default = 100)]
    pub percentage: u8,
    pub recipient: Option<Address>,
}

impl Relation {
    /// Full-balance transfer to the owner's own address
    pub fn new(source: NamedChain, destination: NamedChain) -> Self {
        Self {
            source,
            destination,
            color: None,
            percentage: 100,
            recipient: None,
        }
    }

    /// `"source->destination"`, used as the relation's identifier in logs
    /// and reports
    pub fn key(&self) -> String {
        format!("{}->{}", self.source, self.destination)
    }

    /// Address that receives the bridged tokens
    pub fn recipient_or(&self, owner: Address) -> Address {
        self.recipient.unwrap_or(owner)
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}%)", self.key(), self.percentage)
    }
}

/// Parses `source->destination[:percentage]`, chains named as in
/// [`NamedChain`]'s `Display`.
impl FromStr for Relation {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BridgeError::InvalidConfig(format!("invalid relation {s:?}"));

        let (route, percentage) = match s.split_once(':') {
            Some((route, pct)) => (route, pct.trim().parse::<u8>().map_err(|_| invalid())?),
            None => (s, 100),
        };
        validate_percentage(percentage)?;

        let (source, destination) = route.split_once("->").ok_or_else(invalid)?;
        let source = NamedChain::from_str(source.trim()).map_err(|_| invalid())?;
        let destination = NamedChain::from_str(destination.trim()).map_err(|_| invalid())?;

        Ok(Self {
            percentage,
            ..Self::new(source, destination)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("base-sepolia->arbitrum-sepolia", NamedChain::BaseSepolia, NamedChain::ArbitrumSepolia, 100)]
    #[case("sepolia->optimism-sepolia:40", NamedChain::Sepolia, NamedChain::OptimismSepolia, 40)]
    #[case(" arbitrum-sepolia -> sepolia : 5", NamedChain::ArbitrumSepolia, NamedChain::Sepolia, 5)]
    fn parses_relation(
        #[case] input: &str,
        #[case] source: NamedChain,
        #[case] destination: NamedChain,
        #[case] percentage: u8,
    ) {
        let relation: Relation = input.parse().unwrap();
        assert_eq!(relation.source, source);
        assert_eq!(relation.destination, destination);
        assert_eq!(relation.percentage, percentage);
    }

    #[rstest]
    #[case("base-sepolia")]
    #[case("base-sepolia->nowhere")]
    #[case("base-sepolia->sepolia:0")]
    #[case("base-sepolia->sepolia:101")]
    #[case("base-sepolia->sepolia:half")]
    fn rejects_malformed_relation(#[case] input: &str) {
        assert!(matches!(
            input.parse::<Relation>(),
            Err(BridgeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_defaults_to_full_balance() {
        let relation = Relation::builder()
            .source(NamedChain::Sepolia)
            .destination(NamedChain::BaseSepolia)
            .color("#ff8800")
            .build();

        assert_eq!(relation.percentage, 100);
        assert_eq!(relation.color.as_deref(), Some("#ff8800"));
        insta::assert_snapshot!(relation.to_string(), @"sepolia->base-sepolia (100%)");
    }

    #[test]
    fn recipient_defaults_to_owner() {
        let owner = Address::repeat_byte(0x0a);
        let other = Address::repeat_byte(0x0b);
        let relation = Relation::new(NamedChain::Sepolia, NamedChain::BaseSepolia);

        assert_eq!(relation.recipient_or(owner), owner);
        assert_eq!(
            Relation {
                recipient: Some(other),
                ..relation
            }
            .recipient_or(owner),
            other
        );
    }
}
