//! Permit2 typed-data structures
//!
//! Permit2 verifies EIP-712 signatures over two families of messages:
//! SignatureTransfer's [`PermitTransferFrom`] (one-shot, bitmap nonces) and
//! AllowanceTransfer's [`PermitSingle`] (sets a standing allowance, sequential
//! nonces). Both are signed under the domain returned by [`permit2_domain`],
//! which carries a name, chain id and verifying contract but no version.

use alloy_dyn_abi::TypedData;
use alloy_primitives::{
    aliases::{U160, U48},
    Address, B256, U256,
};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// EIP-712 domain name used by every Permit2 deployment
pub const PERMIT2_DOMAIN_NAME: &str = "Permit2";

sol! {
    /// Token and maximum amount a SignatureTransfer permit allows.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct TokenPermissions {
        address token;
        uint256 amount;
    }

    /// SignatureTransfer permit as signed by the owner.
    ///
    /// `spender` is part of the signed message but not of the calldata struct
    /// the validator receives; Permit2 fills it in from `msg.sender`.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PermitTransferFrom {
        TokenPermissions permitted;
        address spender;
        uint256 nonce;
        uint256 deadline;
    }

    /// AllowanceTransfer allowance parameters.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PermitDetails {
        address token;
        uint160 amount;
        uint48 expiration;
        uint48 nonce;
    }

    /// AllowanceTransfer permit for a single token.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    struct PermitSingle {
        PermitDetails details;
        address spender;
        uint256 sigDeadline;
    }
}

/// Builds the Permit2 EIP-712 domain for a chain.
///
/// # Example
///
/// ```rust
/// use permit2_bridge::{permit2_domain, PERMIT2_ADDRESS};
///
/// let domain = permit2_domain(84532, PERMIT2_ADDRESS);
/// assert_eq!(domain.name.as_deref(), Some("Permit2"));
/// assert!(domain.version.is_none());
/// ```
pub fn permit2_domain(chain_id: u64, permit2: Address) -> Eip712Domain {
    Eip712Domain::new(
        Some(PERMIT2_DOMAIN_NAME.into()),
        None,
        Some(U256::from(chain_id)),
        Some(permit2),
        None,
    )
}

/// Renders the JSON typed-data document for a Permit2 message, the form
/// hardware wallets display and sign.
///
/// # Errors
///
/// Returns an error if the message cannot be serialized.
pub fn typed_data_json<T>(payload: &T, domain: &Eip712Domain) -> Result<serde_json::Value>
where
    T: SolStruct + Serialize,
{
    let typed = TypedData::from_struct(payload, Some(domain.clone()));
    Ok(serde_json::to_value(typed)?)
}

impl PermitTransferFrom {
    /// Creates a permit letting `spender` pull `amount` of `token` once.
    pub fn new(token: Address, amount: U256, spender: Address, nonce: U256, deadline: U256) -> Self {
        Self {
            permitted: TokenPermissions { token, amount },
            spender,
            nonce,
            deadline,
        }
    }

    /// EIP-712 digest the owner signs.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.eip712_signing_hash(domain)
    }
}

impl PermitSingle {
    /// Creates an allowance permit for `spender`.
    pub fn new(
        token: Address,
        amount: U160,
        expiration: U48,
        nonce: U48,
        spender: Address,
        sig_deadline: U256,
    ) -> Self {
        Self {
            details: PermitDetails {
                token,
                amount,
                expiration,
                nonce,
            },
            spender,
            sigDeadline: sig_deadline,
        }
    }

    /// EIP-712 digest the owner signs.
    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.eip712_signing_hash(domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::PERMIT2_ADDRESS;
    use alloy_primitives::{address, b256};

    fn sample_permit() -> PermitTransferFrom {
        PermitTransferFrom::new(
            address!("036cbd53842c5426634e7929541ec2318f3dcf7e"),
            U256::from(1_000_000u64),
            address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1"),
            U256::from(3u64),
            U256::from(1_700_003_600u64),
        )
    }

    #[test]
    fn transfer_type_string_matches_permit2() {
        insta::assert_snapshot!(
            PermitTransferFrom::eip712_encode_type(),
            @"PermitTransferFrom(TokenPermissions permitted,address spender,uint256 nonce,uint256 deadline)TokenPermissions(address token,uint256 amount)"
        );
    }

    #[test]
    fn single_type_string_matches_permit2() {
        insta::assert_snapshot!(
            PermitSingle::eip712_encode_type(),
            @"PermitSingle(PermitDetails details,address spender,uint256 sigDeadline)PermitDetails(address token,uint160 amount,uint48 expiration,uint48 nonce)"
        );
    }

    #[test]
    fn type_hashes_match_deployed_constants() {
        let permit = sample_permit();
        assert_eq!(
            permit.eip712_type_hash(),
            b256!("939c21a48a8dbe3a9a2404a1d46691e4d39f6583d6ec6b35714604c986d80106")
        );
    }

    #[test]
    fn domain_separator_matches_mainnet_deployment() {
        let domain = permit2_domain(1, PERMIT2_ADDRESS);
        assert_eq!(
            domain.separator(),
            b256!("866a5aba21966af95d6c7ab78eb2b2fc913915c28be3b9aa07cc04ff903e3f28")
        );
        let domain = permit2_domain(84532, PERMIT2_ADDRESS);
        assert_eq!(
            domain.separator(),
            b256!("010f27a92fb9a32622f44f001dc4d15706a85b33499cfc2ce9033113ab26592c")
        );
    }

    #[test]
    fn signing_hash_depends_on_chain() {
        let permit = sample_permit();
        let base = permit.signing_hash(&permit2_domain(84532, PERMIT2_ADDRESS));
        let sepolia = permit.signing_hash(&permit2_domain(11155111, PERMIT2_ADDRESS));
        assert_ne!(base, sepolia);
    }

    #[test]
    fn typed_data_document_hashes_to_same_digest() {
        let permit = sample_permit();
        let domain = permit2_domain(84532, PERMIT2_ADDRESS);
        let json = typed_data_json(&permit, &domain).unwrap();

        assert_eq!(json["primaryType"], "PermitTransferFrom");
        assert_eq!(json["domain"]["name"], "Permit2");
        assert!(json["types"]["TokenPermissions"].is_array());

        let typed: TypedData = serde_json::from_value(json).unwrap();
        assert_eq!(
            typed.eip712_signing_hash().unwrap(),
            permit.signing_hash(&domain)
        );
    }

    #[test]
    fn permit_single_keeps_fields() {
        let permit = PermitSingle::new(
            address!("036cbd53842c5426634e7929541ec2318f3dcf7e"),
            U160::from(500u64),
            U48::from(1_800_000_000u64),
            U48::from(2u64),
            address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1"),
            U256::from(1_700_000_000u64),
        );
        assert_eq!(permit.details.nonce, U48::from(2u64));
        assert_eq!(permit.sigDeadline, U256::from(1_700_000_000u64));
        let domain = permit2_domain(84532, PERMIT2_ADDRESS);
        assert_ne!(permit.signing_hash(&domain), B256::ZERO);
    }
}
