// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Bridge validator contract bindings and wrapper
//!
//! The validator pulls tokens from the owner through Permit2 and forwards them
//! to a LayerZero destination. It exposes two permit flavours:
//!
//! - SignatureTransfer: `receiveAndBridgeGasless`, used by the batch
//!   orchestrator. The permit is one-shot and needs no prior Permit2 allowance.
//! - AllowanceTransfer: `receiveAndBridge`, `receiveTokensWithPermit`,
//!   `validatePermit` and `validatePermitAndTransfer`, which first register a
//!   `PermitSingle` allowance for the validator.
//!
//! Write entry points are exposed as calldata builders because the owner's key
//! lives on a hardware device and transactions are signed raw.

use alloy_network::Ethereum;
use alloy_primitives::{aliases::U160, Address, Bytes, Signature, U256};
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use Permit2TransferValidator::{
    receiveAndBridgeCall, receiveAndBridgeGaslessCall, receiveTokensWithPermitCall,
    validatePermitAndTransferCall, validatePermitCall, withdrawTokensCall,
    Permit2TransferValidatorInstance,
};

use crate::protocol::{self, EndpointId};

/// Parameters shared by `quoteBridge` and the bridging entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    /// Token pulled from the owner on the source chain
    pub token: Address,
    /// LayerZero endpoint of the destination chain
    pub dst_eid: EndpointId,
    /// Recipient on the destination chain
    pub dst_address: Address,
    /// Amount in source-chain base units
    pub amount: U256,
    /// Minimum amount the destination must receive (`minAmountLD`)
    pub min_amount: U256,
    /// LayerZero executor options
    pub extra_options: Bytes,
}

/// Bridge validator contract wrapper
pub struct ValidatorContract<P: Provider<Ethereum>> {
    instance: Permit2TransferValidatorInstance<P>,
}

impl<P: Provider<Ethereum>> ValidatorContract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "validator_contract_initialized"
        );
        Self {
            instance: Permit2TransferValidatorInstance::new(address, provider),
        }
    }

    /// Permit2 deployment the validator pulls tokens through
    pub async fn permit2(&self) -> Result<Address, alloy_contract::Error> {
        self.instance.PERMIT2().call().await
    }

    /// Native fee the validator charges to bridge `request`
    ///
    /// The fee is paid as the `value` of the bridging transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the call reverts, e.g. for an unconfigured
    /// destination endpoint.
    pub async fn quote_bridge(
        &self,
        request: &BridgeRequest,
    ) -> Result<U256, alloy_contract::Error> {
        debug!(
            token = %request.token,
            dst_eid = %request.dst_eid,
            amount = %request.amount,
            contract_address = %self.instance.address(),
            event = "quoting_bridge_fee"
        );

        let fee = self
            .instance
            .quoteBridge(
                request.token,
                request.dst_eid.as_u32(),
                request.dst_address,
                request.amount,
                request.min_amount,
                request.extra_options.clone(),
            )
            .call()
            .await?;

        info!(
            dst_eid = %request.dst_eid,
            fee = %fee,
            contract_address = %self.instance.address(),
            event = "bridge_fee_quoted"
        );

        Ok(fee)
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

impl From<&protocol::PermitTransferFrom> for Permit2TransferValidator::PermitTransferFrom {
    fn from(permit: &protocol::PermitTransferFrom) -> Self {
        Self {
            permitted: Permit2TransferValidator::TokenPermissions {
                token: permit.permitted.token,
                amount: permit.permitted.amount,
            },
            nonce: permit.nonce,
            deadline: permit.deadline,
        }
    }
}

impl From<&protocol::PermitSingle> for Permit2TransferValidator::PermitSingle {
    fn from(permit: &protocol::PermitSingle) -> Self {
        Self {
            details: Permit2TransferValidator::PermitDetails {
                token: permit.details.token,
                amount: permit.details.amount,
                expiration: permit.details.expiration,
                nonce: permit.details.nonce,
            },
            spender: permit.spender,
            sigDeadline: permit.sigDeadline,
        }
    }
}

fn signature_bytes(signature: &Signature) -> Bytes {
    Bytes::copy_from_slice(&signature.as_bytes())
}

/// Calldata for `receiveAndBridgeGasless`
///
/// # Arguments
///
/// * `permit` - The signed SignatureTransfer permit; its spender must be the validator
/// * `owner` - The permit signer
/// * `signature` - Owner's EIP-712 signature over `permit`
/// * `request` - Destination and amounts; `request.amount` should equal the permitted amount
pub fn receive_and_bridge_gasless_calldata(
    permit: &protocol::PermitTransferFrom,
    owner: Address,
    signature: &Signature,
    request: &BridgeRequest,
) -> Bytes {
    receiveAndBridgeGaslessCall {
        permit: permit.into(),
        owner,
        signature: signature_bytes(signature),
        dstEid: request.dst_eid.as_u32(),
        dstAddress: request.dst_address,
        minAmountLD: request.min_amount,
        extraOptions: request.extra_options.clone(),
    }
    .abi_encode()
    .into()
}

/// Calldata for `receiveAndBridge`, the AllowanceTransfer bridging path
pub fn receive_and_bridge_calldata(
    permit: &protocol::PermitSingle,
    owner: Address,
    signature: &Signature,
    amount: U160,
    request: &BridgeRequest,
) -> Bytes {
    receiveAndBridgeCall {
        permitSingle: permit.into(),
        signature: signature_bytes(signature),
        owner,
        amount,
        dstEid: request.dst_eid.as_u32(),
        dstAddress: request.dst_address,
        minAmountLD: request.min_amount,
        extraOptions: request.extra_options.clone(),
    }
    .abi_encode()
    .into()
}

/// Calldata for `receiveTokensWithPermit`: registers the allowance and pulls
/// `amount` into the validator.
pub fn receive_tokens_with_permit_calldata(
    permit: &protocol::PermitSingle,
    owner: Address,
    signature: &Signature,
    amount: U160,
) -> Bytes {
    receiveTokensWithPermitCall {
        permitSingle: permit.into(),
        signature: signature_bytes(signature),
        owner,
        amount,
    }
    .abi_encode()
    .into()
}

/// Calldata for `validatePermit`: registers the allowance only.
pub fn validate_permit_calldata(
    permit: &protocol::PermitSingle,
    owner: Address,
    signature: &Signature,
) -> Bytes {
    validatePermitCall {
        permitSingle: permit.into(),
        signature: signature_bytes(signature),
        owner,
    }
    .abi_encode()
    .into()
}

/// Calldata for `validatePermitAndTransfer`: registers the allowance and
/// sends `amount` straight to `recipient` on the same chain.
pub fn validate_permit_and_transfer_calldata(
    permit: &protocol::PermitSingle,
    owner: Address,
    signature: &Signature,
    recipient: Address,
    amount: U160,
) -> Bytes {
    validatePermitAndTransferCall {
        permitSingle: permit.into(),
        signature: signature_bytes(signature),
        owner,
        recipient,
        amount,
    }
    .abi_encode()
    .into()
}

/// Calldata for the owner-only `withdrawTokens` rescue function.
pub fn withdraw_tokens_calldata(token: Address, to: Address, amount: U256) -> Bytes {
    withdrawTokensCall { token, to, amount }.abi_encode().into()
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Permit2TransferValidator {
        struct TokenPermissions {
            address token;
            uint256 amount;
        }

        struct PermitTransferFrom {
            TokenPermissions permitted;
            uint256 nonce;
            uint256 deadline;
        }

        struct PermitDetails {
            address token;
            uint160 amount;
            uint48 expiration;
            uint48 nonce;
        }

        struct PermitSingle {
            PermitDetails details;
            address spender;
            uint256 sigDeadline;
        }

        event PermitValidated(
            address indexed owner,
            address indexed token,
            address indexed spender,
            uint160 amount
        );
        event TokensBridged(
            address indexed from,
            address indexed token,
            uint32 indexed dstEid,
            address dstAddress,
            uint256 amount,
            bytes32 messageId
        );
        event TokensTransferred(
            address indexed from,
            address indexed to,
            address indexed token,
            uint160 amount
        );

        function PERMIT2() external view returns (address);
        function quoteBridge(
            address token,
            uint32 dstEid,
            address dstAddress,
            uint256 amount,
            uint256 minAmountLD,
            bytes extraOptions
        ) external view returns (uint256 nativeFee);
        function receiveAndBridge(
            PermitSingle permitSingle,
            bytes signature,
            address owner,
            uint160 amount,
            uint32 dstEid,
            address dstAddress,
            uint256 minAmountLD,
            bytes extraOptions
        ) external payable;
        function receiveAndBridgeGasless(
            PermitTransferFrom permit,
            address owner,
            bytes signature,
            uint32 dstEid,
            address dstAddress,
            uint256 minAmountLD,
            bytes extraOptions
        ) external payable;
        function receiveTokensWithPermit(
            PermitSingle permitSingle,
            bytes signature,
            address owner,
            uint160 amount
        ) external;
        function validatePermit(PermitSingle permitSingle, bytes signature, address owner) external;
        function validatePermitAndTransfer(
            PermitSingle permitSingle,
            bytes signature,
            address owner,
            address recipient,
            uint160 amount
        ) external;
        function withdrawTokens(address token, address to, uint256 amount) external;
    }
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{default_extra_options, PermitSingle, PermitTransferFrom};
    use alloy_primitives::{address, aliases::U48, hex, B256};
    use alloy_sol_types::SolEvent;
    use Permit2TransferValidator::{quoteBridgeCall, TokensBridged};

    const OWNER: Address = address!("1111111111111111111111111111111111111111");
    const USDC: Address = address!("036cbd53842c5426634e7929541ec2318f3dcf7e");
    const VALIDATOR: Address = address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1");

    fn request() -> BridgeRequest {
        BridgeRequest {
            token: USDC,
            dst_eid: EndpointId::ArbitrumSepolia,
            dst_address: OWNER,
            amount: U256::from(2_000_000u64),
            min_amount: U256::from(2_000_000u64),
            extra_options: default_extra_options(),
        }
    }

    fn signature() -> Signature {
        Signature::new(U256::from(1u64), U256::from(2u64), false)
    }

    fn permit_single() -> PermitSingle {
        PermitSingle::new(
            USDC,
            U160::from(2_000_000u64),
            U48::from(1_900_000_000u64),
            U48::from(0u64),
            VALIDATOR,
            U256::from(1_800_000_000u64),
        )
    }

    #[test]
    fn selectors_match_validator_abi() {
        insta::assert_snapshot!(hex::encode(receiveAndBridgeGaslessCall::SELECTOR), @"9700169b");
        insta::assert_snapshot!(hex::encode(quoteBridgeCall::SELECTOR), @"35a31269");
        insta::assert_snapshot!(hex::encode(withdrawTokensCall::SELECTOR), @"5e35359e");
    }

    #[test]
    fn gasless_calldata_drops_spender_and_keeps_permit_fields() {
        let permit = PermitTransferFrom::new(
            USDC,
            U256::from(2_000_000u64),
            VALIDATOR,
            U256::from(7u64),
            U256::from(1_700_003_600u64),
        );
        let calldata =
            receive_and_bridge_gasless_calldata(&permit, OWNER, &signature(), &request());

        let decoded = receiveAndBridgeGaslessCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.permit.permitted.token, USDC);
        assert_eq!(decoded.permit.permitted.amount, U256::from(2_000_000u64));
        assert_eq!(decoded.permit.nonce, U256::from(7u64));
        assert_eq!(decoded.permit.deadline, U256::from(1_700_003_600u64));
        assert_eq!(decoded.owner, OWNER);
        assert_eq!(decoded.dstEid, 40231);
        assert_eq!(decoded.dstAddress, OWNER);
        assert_eq!(decoded.minAmountLD, U256::from(2_000_000u64));
        assert_eq!(decoded.extraOptions, default_extra_options());
        assert_eq!(decoded.signature.len(), 65);
        assert_eq!(decoded.signature[64], 27);
    }

    #[test]
    fn allowance_transfer_calldata_carries_permit_single() {
        let permit = permit_single();

        let calldata = receive_and_bridge_calldata(
            &permit,
            OWNER,
            &signature(),
            U160::from(2_000_000u64),
            &request(),
        );
        let decoded = receiveAndBridgeCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.permitSingle.spender, VALIDATOR);
        assert_eq!(decoded.amount, U160::from(2_000_000u64));
        assert_eq!(decoded.dstEid, 40231);

        let calldata = validate_permit_and_transfer_calldata(
            &permit,
            OWNER,
            &signature(),
            VALIDATOR,
            U160::from(5u64),
        );
        let decoded = validatePermitAndTransferCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.recipient, VALIDATOR);
        assert_eq!(decoded.permitSingle.details.expiration, U48::from(1_900_000_000u64));

        let calldata = receive_tokens_with_permit_calldata(
            &permit,
            OWNER,
            &signature(),
            U160::from(5u64),
        );
        assert!(receiveTokensWithPermitCall::abi_decode(&calldata).is_ok());

        let calldata = validate_permit_calldata(&permit, OWNER, &signature());
        let decoded = validatePermitCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.owner, OWNER);
    }

    #[test]
    fn withdraw_calldata() {
        let calldata = withdraw_tokens_calldata(USDC, OWNER, U256::from(10u64));
        let decoded = withdrawTokensCall::abi_decode(&calldata).unwrap();
        assert_eq!(decoded.to, OWNER);
        assert_eq!(decoded.amount, U256::from(10u64));
    }

    #[test]
    fn bridged_event_signature() {
        insta::assert_snapshot!(
            TokensBridged::SIGNATURE,
            @"TokensBridged(address,address,uint32,address,uint256,bytes32)"
        );
        assert_ne!(TokensBridged::SIGNATURE_HASH, B256::ZERO);
    }
}
