// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Permit2 contract bindings
//!
//! Read access to the two nonce schemes Permit2 keeps per owner: the unordered
//! SignatureTransfer bitmap and the sequential AllowanceTransfer nonce stored
//! alongside each allowance.

use alloy_network::Ethereum;
use alloy_primitives::{
    aliases::{U160, U48},
    Address, Bytes, U256,
};
use alloy_provider::Provider;
use alloy_sol_types::{sol, SolCall};
use tracing::{debug, info};

use Permit2::{invalidateUnorderedNoncesCall, Permit2Instance};

use crate::protocol::NonceBitmap;

/// Allowance record for an (owner, token, spender) triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermitAllowance {
    pub amount: U160,
    pub expiration: U48,
    /// Nonce the next `PermitSingle` for this triple must carry
    pub nonce: U48,
}

/// Permit2 contract wrapper
pub struct Permit2Contract<P: Provider<Ethereum>> {
    instance: Permit2Instance<P>,
}

impl<P: Provider<Ethereum>> Permit2Contract<P> {
    pub fn new(address: Address, provider: P) -> Self {
        debug!(
            contract_address = %address,
            event = "permit2_contract_initialized"
        );
        Self {
            instance: Permit2Instance::new(address, provider),
        }
    }

    /// Reads one word of `owner`'s SignatureTransfer nonce bitmap.
    ///
    /// # Arguments
    ///
    /// * `owner` - The permit signer
    /// * `word` - Word position, i.e. `nonce >> 8`
    pub async fn nonce_bitmap(
        &self,
        owner: Address,
        word: U256,
    ) -> Result<NonceBitmap, alloy_contract::Error> {
        let bits = self.instance.nonceBitmap(owner, word).call().await?;

        debug!(
            owner = %owner,
            word = %word,
            used = bits.count_ones(),
            contract_address = %self.instance.address(),
            event = "nonce_bitmap_retrieved"
        );

        Ok(NonceBitmap::new(word, bits))
    }

    /// Reads the AllowanceTransfer allowance `owner` has granted `spender`
    /// for `token`.
    pub async fn allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<PermitAllowance, alloy_contract::Error> {
        let result = self
            .instance
            .allowance(owner, token, spender)
            .call()
            .await?;

        info!(
            owner = %owner,
            token = %token,
            spender = %spender,
            amount = %result.amount,
            nonce = %result.nonce,
            event = "permit2_allowance_retrieved"
        );

        Ok(PermitAllowance {
            amount: result.amount,
            expiration: result.expiration,
            nonce: result.nonce,
        })
    }

    pub fn address(&self) -> Address {
        *self.instance.address()
    }
}

/// Calldata for `invalidateUnorderedNonces(word, mask)`, which burns every
/// nonce whose bit is set in `mask`. Used to cancel signed permits that were
/// never broadcast.
pub fn invalidate_nonces_calldata(word: U256, mask: U256) -> Bytes {
    invalidateUnorderedNoncesCall {
        wordPos: word,
        mask,
    }
    .abi_encode()
    .into()
}

sol!(
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract Permit2 {
        function nonceBitmap(address owner, uint256 wordPos) external view returns (uint256);
        function allowance(address user, address token, address spender)
            external
            view
            returns (uint160 amount, uint48 expiration, uint48 nonce);
        function invalidateUnorderedNonces(uint256 wordPos, uint256 mask) external;
    }
);
