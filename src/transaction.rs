//! EIP-1559 transaction construction and envelope encoding
//!
//! Transactions are assembled locally with fixed gas parameters, signed on the
//! device, and encoded to the EIP-2718 bytes `eth_sendRawTransaction` expects.

use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{keccak256, Address, Bytes, Signature, TxHash, TxKind, U256};

use crate::batch::GasConfig;

/// A signed transaction ready to broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    raw: Bytes,
    tx_hash: TxHash,
    chain_id: u64,
    nonce: u64,
}

impl SignedTransaction {
    /// EIP-2718 encoded envelope
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Hash the network will assign, known before broadcast
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }
}

/// Builds an unsigned EIP-1559 contract call.
pub fn eip1559_transaction(
    chain_id: u64,
    nonce: u64,
    to: Address,
    value: U256,
    input: Bytes,
    gas_limit: u64,
    gas: &GasConfig,
) -> TxEip1559 {
    TxEip1559 {
        chain_id,
        nonce,
        gas_limit,
        max_fee_per_gas: gas.max_fee_per_gas,
        max_priority_fee_per_gas: gas.max_priority_fee_per_gas,
        to: TxKind::Call(to),
        value,
        access_list: Default::default(),
        input,
    }
}

/// Attaches `signature` to `tx` and encodes the envelope.
pub fn encode_signed(tx: TxEip1559, signature: Signature) -> SignedTransaction {
    let chain_id = tx.chain_id;
    let nonce = tx.nonce;
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    let raw = Bytes::from(envelope.encoded_2718());
    let tx_hash = keccak256(&raw);
    SignedTransaction {
        raw,
        tx_hash,
        chain_id,
        nonce,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_eips::eip2718::Decodable2718;
    use alloy_network::TxSigner;
    use alloy_primitives::address;
    use alloy_signer_local::PrivateKeySigner;

    const VALIDATOR: Address = address!("07b091cc0eef5b03a41eb4bdd059b388cd3560d1");

    #[test]
    fn uses_gas_config() {
        let gas = GasConfig::default();
        let tx = eip1559_transaction(
            84532,
            3,
            VALIDATOR,
            U256::from(10u64),
            Bytes::from_static(&[0xde, 0xad]),
            gas.bridge_gas_limit,
            &gas,
        );
        assert_eq!(tx.chain_id, 84532);
        assert_eq!(tx.nonce, 3);
        assert_eq!(tx.gas_limit, 500_000);
        assert_eq!(tx.max_fee_per_gas, 30_000_000_000);
        assert_eq!(tx.max_priority_fee_per_gas, 1_500_000_000);
        assert_eq!(tx.to, TxKind::Call(VALIDATOR));
    }

    #[tokio::test]
    async fn signed_envelope_decodes_and_recovers_signer() {
        let signer = PrivateKeySigner::random();
        let gas = GasConfig::default();
        let mut tx = eip1559_transaction(
            421614,
            9,
            VALIDATOR,
            U256::from(1234u64),
            Bytes::from_static(&[0x01]),
            gas.approve_gas_limit,
            &gas,
        );
        let signature = signer.sign_transaction(&mut tx).await.unwrap();
        let signed = encode_signed(tx, signature);

        assert_eq!(signed.chain_id(), 421614);
        assert_eq!(signed.nonce(), 9);
        assert_eq!(signed.raw()[0], 0x02);

        let envelope = TxEnvelope::decode_2718(&mut signed.raw().as_ref()).unwrap();
        assert_eq!(*envelope.tx_hash(), signed.tx_hash());

        let inner = envelope.as_eip1559().unwrap();
        assert_eq!(inner.tx().value, U256::from(1234u64));
        let recovered = inner
            .signature()
            .recover_address_from_prehash(&inner.signature_hash())
            .unwrap();
        assert_eq!(recovered, signer.address());
    }
}
