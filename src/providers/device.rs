//! Signing device backed by an alloy signer.

use alloy_consensus::TxEip1559;
use alloy_network::TxSigner;
use alloy_primitives::{Address, Signature};
use alloy_signer::Signer;
use alloy_sol_types::Eip712Domain;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::protocol::{PermitSingle, PermitTransferFrom};
use crate::traits::DeviceSigner;

/// Production [`DeviceSigner`] over any alloy signer.
///
/// With the `ledger` feature, [`HardwareDevice::ledger`] connects a Ledger
/// over USB; the signer then shows the permit fields and transaction details
/// on screen and waits for the user. Any other
/// [`Signer`] + [`TxSigner`] works too, e.g. a local key in tests or a remote
/// custody signer.
///
/// The signer should be created without a chain id: one device signs for
/// every chain in a batch and each request carries its own.
///
/// # Examples
///
/// ```rust
/// use permit2_bridge::providers::HardwareDevice;
/// use alloy_signer_local::PrivateKeySigner;
///
/// let device = HardwareDevice::new(PrivateKeySigner::random());
/// ```
#[derive(Debug, Clone)]
pub struct HardwareDevice<S> {
    signer: S,
    address: Address,
}

impl<S> HardwareDevice<S>
where
    S: Signer + TxSigner<Signature> + Send + Sync,
{
    pub fn new(signer: S) -> Self {
        let address = Signer::address(&signer);
        debug!(address = %address, event = "signing_device_attached");
        Self { signer, address }
    }

    /// Returns a reference to the underlying signer.
    pub fn inner(&self) -> &S {
        &self.signer
    }
}

#[cfg(feature = "ledger")]
impl HardwareDevice<alloy_signer_ledger::LedgerSigner> {
    /// Opens the first connected Ledger at `path`.
    ///
    /// [`HDPath::Legacy(0)`](alloy_signer_ledger::HDPath::Legacy) is
    /// `m/44'/60'/0'/0`, the path most wallets used for their first account.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Signing`](crate::BridgeError::Signing) if no
    /// device is connected or the Ethereum app is not open.
    pub async fn ledger(path: alloy_signer_ledger::HDPath) -> Result<Self> {
        let signer = alloy_signer_ledger::LedgerSigner::new(path, None)
            .await
            .map_err(|e| crate::error::BridgeError::Signing(e.to_string()))?;
        Ok(Self::new(signer))
    }
}

#[async_trait]
impl<S> DeviceSigner for HardwareDevice<S>
where
    S: Signer + TxSigner<Signature> + Send + Sync,
{
    fn address(&self) -> Address {
        self.address
    }

    async fn sign_permit(
        &self,
        permit: &PermitTransferFrom,
        domain: &Eip712Domain,
    ) -> Result<Signature> {
        debug!(
            token = %permit.permitted.token,
            amount = %permit.permitted.amount,
            nonce = %permit.nonce,
            event = "permit_signature_requested"
        );
        let signature = self.signer.sign_typed_data(permit, domain).await?;
        info!(nonce = %permit.nonce, event = "permit_signed");
        Ok(signature)
    }

    async fn sign_permit_single(
        &self,
        permit: &PermitSingle,
        domain: &Eip712Domain,
    ) -> Result<Signature> {
        debug!(
            token = %permit.details.token,
            nonce = %permit.details.nonce,
            event = "permit_single_signature_requested"
        );
        let signature = self.signer.sign_typed_data(permit, domain).await?;
        info!(nonce = %permit.details.nonce, event = "permit_single_signed");
        Ok(signature)
    }

    async fn sign_transaction(&self, tx: &mut TxEip1559) -> Result<Signature> {
        debug!(
            chain_id = tx.chain_id,
            nonce = tx.nonce,
            event = "transaction_signature_requested"
        );
        let signature = TxSigner::sign_transaction(&self.signer, tx).await?;
        info!(
            chain_id = tx.chain_id,
            nonce = tx.nonce,
            event = "transaction_signed"
        );
        Ok(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::PERMIT2_ADDRESS;
    use crate::protocol::permit2_domain;
    use alloy_primitives::{aliases::U160, aliases::U48, U256};
    use alloy_signer_local::PrivateKeySigner;

    #[tokio::test]
    async fn permit_signature_recovers_to_device_address() {
        let device = HardwareDevice::new(PrivateKeySigner::random());
        let permit = PermitTransferFrom::new(
            Address::repeat_byte(0x11),
            U256::from(5u64),
            Address::repeat_byte(0x22),
            U256::from(1u64),
            U256::from(100u64),
        );
        let domain = permit2_domain(84532, PERMIT2_ADDRESS);

        let signature = device.sign_permit(&permit, &domain).await.unwrap();
        let recovered = signature
            .recover_address_from_prehash(&permit.signing_hash(&domain))
            .unwrap();
        assert_eq!(recovered, device.address());
    }

    #[tokio::test]
    async fn permit_single_signature_recovers_to_device_address() {
        let device = HardwareDevice::new(PrivateKeySigner::random());
        let permit = PermitSingle::new(
            Address::repeat_byte(0x11),
            U160::from(5u64),
            U48::from(10u64),
            U48::ZERO,
            Address::repeat_byte(0x22),
            U256::from(100u64),
        );
        let domain = permit2_domain(11155111, PERMIT2_ADDRESS);

        let signature = device.sign_permit_single(&permit, &domain).await.unwrap();
        let recovered = signature
            .recover_address_from_prehash(&permit.signing_hash(&domain))
            .unwrap();
        assert_eq!(recovered, device.address());
    }
}
