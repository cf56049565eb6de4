use alloy_chains::NamedChain;
use alloy_primitives::{Address, TxHash, U256};
use bon::Builder;
use futures::future::join_all;
use std::collections::HashMap;
use std::future::Future;
use tracing::{debug, error, info, warn, Instrument};

use super::reservations::Reservations;
use super::{
    BatchConfig, BatchReport, FailureStage, PreparedBatch, PreparedRelation, Relation,
    RelationOutcome, RelationStatus,
};
use crate::chain::{ChainConfig, ChainRegistry};
use crate::contracts::erc20::approve_calldata;
use crate::contracts::validator::{receive_and_bridge_gasless_calldata, BridgeRequest};
use crate::error::{BridgeError, Result};
use crate::protocol::{apply_slippage, format_usdc, permit2_domain, share_of, PermitTransferFrom};
use crate::spans;
use crate::traits::{ChainClient, DeviceSigner};
use crate::transaction::{eip1559_transaction, encode_signed, SignedTransaction};

/// Why a relation left the preparation pass early
enum Rejection {
    Skipped(String),
    Failed(BridgeError),
}

impl From<BridgeError> for Rejection {
    fn from(err: BridgeError) -> Self {
        Rejection::Failed(err)
    }
}

type Prepared<T> = std::result::Result<T, Rejection>;

/// Batch orchestrator for Permit2 bridge transfers from one device account
///
/// Preparation walks the relations in order and talks to the device one
/// request at a time. Broadcast then sends every signed transaction at once.
/// A relation that fails in either half is reported and the rest carry on;
/// nothing already sent is rolled back.
///
/// # Example
///
/// ```rust,no_run
/// use permit2_bridge::{BatchBridge, ChainRegistry, Relation};
/// use permit2_bridge::providers::{AlloyChainClient, HardwareDevice};
/// use alloy_chains::NamedChain;
/// use alloy_signer_local::PrivateKeySigner;
/// use std::collections::HashMap;
///
/// # async fn example() -> Result<(), permit2_bridge::BridgeError> {
/// let registry = ChainRegistry::sepolia_testnets().with_env_overrides()?;
/// let clients: HashMap<_, _> = registry
///     .chains()
///     .map(|config| (config.chain(), AlloyChainClient::connect(config)))
///     .collect();
///
/// let bridge = BatchBridge::builder()
///     .registry(registry)
///     .clients(clients)
///     .device(HardwareDevice::new(PrivateKeySigner::random()))
///     .build();
///
/// let report = bridge
///     .execute(&[
///         Relation::new(NamedChain::BaseSepolia, NamedChain::ArbitrumSepolia),
///         "sepolia->optimism-sepolia:50".parse()?,
///     ])
///     .await;
/// println!("{report}");
/// # Ok(())
/// # }
/// ```
#[derive(Builder, Debug)]
pub struct BatchBridge<C: ChainClient, D: DeviceSigner> {
    registry: ChainRegistry,
    clients: HashMap<NamedChain, C>,
    device: D,
    #[builder(default)]
    config: BatchConfig,
}

impl<C: ChainClient, D: DeviceSigner> BatchBridge<C, D> {
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Address that owns the funds and signs everything
    pub fn owner(&self) -> Address {
        self.device.address()
    }

    /// Client registered for `chain`
    pub fn client(&self, chain: NamedChain) -> Result<&C> {
        self.clients
            .get(&chain)
            .ok_or(BridgeError::MissingClient { chain })
    }

    /// Prepares and broadcasts `relations`.
    pub async fn execute(&self, relations: &[Relation]) -> BatchReport {
        let prepared = self.prepare(relations).await;
        self.send(prepared).await
    }

    /// Builds and signs one bridge transaction per relation.
    ///
    /// Runs strictly in order: every device request waits for the previous
    /// one. Permit2 approvals needed along the way are sent here, so their
    /// hashes appear in the report even if the relation later fails.
    pub async fn prepare(&self, relations: &[Relation]) -> PreparedBatch {
        let owner = self.owner();
        let span = spans::prepare_batch(&owner, relations.len());

        async {
            let mut batch = PreparedBatch::default();
            let mut reservations = Reservations::default();

            for (index, relation) in relations.iter().enumerate() {
                let key = relation.key();
                let span =
                    spans::prepare_relation(index, &key, &relation.source, &relation.destination);
                let mut approve_tx_hash = None;

                let result = self
                    .prepare_relation(index, relation, &mut reservations, &mut approve_tx_hash)
                    .instrument(span.clone())
                    .await;

                let status = match result {
                    Ok(prepared) => {
                        info!(
                            relation = %key,
                            amount = %format_usdc(prepared.amount()),
                            permit_nonce = %prepared.permit_nonce(),
                            account_nonce = prepared.account_nonce(),
                            tx_hash = %prepared.signed().tx_hash(),
                            event = "relation_prepared"
                        );
                        batch.prepared.push(prepared);
                        continue;
                    }
                    Err(Rejection::Skipped(reason)) => {
                        warn!(relation = %key, reason = %reason, event = "relation_skipped");
                        RelationStatus::Skipped { reason }
                    }
                    Err(Rejection::Failed(err)) => {
                        span.in_scope(|| spans::record_error(&err));
                        error!(relation = %key, error = %err, event = "relation_preparation_failed");
                        RelationStatus::Failed {
                            stage: FailureStage::Preparation,
                            reason: err.to_string(),
                            approve_tx_hash,
                        }
                    }
                };

                batch.settled.push(RelationOutcome {
                    index,
                    relation: relation.clone(),
                    status,
                });
            }

            tracing::Span::current().record("prepared", batch.prepared.len());
            info!(
                prepared = batch.prepared.len(),
                settled = batch.settled.len(),
                event = "batch_prepared"
            );
            batch
        }
        .instrument(span)
        .await
    }

    /// Broadcasts every prepared transaction concurrently.
    ///
    /// There is no ordering across chains and no retry. A rejected broadcast
    /// is reported against its relation only.
    pub async fn send(&self, batch: PreparedBatch) -> BatchReport {
        let PreparedBatch { prepared, settled } = batch;
        let span = spans::send_batch(prepared.len());

        async {
            let sends = prepared.into_iter().map(|prepared| self.broadcast(prepared));
            let broadcast = join_all(sends).await;

            let successful = broadcast.iter().filter(|o| o.is_sent()).count();
            let current = tracing::Span::current();
            current.record("successful", successful);
            current.record("failed", broadcast.len() - successful);

            let report = BatchReport::new(settled.into_iter().chain(broadcast).collect());
            info!(
                successful = report.successful().count(),
                failed = report.failed().count(),
                skipped = report.skipped().count(),
                event = "batch_sent"
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn broadcast(&self, prepared: PreparedRelation) -> RelationOutcome {
        let key = prepared.key();
        let source = prepared.relation.source;
        let tx_hash = prepared.signed.tx_hash();
        let span = spans::broadcast_relation(&key, &source, tx_hash);

        let status = async {
            let sent = match self.client(source) {
                Ok(client) => client.send_raw_transaction(prepared.signed.raw()).await,
                Err(err) => Err(err),
            };

            match sent {
                Ok(tx_hash) => {
                    info!(relation = %key, tx_hash = %tx_hash, event = "relation_sent");
                    RelationStatus::Sent {
                        tx_hash,
                        approve_tx_hash: prepared.approve_tx_hash,
                    }
                }
                Err(err) => {
                    spans::record_error(&err);
                    error!(relation = %key, error = %err, event = "relation_broadcast_failed");
                    RelationStatus::Failed {
                        stage: FailureStage::Broadcast,
                        reason: err.to_string(),
                        approve_tx_hash: prepared.approve_tx_hash,
                    }
                }
            }
        }
        .instrument(span)
        .await;

        RelationOutcome {
            index: prepared.index,
            relation: prepared.relation,
            status,
        }
    }

    async fn prepare_relation(
        &self,
        index: usize,
        relation: &Relation,
        reservations: &mut Reservations,
        approve_tx_hash: &mut Option<TxHash>,
    ) -> Prepared<PreparedRelation> {
        let owner = self.owner();
        let source_chain = relation.source;

        let (source, destination, client) = match self.resolve(relation) {
            Ok(resolved) => resolved,
            Err(err) => return Err(Rejection::Skipped(err.to_string())),
        };

        let actual = client.chain_id().await?;
        if actual != source.chain_id() {
            return Err(BridgeError::ChainIdMismatch {
                expected: source.chain_id(),
                actual,
            }
            .into());
        }

        let balance = client.token_balance(source.usdc(), owner).await?;
        let amount = match share_of(balance, relation.percentage) {
            Ok(share) => share.min(reservations.available(source_chain, balance)),
            Err(err) => return Err(Rejection::Skipped(err.to_string())),
        };
        debug!(
            balance = %format_usdc(balance),
            amount = %format_usdc(amount),
            percentage = relation.percentage,
            event = "transfer_amount_computed"
        );
        if amount.is_zero() {
            let err = BridgeError::ZeroAmount {
                reason: format!(
                    "{} USDC available on {source_chain}",
                    format_usdc(reservations.available(source_chain, balance))
                ),
            };
            return Err(Rejection::Skipped(err.to_string()));
        }

        let on_chain = client
            .token_allowance(source.usdc(), owner, source.permit2())
            .await?;
        let allowance = reservations.allowance(source_chain, on_chain);
        let needed = reservations.committed_amount(source_chain).saturating_add(amount);
        if allowance < needed {
            let hash = self
                .approve_permit2(source, client, reservations)
                .instrument(spans::approve_permit2(
                    &source.usdc(),
                    &source.permit2(),
                    &source_chain,
                ))
                .await?;
            *approve_tx_hash = Some(hash);
        }

        let permit_nonce = self
            .find_permit_nonce(source, client, reservations)
            .instrument(spans::scan_permit_nonce(
                &owner,
                &source_chain,
                self.config.max_nonce_words,
            ))
            .await?;

        let now = client.latest_block_timestamp().await?;
        let deadline = U256::from(now.saturating_add(self.config.permit_validity_secs));

        let permit = PermitTransferFrom::new(
            source.usdc(),
            amount,
            source.validator(),
            permit_nonce,
            deadline,
        );
        let domain = permit2_domain(source.chain_id(), source.permit2());
        let signature = self
            .on_device(
                "permit",
                &source_chain,
                self.device.sign_permit(&permit, &domain),
            )
            .await?;

        let request = BridgeRequest {
            token: source.usdc(),
            dst_eid: destination.endpoint_id(),
            dst_address: relation.recipient_or(owner),
            amount,
            min_amount: apply_slippage(amount, self.config.slippage_bps),
            extra_options: self.config.extra_options.clone(),
        };
        let fee = client.quote_bridge(source.validator(), &request).await?;
        debug!(fee = %fee, dst_eid = %request.dst_eid, event = "bridge_fee_quoted");

        let input = receive_and_bridge_gasless_calldata(&permit, owner, &signature, &request);
        let signed = self
            .sign_transaction(
                source,
                client,
                reservations,
                "bridge_transaction",
                source.validator(),
                fee,
                input,
                self.config.gas.bridge_gas_limit,
            )
            .await?;

        reservations.hold_account_nonce(source_chain, signed.nonce());
        reservations.commit_permit_nonce(source_chain, permit_nonce);
        reservations.commit_amount(source_chain, amount);

        Ok(PreparedRelation {
            index,
            relation: relation.clone(),
            permit,
            request,
            fee,
            signed,
            approve_tx_hash: *approve_tx_hash,
        })
    }

    fn resolve(&self, relation: &Relation) -> Result<(&ChainConfig, &ChainConfig, &C)> {
        let source = self.registry.require(relation.source)?;
        let destination = self.registry.require(relation.destination)?;
        let client = self.client(relation.source)?;
        Ok((source, destination, client))
    }

    /// Sends an unlimited USDC approval for Permit2.
    ///
    /// The receipt is awaited only when nothing signed earlier on this source
    /// is still waiting for broadcast. Otherwise the approval sits behind
    /// those nonces and cannot be mined before [`send`](Self::send), which it
    /// still precedes in nonce order.
    async fn approve_permit2(
        &self,
        source: &ChainConfig,
        client: &C,
        reservations: &mut Reservations,
    ) -> Result<TxHash> {
        info!(event = "permit2_approval_required");
        let input = approve_calldata(source.permit2(), U256::MAX);
        let signed = self
            .sign_transaction(
                source,
                client,
                reservations,
                "approve_transaction",
                source.usdc(),
                U256::ZERO,
                input,
                self.config.gas.approve_gas_limit,
            )
            .await?;

        let tx_hash = client.send_raw_transaction(signed.raw()).await?;
        reservations.commit_account_nonce(source.chain(), signed.nonce());
        info!(tx_hash = %tx_hash, nonce = signed.nonce(), event = "permit2_approval_sent");

        if reservations.has_held_transactions(source.chain()) {
            info!(tx_hash = %tx_hash, event = "permit2_approval_queued");
        } else {
            client.wait_for_success(tx_hash).await?;
            info!(tx_hash = %tx_hash, event = "permit2_approval_confirmed");
        }

        reservations.record_approval(source.chain(), U256::MAX);
        Ok(tx_hash)
    }

    /// Scans bitmap words from zero for a nonce neither used on chain nor
    /// reserved earlier in this batch.
    async fn find_permit_nonce(
        &self,
        source: &ChainConfig,
        client: &C,
        reservations: &Reservations,
    ) -> Result<U256> {
        let owner = self.owner();
        for word in 0..self.config.max_nonce_words {
            let mut bitmap = client
                .nonce_bitmap(source.permit2(), owner, U256::from(word))
                .await?;
            reservations.exclude_permit_nonces(source.chain(), &mut bitmap);

            if let Some(nonce) = bitmap.first_unused() {
                debug!(word, nonce = %nonce, event = "permit_nonce_selected");
                return Ok(nonce);
            }
            debug!(word, event = "nonce_word_exhausted");
        }

        Err(BridgeError::NonceSpaceExhausted {
            owner,
            words_scanned: self.config.max_nonce_words,
        })
    }

    /// Builds a transaction at the next free account nonce and has the
    /// device sign it. The nonce is not committed here.
    #[allow(clippy::too_many_arguments)]
    async fn sign_transaction(
        &self,
        source: &ChainConfig,
        client: &C,
        reservations: &Reservations,
        kind: &'static str,
        to: Address,
        value: U256,
        input: alloy_primitives::Bytes,
        gas_limit: u64,
    ) -> Result<SignedTransaction> {
        let pending = client.pending_nonce(self.owner()).await?;
        let nonce = reservations.account_nonce(source.chain(), pending);

        let mut tx = eip1559_transaction(
            source.chain_id(),
            nonce,
            to,
            value,
            input,
            gas_limit,
            &self.config.gas,
        );
        let signature = self
            .on_device(kind, &source.chain(), self.device.sign_transaction(&mut tx))
            .await?;
        let signed = encode_signed(tx, signature);

        info!(
            kind,
            nonce,
            tx_hash = %signed.tx_hash(),
            event = "transaction_signed"
        );
        Ok(signed)
    }

    /// Runs one device request under the signing timeout.
    async fn on_device<T>(
        &self,
        kind: &'static str,
        chain: &NamedChain,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let timeout_secs = self.config.signing_timeout_secs;
        let span = spans::device_signature(kind, chain, timeout_secs);

        async {
            debug!(event = "device_request_pending");
            match tokio::time::timeout(self.config.signing_timeout(), request).await {
                Ok(Ok(value)) => {
                    debug!(event = "device_request_answered");
                    Ok(value)
                }
                Ok(Err(err)) => {
                    spans::record_error(&err);
                    Err(err)
                }
                Err(_) => {
                    let err = BridgeError::DeviceTimeout {
                        operation: kind,
                        timeout_secs,
                    };
                    spans::record_error(&err);
                    warn!(timeout_secs, event = "device_request_timed_out");
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }
}
