use alloy_primitives::{TxHash, U256};
use std::fmt;

use super::Relation;
use crate::contracts::validator::BridgeRequest;
use crate::protocol::{format_usdc, PermitTransferFrom};
use crate::transaction::SignedTransaction;

/// A relation that made it through preparation and is ready to broadcast
#[derive(Debug, Clone)]
pub struct PreparedRelation {
    pub(crate) index: usize,
    pub(crate) relation: Relation,
    pub(crate) permit: PermitTransferFrom,
    pub(crate) request: BridgeRequest,
    pub(crate) fee: U256,
    pub(crate) signed: SignedTransaction,
    pub(crate) approve_tx_hash: Option<TxHash>,
}

impl PreparedRelation {
    /// Position of the relation in the submitted list
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> String {
        self.relation.key()
    }

    pub fn relation(&self) -> &Relation {
        &self.relation
    }

    /// Permitted USDC amount, in base units
    pub fn amount(&self) -> U256 {
        self.permit.permitted.amount
    }

    /// Native fee attached to the bridge transaction
    pub fn fee(&self) -> U256 {
        self.fee
    }

    pub fn permit_nonce(&self) -> U256 {
        self.permit.nonce
    }

    pub fn account_nonce(&self) -> u64 {
        self.signed.nonce()
    }

    pub fn deadline(&self) -> U256 {
        self.permit.deadline
    }

    pub fn permit(&self) -> &PermitTransferFrom {
        &self.permit
    }

    pub fn request(&self) -> &BridgeRequest {
        &self.request
    }

    pub fn signed(&self) -> &SignedTransaction {
        &self.signed
    }

    /// Hash of the Permit2 approval sent while preparing, if one was needed
    pub fn approve_tx_hash(&self) -> Option<TxHash> {
        self.approve_tx_hash
    }
}

/// Output of the preparation pass
///
/// Holds the signed transactions and the outcomes of relations that were
/// already settled during preparation (skipped or failed).
#[derive(Debug, Clone, Default)]
pub struct PreparedBatch {
    pub(crate) prepared: Vec<PreparedRelation>,
    pub(crate) settled: Vec<RelationOutcome>,
}

impl PreparedBatch {
    pub fn prepared(&self) -> &[PreparedRelation] {
        &self.prepared
    }

    /// Relations that will not be broadcast
    pub fn settled(&self) -> &[RelationOutcome] {
        &self.settled
    }

    pub fn len(&self) -> usize {
        self.prepared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prepared.is_empty()
    }
}

/// Which half of the batch a relation failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Preparation,
    Broadcast,
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Preparation => write!(f, "preparation"),
            FailureStage::Broadcast => write!(f, "broadcast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationStatus {
    /// The bridge transaction was accepted by the source chain's node
    Sent {
        tx_hash: TxHash,
        approve_tx_hash: Option<TxHash>,
    },
    /// An approval sent before the failure is still reported.
    Failed {
        stage: FailureStage,
        reason: String,
        approve_tx_hash: Option<TxHash>,
    },
    /// Nothing was signed or sent for the relation
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationOutcome {
    pub index: usize,
    pub relation: Relation,
    pub status: RelationStatus,
}

impl RelationOutcome {
    pub fn key(&self) -> String {
        self.relation.key()
    }

    pub fn is_sent(&self) -> bool {
        matches!(self.status, RelationStatus::Sent { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, RelationStatus::Failed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, RelationStatus::Skipped { .. })
    }
}

impl fmt::Display for RelationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            RelationStatus::Sent { tx_hash, .. } => {
                write!(f, "#{} {}: sent {tx_hash}", self.index, self.key())
            }
            RelationStatus::Failed { stage, reason, .. } => {
                write!(f, "#{} {}: failed in {stage}: {reason}", self.index, self.key())
            }
            RelationStatus::Skipped { reason } => {
                write!(f, "#{} {}: skipped: {reason}", self.index, self.key())
            }
        }
    }
}

/// One outcome per submitted relation, ordered by relation index
///
/// # Example
///
/// ```rust
/// use permit2_bridge::BatchReport;
///
/// let report = BatchReport::default();
/// assert_eq!(report.total_attempted(), 0);
/// assert!(!report.all_succeeded());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    outcomes: Vec<RelationOutcome>,
}

impl BatchReport {
    pub(crate) fn new(mut outcomes: Vec<RelationOutcome>) -> Self {
        outcomes.sort_by_key(|outcome| outcome.index);
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[RelationOutcome] {
        &self.outcomes
    }

    pub fn successful(&self) -> impl Iterator<Item = &RelationOutcome> {
        self.outcomes.iter().filter(|o| o.is_sent())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RelationOutcome> {
        self.outcomes.iter().filter(|o| o.is_failed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RelationOutcome> {
        self.outcomes.iter().filter(|o| o.is_skipped())
    }

    /// Relations that were sent or failed; skipped ones do not count.
    pub fn total_attempted(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_skipped()).count()
    }

    /// True when at least one relation was attempted and every attempt was
    /// sent.
    pub fn all_succeeded(&self) -> bool {
        self.total_attempted() > 0 && self.failed().next().is_none()
    }

    /// Transaction hashes of sent relations, by relation key
    pub fn sent_hashes(&self) -> Vec<(String, TxHash)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o.status {
                RelationStatus::Sent { tx_hash, .. } => Some((o.key(), tx_hash)),
                _ => None,
            })
            .collect()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} sent, {} failed, {} skipped",
            self.successful().count(),
            self.failed().count(),
            self.skipped().count()
        )?;
        for outcome in &self.outcomes {
            writeln!(f, "  {outcome}")?;
        }
        Ok(())
    }
}

impl fmt::Display for PreparedRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {}: {} USDC, permit nonce {}, account nonce {}",
            self.index,
            self.key(),
            format_usdc(self.amount()),
            self.permit_nonce(),
            self.account_nonce()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_chains::NamedChain;

    fn outcome(index: usize, status: RelationStatus) -> RelationOutcome {
        RelationOutcome {
            index,
            relation: Relation::new(NamedChain::BaseSepolia, NamedChain::ArbitrumSepolia),
            status,
        }
    }

    fn sent(index: usize) -> RelationOutcome {
        outcome(
            index,
            RelationStatus::Sent {
                tx_hash: TxHash::repeat_byte(index as u8),
                approve_tx_hash: None,
            },
        )
    }

    fn skipped(index: usize) -> RelationOutcome {
        outcome(
            index,
            RelationStatus::Skipped {
                reason: "zero balance".to_string(),
            },
        )
    }

    fn failed(index: usize) -> RelationOutcome {
        outcome(
            index,
            RelationStatus::Failed {
                stage: FailureStage::Broadcast,
                reason: "nonce too low".to_string(),
                approve_tx_hash: None,
            },
        )
    }

    #[test]
    fn outcomes_are_ordered_by_index() {
        let report = BatchReport::new(vec![sent(2), skipped(0), failed(1)]);
        let indices: Vec<_> = report.outcomes().iter().map(|o| o.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn skipped_relations_are_not_attempts() {
        let report = BatchReport::new(vec![sent(0), skipped(1)]);
        assert_eq!(report.total_attempted(), 1);
        assert!(report.all_succeeded());
    }

    #[test]
    fn all_skipped_is_not_success() {
        let report = BatchReport::new(vec![skipped(0), skipped(1)]);
        assert_eq!(report.total_attempted(), 0);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn one_failure_breaks_success() {
        let report = BatchReport::new(vec![sent(0), failed(1)]);
        assert_eq!(report.total_attempted(), 2);
        assert!(!report.all_succeeded());
        assert_eq!(report.sent_hashes().len(), 1);
    }

    #[test]
    fn report_display() {
        let report = BatchReport::new(vec![skipped(1), failed(0)]);
        insta::assert_snapshot!(report.to_string().trim_end(), @r"
        0 sent, 1 failed, 1 skipped
          #0 base-sepolia->arbitrum-sepolia: failed in broadcast: nonce too low
          #1 base-sepolia->arbitrum-sepolia: skipped: zero balance
        ");
    }
}
