//! Per-source bookkeeping for one preparation pass
//!
//! Nothing prepared in a batch reaches the chain before broadcast, so the
//! chain's own view of balances and nonces is stale for every relation after
//! the first on a given source. These reservations carry what earlier
//! relations have claimed.

use alloy_chains::NamedChain;
use alloy_primitives::U256;
use std::collections::HashMap;

use crate::protocol::NonceBitmap;

#[derive(Debug, Default)]
struct SourceReservation {
    next_account_nonce: u64,
    /// Signed transactions that wait for broadcast
    held_transactions: usize,
    permit_nonces: Vec<U256>,
    committed_amount: U256,
    approved_allowance: U256,
}

#[derive(Debug, Default)]
pub(crate) struct Reservations {
    sources: HashMap<NamedChain, SourceReservation>,
}

impl Reservations {
    /// Account nonce to use next: the chain's pending nonce, or past the last
    /// one reserved on this source if that is higher.
    pub(crate) fn account_nonce(&self, source: NamedChain, pending: u64) -> u64 {
        self.sources
            .get(&source)
            .map_or(pending, |reserved| reserved.next_account_nonce.max(pending))
    }

    pub(crate) fn commit_account_nonce(&mut self, source: NamedChain, nonce: u64) {
        let reserved = self.sources.entry(source).or_default();
        reserved.next_account_nonce = reserved.next_account_nonce.max(nonce + 1);
    }

    /// Commits the nonce of a transaction that is signed but only broadcast
    /// with the rest of the batch.
    pub(crate) fn hold_account_nonce(&mut self, source: NamedChain, nonce: u64) {
        self.commit_account_nonce(source, nonce);
        if let Some(reserved) = self.sources.get_mut(&source) {
            reserved.held_transactions += 1;
        }
    }

    /// Whether `source` has signed transactions not yet broadcast. Anything
    /// sent now queues behind them on the node.
    pub(crate) fn has_held_transactions(&self, source: NamedChain) -> bool {
        self.sources
            .get(&source)
            .is_some_and(|reserved| reserved.held_transactions > 0)
    }

    /// Amount claimed by relations already prepared on `source`.
    pub(crate) fn committed_amount(&self, source: NamedChain) -> U256 {
        self.sources
            .get(&source)
            .map_or(U256::ZERO, |reserved| reserved.committed_amount)
    }

    /// Permit2 allowance to assume on `source`, counting approvals sent in
    /// this batch that the chain may not reflect yet.
    pub(crate) fn allowance(&self, source: NamedChain, on_chain: U256) -> U256 {
        self.sources
            .get(&source)
            .map_or(on_chain, |reserved| reserved.approved_allowance.max(on_chain))
    }

    pub(crate) fn record_approval(&mut self, source: NamedChain, allowance: U256) {
        let reserved = self.sources.entry(source).or_default();
        reserved.approved_allowance = reserved.approved_allowance.max(allowance);
    }

    /// Balance still unclaimed on `source`.
    pub(crate) fn available(&self, source: NamedChain, balance: U256) -> U256 {
        self.sources
            .get(&source)
            .map_or(balance, |reserved| {
                balance.saturating_sub(reserved.committed_amount)
            })
    }

    pub(crate) fn commit_amount(&mut self, source: NamedChain, amount: U256) {
        self.sources.entry(source).or_default().committed_amount += amount;
    }

    /// Marks permit nonces already reserved on `source` as used in `bitmap`.
    pub(crate) fn exclude_permit_nonces(&self, source: NamedChain, bitmap: &mut NonceBitmap) {
        if let Some(reserved) = self.sources.get(&source) {
            for nonce in &reserved.permit_nonces {
                bitmap.mark_used(*nonce);
            }
        }
    }

    pub(crate) fn commit_permit_nonce(&mut self, source: NamedChain, nonce: U256) {
        self.sources
            .entry(source)
            .or_default()
            .permit_nonces
            .push(nonce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: NamedChain = NamedChain::BaseSepolia;
    const ARB: NamedChain = NamedChain::ArbitrumSepolia;

    #[test]
    fn account_nonce_advances_past_reservations() {
        let mut reservations = Reservations::default();
        assert_eq!(reservations.account_nonce(BASE, 5), 5);

        reservations.commit_account_nonce(BASE, 5);
        assert_eq!(reservations.account_nonce(BASE, 5), 6);
        // The chain moving ahead on its own wins.
        assert_eq!(reservations.account_nonce(BASE, 9), 9);
        assert_eq!(reservations.account_nonce(ARB, 5), 5);
    }

    #[test]
    fn available_balance_shrinks_per_source() {
        let mut reservations = Reservations::default();
        let balance = U256::from(1_000u64);

        reservations.commit_amount(BASE, U256::from(600u64));
        assert_eq!(reservations.available(BASE, balance), U256::from(400u64));
        assert_eq!(reservations.committed_amount(BASE), U256::from(600u64));
        assert_eq!(reservations.committed_amount(ARB), U256::ZERO);
        assert_eq!(reservations.available(ARB, balance), balance);

        reservations.commit_amount(BASE, U256::from(600u64));
        assert_eq!(reservations.available(BASE, balance), U256::ZERO);
    }

    #[test]
    fn held_transactions_are_tracked_per_source() {
        let mut reservations = Reservations::default();
        reservations.commit_account_nonce(BASE, 3);
        assert!(!reservations.has_held_transactions(BASE));

        reservations.hold_account_nonce(BASE, 4);
        assert!(reservations.has_held_transactions(BASE));
        assert!(!reservations.has_held_transactions(ARB));
        assert_eq!(reservations.account_nonce(BASE, 0), 5);
    }

    #[test]
    fn approvals_in_flight_raise_the_assumed_allowance() {
        let mut reservations = Reservations::default();
        let on_chain = U256::from(5u64);
        assert_eq!(reservations.allowance(BASE, on_chain), on_chain);

        reservations.record_approval(BASE, U256::MAX);
        assert_eq!(reservations.allowance(BASE, on_chain), U256::MAX);
        assert_eq!(reservations.allowance(ARB, on_chain), on_chain);
    }

    #[test]
    fn reserved_permit_nonces_are_excluded_from_scan() {
        let mut reservations = Reservations::default();
        reservations.commit_permit_nonce(BASE, U256::ZERO);
        reservations.commit_permit_nonce(BASE, U256::from(1u64));

        let mut bitmap = NonceBitmap::new(U256::ZERO, U256::ZERO);
        reservations.exclude_permit_nonces(BASE, &mut bitmap);
        assert_eq!(bitmap.first_unused(), Some(U256::from(2u64)));

        let mut other = NonceBitmap::new(U256::ZERO, U256::ZERO);
        reservations.exclude_permit_nonces(ARB, &mut other);
        assert_eq!(other.first_unused(), Some(U256::ZERO));
    }
}
