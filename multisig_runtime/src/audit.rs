//! Audit helpers: determinism verification and ledger comparison.
//!
//! Amounts stay in integer units throughout. A balance change is reported
//! as a direction plus magnitude so no signed type can overflow.

use multisig_engine::domain::{Address, Amount, TxIndex, WalletState};
use multisig_engine::events::EventEnvelope;

use crate::error::RuntimeError;
use crate::replay;

/// Replay the same envelopes twice and require identical hashes.
///
/// Returns the agreed hash.
pub fn verify_determinism(
    owners: &[Address],
    threshold: u32,
    envelopes: &[EventEnvelope],
) -> Result<String, RuntimeError> {
    let first = replay::rebuild_hash(owners, threshold, envelopes)?;
    let second = replay::rebuild_hash(owners, threshold, envelopes)?;

    if first != second {
        tracing::error!(%first, %second, "replays diverged");
        return Err(RuntimeError::Nondeterministic { first, second });
    }
    Ok(first)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceChange {
    Unchanged,
    Increased(Amount),
    Decreased(Amount),
}

/// Confirmation set differences for one transaction present in both states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationChange {
    pub index: TxIndex,
    pub added: Vec<Address>,
    pub removed: Vec<Address>,
}

/// What changed between two states of the same wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDiff {
    pub balance_before: Amount,
    pub balance_after: Amount,
    pub balance_change: BalanceChange,
    /// Indices present in the second state only.
    pub transactions_added: Vec<TxIndex>,
    /// Present in both, executed only in the second.
    pub newly_executed: Vec<TxIndex>,
    pub confirmation_changes: Vec<ConfirmationChange>,
}

impl LedgerDiff {
    pub fn is_empty(&self) -> bool {
        self.balance_change == BalanceChange::Unchanged
            && self.transactions_added.is_empty()
            && self.newly_executed.is_empty()
            && self.confirmation_changes.is_empty()
    }
}

/// Structured comparison of `before` and `after`.
pub fn compare_states(before: &WalletState, after: &WalletState) -> LedgerDiff {
    let (a, b) = (before.balance(), after.balance());
    let balance_change = match b.cmp(&a) {
        std::cmp::Ordering::Equal => BalanceChange::Unchanged,
        std::cmp::Ordering::Greater => BalanceChange::Increased(b - a),
        std::cmp::Ordering::Less => BalanceChange::Decreased(a - b),
    };

    let old = before.transactions();
    let new = after.transactions();

    let mut transactions_added = Vec::new();
    let mut newly_executed = Vec::new();
    let mut confirmation_changes = Vec::new();

    for tx in &new {
        // Position equals index in every valid state.
        let prev = usize::try_from(tx.index)
            .ok()
            .and_then(|i| old.get(i))
            .filter(|p| p.index == tx.index);
        let Some(prev) = prev else {
            transactions_added.push(tx.index);
            continue;
        };
        if tx.executed && !prev.executed {
            newly_executed.push(tx.index);
        }

        let added: Vec<Address> = tx
            .confirmations
            .iter()
            .filter(|who| !prev.confirmations.contains(who))
            .cloned()
            .collect();
        let removed: Vec<Address> = prev
            .confirmations
            .iter()
            .filter(|who| !tx.confirmations.contains(who))
            .cloned()
            .collect();
        if !added.is_empty() || !removed.is_empty() {
            confirmation_changes.push(ConfirmationChange {
                index: tx.index,
                added,
                removed,
            });
        }
    }

    LedgerDiff {
        balance_before: a,
        balance_after: b,
        balance_change,
        transactions_added,
        newly_executed,
        confirmation_changes,
    }
}
