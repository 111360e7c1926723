/// Multisig Kernel v1: Invariant Checks
///
/// Whole-state validation. Returns the first violation found.
/// The transition layer cannot produce a violating state; these checks
/// guard state loaded from outside (snapshots) and back debug assertions.

use std::collections::BTreeSet;

use crate::domain::WalletState;
use crate::error::InvariantViolation;
use crate::state::validate_owner_set;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run every invariant check.
pub fn try_validate_invariants(state: &WalletState) -> Result<(), InvariantViolation> {
    check_owner_set(state)?;
    check_index_sequence(state)?;
    check_positive_amounts(state)?;
    check_confirmations_are_owners(state)?;
    check_unique_confirmations(state)?;
    check_quorum_before_execution(state)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Individual checks (private)
// ---------------------------------------------------------------------------

/// INV-1: owners non-empty and duplicate-free, 1 <= threshold <= N.
fn check_owner_set(state: &WalletState) -> Result<(), InvariantViolation> {
    validate_owner_set(&state.owners, state.threshold).map_err(InvariantViolation::OwnerSet)
}

/// INV-2: the k-th transaction carries index k.
fn check_index_sequence(state: &WalletState) -> Result<(), InvariantViolation> {
    for (position, tx) in state.transactions.iter().enumerate() {
        if tx.index != position as u64 {
            return Err(InvariantViolation::IndexSequence {
                position,
                index: tx.index,
            });
        }
    }
    Ok(())
}

/// INV-3: every transaction moves a positive amount.
fn check_positive_amounts(state: &WalletState) -> Result<(), InvariantViolation> {
    match state.transactions.iter().find(|tx| tx.amount == 0) {
        Some(tx) => Err(InvariantViolation::ZeroAmount(tx.index)),
        None => Ok(()),
    }
}

/// INV-4: confirmations are only ever recorded for owners.
fn check_confirmations_are_owners(state: &WalletState) -> Result<(), InvariantViolation> {
    for tx in &state.transactions {
        if let Some(who) = tx.confirmations.iter().find(|c| !state.is_owner(c)) {
            return Err(InvariantViolation::NonOwnerConfirmation {
                index: tx.index,
                who: who.clone(),
            });
        }
    }
    Ok(())
}

/// INV-5: one vote per owner per transaction.
fn check_unique_confirmations(state: &WalletState) -> Result<(), InvariantViolation> {
    for tx in &state.transactions {
        let mut seen = BTreeSet::new();
        for who in &tx.confirmations {
            if !seen.insert(who) {
                return Err(InvariantViolation::DuplicateConfirmation {
                    index: tx.index,
                    who: who.clone(),
                });
            }
        }
    }
    Ok(())
}

/// INV-6: executed implies confirmations >= threshold.
fn check_quorum_before_execution(state: &WalletState) -> Result<(), InvariantViolation> {
    for tx in &state.transactions {
        if tx.executed && tx.confirmations.len() < state.threshold as usize {
            return Err(InvariantViolation::ExecutedWithoutQuorum {
                index: tx.index,
                confirmations: tx.confirmations.len(),
                threshold: state.threshold,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Address, Transaction};
    use crate::state::{create_initial_state, parse_owners};

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn wallet_with(tx: Transaction) -> WalletState {
        let mut state =
            create_initial_state(parse_owners(&["alice", "bob", "carol"]).unwrap(), 2).unwrap();
        state.transactions.push(tx);
        state
    }

    fn tx(confirmations: &[&str], executed: bool) -> Transaction {
        Transaction {
            index: 0,
            recipient: addr("dave"),
            amount: 100,
            confirmations: confirmations.iter().map(|c| addr(c)).collect(),
            executed,
        }
    }

    #[test]
    fn valid_state_passes() {
        assert!(try_validate_invariants(&wallet_with(tx(&["alice", "bob"], true))).is_ok());
    }

    #[test]
    fn detects_non_owner_confirmation() {
        let state = wallet_with(tx(&["alice", "mallory"], false));
        assert!(matches!(
            try_validate_invariants(&state),
            Err(InvariantViolation::NonOwnerConfirmation { index: 0, .. })
        ));
    }

    #[test]
    fn detects_duplicate_confirmation() {
        let state = wallet_with(tx(&["bob", "bob"], false));
        assert!(matches!(
            try_validate_invariants(&state),
            Err(InvariantViolation::DuplicateConfirmation { index: 0, .. })
        ));
    }

    #[test]
    fn detects_execution_without_quorum() {
        let state = wallet_with(tx(&["alice"], true));
        assert_eq!(
            try_validate_invariants(&state),
            Err(InvariantViolation::ExecutedWithoutQuorum {
                index: 0,
                confirmations: 1,
                threshold: 2
            })
        );
    }

    #[test]
    fn detects_index_gap() {
        let mut bad = tx(&[], false);
        bad.index = 3;
        assert!(matches!(
            try_validate_invariants(&wallet_with(bad)),
            Err(InvariantViolation::IndexSequence { position: 0, index: 3 })
        ));
    }

    #[test]
    fn detects_bad_threshold() {
        let mut state = wallet_with(tx(&[], false));
        state.threshold = 4;
        assert!(matches!(
            try_validate_invariants(&state),
            Err(InvariantViolation::OwnerSet(_))
        ));
    }
}
