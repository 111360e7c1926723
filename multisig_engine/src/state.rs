/// Multisig Kernel v1: State Construction
///
/// The owner set and threshold are fixed here and never change afterwards.

use std::collections::BTreeSet;

use crate::domain::{Address, WalletState};
use crate::error::SetupError;

/// Create a fresh wallet with zero balance and an empty transaction log.
///
/// Owners keep the order given; `list_owners` reports them in that order.
pub fn create_initial_state(
    owners: Vec<Address>,
    threshold: u32,
) -> Result<WalletState, SetupError> {
    validate_owner_set(&owners, threshold)?;
    Ok(WalletState {
        owners,
        threshold,
        balance: 0,
        transactions: Vec::new(),
    })
}

/// Non-empty, duplicate-free, and `1 <= threshold <= owners.len()`.
pub fn validate_owner_set(owners: &[Address], threshold: u32) -> Result<(), SetupError> {
    if owners.is_empty() {
        return Err(SetupError::NoOwners);
    }

    let mut seen = BTreeSet::new();
    for owner in owners {
        if !seen.insert(owner) {
            return Err(SetupError::DuplicateOwner(owner.clone()));
        }
    }

    if threshold == 0 || threshold as usize > owners.len() {
        return Err(SetupError::InvalidThreshold {
            threshold,
            owners: owners.len(),
        });
    }
    Ok(())
}

/// Parse a list of raw owner strings.
pub fn parse_owners<S: AsRef<str>>(raw: &[S]) -> Result<Vec<Address>, SetupError> {
    raw.iter().map(|s| Address::parse(s.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners(names: &[&str]) -> Vec<Address> {
        parse_owners(names).unwrap()
    }

    #[test]
    fn initial_state_is_empty() {
        let state = create_initial_state(owners(&["alice", "bob", "carol"]), 2).unwrap();
        assert_eq!(state.balance, 0);
        assert!(state.transactions.is_empty());
        assert_eq!(state.threshold, 2);
    }

    #[test]
    fn rejects_empty_owner_set() {
        assert_eq!(create_initial_state(Vec::new(), 1), Err(SetupError::NoOwners));
    }

    #[test]
    fn rejects_duplicate_owner() {
        let err = create_initial_state(owners(&["alice", "bob", "alice"]), 2).unwrap_err();
        assert_eq!(err, SetupError::DuplicateOwner(Address::parse("alice").unwrap()));
    }

    #[test]
    fn rejects_threshold_out_of_range() {
        assert!(matches!(
            create_initial_state(owners(&["alice", "bob"]), 0),
            Err(SetupError::InvalidThreshold { threshold: 0, owners: 2 })
        ));
        assert!(matches!(
            create_initial_state(owners(&["alice", "bob"]), 3),
            Err(SetupError::InvalidThreshold { threshold: 3, owners: 2 })
        ));
    }

    #[test]
    fn single_owner_single_vote_is_valid() {
        assert!(create_initial_state(owners(&["solo"]), 1).is_ok());
    }
}
