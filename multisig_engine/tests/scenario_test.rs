/// Walkthrough tests of the authorization state machine.
///
/// Three owners, quorum of two, one outside recipient (Dave).

use multisig_engine::domain::{Address, TxStatus};
use multisig_engine::engine::MultisigEngine;
use multisig_engine::error::WalletError;
use multisig_engine::hashing::canonical_hash;

fn addr(s: &str) -> Address {
    Address::parse(s).unwrap()
}

fn alice() -> Address {
    addr("alice")
}
fn bob() -> Address {
    addr("bob")
}
fn carol() -> Address {
    addr("carol")
}
fn dave() -> Address {
    addr("dave")
}

fn wallet() -> MultisigEngine {
    MultisigEngine::new(vec![alice(), bob(), carol()], 2).unwrap()
}

/// Wallet funded with 50, one transfer of 100 to Dave confirmed by Alice and Bob.
fn executable_but_underfunded() -> MultisigEngine {
    let mut w = wallet();
    w.deposit(&dave(), 50).unwrap();
    let index = w.submit(&alice(), &dave(), 100).unwrap();
    assert_eq!(index, 0);
    w.confirm(&alice(), 0).unwrap();
    w.confirm(&bob(), 0).unwrap();
    w
}

// ─────────────────────────────────────────────────────────────
// Scenario A: quorum, then funds, then execution
// ─────────────────────────────────────────────────────────────

#[test]
fn scenario_a_quorum_then_funds_then_execute() {
    let mut w = wallet();
    w.deposit(&dave(), 50).unwrap();

    assert_eq!(w.submit(&alice(), &dave(), 100), Ok(0));
    assert_eq!(w.state().status(0), Ok(TxStatus::Proposed));

    w.confirm(&alice(), 0).unwrap();
    assert_eq!(w.state().confirmers_of(0).unwrap(), &[alice()]);
    assert_eq!(w.state().can_execute(0), Ok(false));

    w.confirm(&bob(), 0).unwrap();
    assert_eq!(w.state().confirmers_of(0).unwrap(), &[alice(), bob()]);
    assert_eq!(w.state().can_execute(0), Ok(true));

    assert_eq!(
        w.execute(&carol(), 0),
        Err(WalletError::InsufficientFunds {
            balance: 50,
            required: 100
        })
    );
    assert!(!w.state().transaction(0).unwrap().executed);

    w.deposit(&dave(), 100).unwrap();
    assert_eq!(w.state().balance(), 150);

    w.execute(&carol(), 0).unwrap();
    assert_eq!(w.state().balance(), 50);
    let view = w.state().transaction(0).unwrap();
    assert!(view.executed);
    assert_eq!(view.status, TxStatus::Executed);
}

// ─────────────────────────────────────────────────────────────
// Scenario B: one vote per owner
// ─────────────────────────────────────────────────────────────

#[test]
fn scenario_b_double_confirm_is_refused() {
    let mut w = wallet();
    w.submit(&alice(), &dave(), 100).unwrap();
    w.confirm(&bob(), 0).unwrap();
    assert_eq!(
        w.confirm(&bob(), 0),
        Err(WalletError::AlreadyConfirmed {
            index: 0,
            owner: bob()
        })
    );
    assert_eq!(w.state().transaction(0).unwrap().num_confirmations, 1);
}

// ─────────────────────────────────────────────────────────────
// Scenario C: outsiders cannot vote
// ─────────────────────────────────────────────────────────────

#[test]
fn scenario_c_non_owner_confirm_leaves_state_unchanged() {
    let mut w = wallet();
    w.submit(&alice(), &dave(), 100).unwrap();
    let before = canonical_hash(w.state());
    let seq = w.last_sequence();

    assert_eq!(w.confirm(&dave(), 0), Err(WalletError::NotOwner(dave())));
    assert_eq!(canonical_hash(w.state()), before);
    assert_eq!(w.last_sequence(), seq);
}

// ─────────────────────────────────────────────────────────────
// Scenario D: execution is terminal
// ─────────────────────────────────────────────────────────────

#[test]
fn scenario_d_revoke_after_execute_is_refused() {
    let mut w = executable_but_underfunded();
    w.deposit(&dave(), 100).unwrap();
    w.execute(&carol(), 0).unwrap();

    assert_eq!(w.revoke(&alice(), 0), Err(WalletError::AlreadyExecuted(0)));
    assert_eq!(w.confirm(&carol(), 0), Err(WalletError::AlreadyExecuted(0)));
    assert_eq!(w.execute(&bob(), 0), Err(WalletError::AlreadyExecuted(0)));
    assert_eq!(w.state().balance(), 50);
}

// ─────────────────────────────────────────────────────────────
// Revocation moves a transaction backwards
// ─────────────────────────────────────────────────────────────

#[test]
fn revoke_drops_below_quorum() {
    let mut w = executable_but_underfunded();
    w.deposit(&dave(), 100).unwrap();
    assert_eq!(w.state().status(0), Ok(TxStatus::Executable));

    w.revoke(&bob(), 0).unwrap();
    assert_eq!(w.state().status(0), Ok(TxStatus::Confirming));
    assert_eq!(
        w.execute(&carol(), 0),
        Err(WalletError::QuorumNotMet {
            index: 0,
            confirmations: 1,
            threshold: 2
        })
    );

    w.revoke(&alice(), 0).unwrap();
    assert_eq!(w.state().status(0), Ok(TxStatus::Proposed));
    assert_eq!(w.state().balance(), 150);
}

#[test]
fn revoke_without_confirmation_is_refused() {
    let mut w = wallet();
    w.submit(&alice(), &dave(), 100).unwrap();
    assert_eq!(
        w.revoke(&carol(), 0),
        Err(WalletError::NotConfirmed {
            index: 0,
            owner: carol()
        })
    );
}

#[test]
fn confirm_revoke_confirm_leaves_single_membership() {
    let mut w = wallet();
    w.submit(&alice(), &dave(), 100).unwrap();
    w.confirm(&carol(), 0).unwrap();
    w.revoke(&carol(), 0).unwrap();
    w.confirm(&carol(), 0).unwrap();
    assert_eq!(w.state().confirmers_of(0).unwrap(), &[carol()]);
    assert_eq!(w.state().is_confirmed_by(0, &carol()), Ok(true));
}

// ─────────────────────────────────────────────────────────────
// Error precedence and input validation
// ─────────────────────────────────────────────────────────────

#[test]
fn unknown_index_is_refused_for_every_operation() {
    let mut w = wallet();
    assert_eq!(w.confirm(&alice(), 3), Err(WalletError::UnknownTransaction(3)));
    assert_eq!(w.revoke(&alice(), 3), Err(WalletError::UnknownTransaction(3)));
    assert_eq!(w.execute(&alice(), 3), Err(WalletError::UnknownTransaction(3)));
}

#[test]
fn non_owner_cannot_submit_or_execute() {
    let mut w = executable_but_underfunded();
    assert_eq!(
        w.submit(&dave(), &dave(), 1),
        Err(WalletError::NotOwner(dave()))
    );
    assert_eq!(w.execute(&dave(), 0), Err(WalletError::NotOwner(dave())));
}

#[test]
fn zero_amounts_are_refused() {
    let mut w = wallet();
    assert_eq!(w.submit(&alice(), &dave(), 0), Err(WalletError::InvalidAmount));
    assert_eq!(w.deposit(&dave(), 0), Err(WalletError::InvalidAmount));
    assert_eq!(w.state().transaction_count(), 0);
}

#[test]
fn indices_are_gapless_even_after_refusals() {
    let mut w = wallet();
    assert_eq!(w.submit(&alice(), &dave(), 1), Ok(0));
    assert!(w.submit(&dave(), &dave(), 1).is_err());
    assert!(w.submit(&alice(), &dave(), 0).is_err());
    assert_eq!(w.submit(&bob(), &carol(), 2), Ok(1));
    assert_eq!(w.submit(&carol(), &alice(), 3), Ok(2));
    let indices: Vec<u64> = w.state().transactions().iter().map(|t| t.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn owner_may_propose_transfer_to_themselves() {
    let mut w = wallet();
    w.deposit(&dave(), 10).unwrap();
    w.submit(&alice(), &alice(), 10).unwrap();
    w.confirm(&bob(), 0).unwrap();
    w.confirm(&carol(), 0).unwrap();
    w.execute(&alice(), 0).unwrap();
    assert_eq!(w.state().balance(), 0);
}

#[test]
fn unanimous_threshold_requires_every_owner() {
    let mut w = MultisigEngine::new(vec![alice(), bob(), carol()], 3).unwrap();
    w.deposit(&dave(), 10).unwrap();
    w.submit(&alice(), &dave(), 10).unwrap();
    w.confirm(&alice(), 0).unwrap();
    w.confirm(&bob(), 0).unwrap();
    assert!(matches!(
        w.execute(&alice(), 0),
        Err(WalletError::QuorumNotMet { .. })
    ));
    w.confirm(&carol(), 0).unwrap();
    assert!(w.execute(&alice(), 0).is_ok());
}

#[test]
fn independent_transactions_do_not_share_votes() {
    let mut w = wallet();
    w.deposit(&dave(), 1_000).unwrap();
    w.submit(&alice(), &dave(), 100).unwrap();
    w.submit(&alice(), &dave(), 200).unwrap();
    w.confirm(&alice(), 0).unwrap();
    w.confirm(&bob(), 1).unwrap();
    assert_eq!(w.state().can_execute(0), Ok(false));
    assert_eq!(w.state().can_execute(1), Ok(false));
    w.confirm(&carol(), 1).unwrap();
    w.execute(&carol(), 1).unwrap();
    assert_eq!(w.state().balance(), 800);
    assert_eq!(w.state().pending().len(), 1);
}
