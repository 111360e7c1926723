/// Multisig Kernel v1: Centralized Transition Logic
///
/// ALL state-mutation logic lives here.
///
/// Every handler runs in two phases: `check` reads the state and either
/// refuses with a typed `WalletError` or produces the fact the command will
/// emit; only then does `apply_command` mutate. A refused command therefore
/// leaves the state untouched.

use crate::arithmetic::{checked_credit, checked_debit};
use crate::domain::{Address, Amount, Transaction, TxIndex, WalletState};
use crate::error::WalletError;
use crate::events::{EventKind, WalletCommand, WalletEvent};

// ---------------------------------------------------------------------------
// Public dispatcher
// ---------------------------------------------------------------------------

/// Check every precondition of `command` against `state` without mutating.
///
/// Returns the fact that applying the command would emit.
pub fn check(state: &WalletState, command: &WalletCommand) -> Result<WalletEvent, WalletError> {
    match command {
        WalletCommand::Submit {
            caller,
            recipient: _,
            amount,
        } => check_submit(state, caller, *amount),
        WalletCommand::Confirm { caller, index } => check_confirm(state, caller, *index),
        WalletCommand::Revoke { caller, index } => check_revoke(state, caller, *index),
        WalletCommand::Execute { caller, index } => check_execute(state, caller, *index),
        WalletCommand::Deposit { from, amount } => check_deposit(state, from, *amount),
    }
}

/// Check `command`, then apply it to `state`.
pub fn apply_command(
    state: &mut WalletState,
    command: &WalletCommand,
) -> Result<WalletEvent, WalletError> {
    let event = check(state, command)?;

    match command {
        WalletCommand::Submit {
            recipient, amount, ..
        } => {
            let index = state.next_index();
            state.transactions.push(Transaction {
                index,
                recipient: recipient.clone(),
                amount: *amount,
                confirmations: Vec::new(),
                executed: false,
            });
        }
        WalletCommand::Confirm { caller, index } => {
            pending_mut(state, *index)?.confirmations.push(caller.clone());
        }
        WalletCommand::Revoke { caller, index } => {
            pending_mut(state, *index)?
                .confirmations
                .retain(|owner| owner != caller);
        }
        WalletCommand::Execute { index, .. } => {
            let remaining = checked_debit(state.balance, pending(state, *index)?.amount)?;
            pending_mut(state, *index)?.executed = true;
            state.balance = remaining;
        }
        WalletCommand::Deposit { amount, .. } => {
            state.balance = checked_credit(state.balance, *amount)?;
        }
    }

    Ok(event)
}

// ---------------------------------------------------------------------------
// Precondition checks (private)
// ---------------------------------------------------------------------------

fn require_owner(state: &WalletState, caller: &Address) -> Result<(), WalletError> {
    if state.is_owner(caller) {
        Ok(())
    } else {
        Err(WalletError::NotOwner(caller.clone()))
    }
}

/// Existing and not yet executed.
fn pending(state: &WalletState, index: TxIndex) -> Result<&Transaction, WalletError> {
    let tx = state
        .transaction_ref(index)
        .ok_or(WalletError::UnknownTransaction(index))?;
    if tx.executed {
        return Err(WalletError::AlreadyExecuted(index));
    }
    Ok(tx)
}

fn pending_mut(state: &mut WalletState, index: TxIndex) -> Result<&mut Transaction, WalletError> {
    let tx = state
        .transaction_mut(index)
        .ok_or(WalletError::UnknownTransaction(index))?;
    if tx.executed {
        return Err(WalletError::AlreadyExecuted(index));
    }
    Ok(tx)
}

fn check_submit(
    state: &WalletState,
    caller: &Address,
    amount: Amount,
) -> Result<WalletEvent, WalletError> {
    require_owner(state, caller)?;
    if amount == 0 {
        return Err(WalletError::InvalidAmount);
    }

    Ok(WalletEvent {
        kind: EventKind::Submitted,
        index: Some(state.next_index()),
        actor: caller.clone(),
        amount: Some(amount),
    })
}

fn check_confirm(
    state: &WalletState,
    caller: &Address,
    index: TxIndex,
) -> Result<WalletEvent, WalletError> {
    require_owner(state, caller)?;
    let tx = pending(state, index)?;
    if tx.is_confirmed_by(caller) {
        return Err(WalletError::AlreadyConfirmed {
            index,
            owner: caller.clone(),
        });
    }

    Ok(WalletEvent {
        kind: EventKind::Confirmed,
        index: Some(index),
        actor: caller.clone(),
        amount: None,
    })
}

fn check_revoke(
    state: &WalletState,
    caller: &Address,
    index: TxIndex,
) -> Result<WalletEvent, WalletError> {
    require_owner(state, caller)?;
    let tx = pending(state, index)?;
    if !tx.is_confirmed_by(caller) {
        return Err(WalletError::NotConfirmed {
            index,
            owner: caller.clone(),
        });
    }

    Ok(WalletEvent {
        kind: EventKind::Revoked,
        index: Some(index),
        actor: caller.clone(),
        amount: None,
    })
}

/// The quorum checkpoint: the only transition gated on a count.
fn check_execute(
    state: &WalletState,
    caller: &Address,
    index: TxIndex,
) -> Result<WalletEvent, WalletError> {
    require_owner(state, caller)?;
    let tx = pending(state, index)?;

    let confirmations = tx.confirmations.len();
    if confirmations < state.threshold as usize {
        return Err(WalletError::QuorumNotMet {
            index,
            confirmations,
            threshold: state.threshold,
        });
    }
    checked_debit(state.balance, tx.amount)?;

    Ok(WalletEvent {
        kind: EventKind::Executed,
        index: Some(index),
        actor: caller.clone(),
        amount: Some(tx.amount),
    })
}

fn check_deposit(
    state: &WalletState,
    from: &Address,
    amount: Amount,
) -> Result<WalletEvent, WalletError> {
    if amount == 0 {
        return Err(WalletError::InvalidAmount);
    }
    checked_credit(state.balance, amount)?;

    Ok(WalletEvent {
        kind: EventKind::Deposited,
        index: None,
        actor: from.clone(),
        amount: Some(amount),
    })
}
