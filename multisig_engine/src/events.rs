/// Multisig Kernel v1: Commands and Event Facts
///
/// Commands carry intent and payload only. They contain ZERO transition
/// logic. A command that passes its preconditions yields exactly one
/// `WalletEvent` fact.
///
/// Schema version is locked at 1.

use serde::{Deserialize, Serialize};

use crate::domain::{Address, Amount, TxIndex};

/// Schema version for v1 envelopes. Hardcoded, never changes.
pub const SCHEMA_VERSION: u32 = 1;

/// The intent of one mutating wallet operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum WalletCommand {
    Submit {
        caller: Address,
        recipient: Address,
        amount: Amount,
    },
    Confirm {
        caller: Address,
        index: TxIndex,
    },
    Revoke {
        caller: Address,
        index: TxIndex,
    },
    Execute {
        caller: Address,
        index: TxIndex,
    },
    /// Not owner-restricted: anyone may fund the wallet.
    Deposit { from: Address, amount: Amount },
}

impl WalletCommand {
    pub fn name(&self) -> &'static str {
        match self {
            WalletCommand::Submit { .. } => "submit",
            WalletCommand::Confirm { .. } => "confirm",
            WalletCommand::Revoke { .. } => "revoke",
            WalletCommand::Execute { .. } => "execute",
            WalletCommand::Deposit { .. } => "deposit",
        }
    }

    /// The identity on whose behalf the command runs.
    pub fn actor(&self) -> &Address {
        match self {
            WalletCommand::Submit { caller, .. }
            | WalletCommand::Confirm { caller, .. }
            | WalletCommand::Revoke { caller, .. }
            | WalletCommand::Execute { caller, .. } => caller,
            WalletCommand::Deposit { from, .. } => from,
        }
    }
}

/// What kind of state transition a fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Submitted,
    Confirmed,
    Revoked,
    Executed,
    Deposited,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Submitted => "submitted",
            EventKind::Confirmed => "confirmed",
            EventKind::Revoked => "revoked",
            EventKind::Executed => "executed",
            EventKind::Deposited => "deposited",
        }
    }
}

/// Fact emitted for every accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEvent {
    pub kind: EventKind,
    /// Absent for deposits.
    pub index: Option<TxIndex>,
    pub actor: Address,
    /// Present for submissions, executions and deposits.
    pub amount: Option<Amount>,
}

/// A command stamped with its position in the wallet's command log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub sequence: u64,
    pub schema_version: u32,
    pub command: WalletCommand,
}

impl EventEnvelope {
    pub fn new(sequence: u64, command: WalletCommand) -> Self {
        Self {
            sequence,
            schema_version: SCHEMA_VERSION,
            command,
        }
    }
}
