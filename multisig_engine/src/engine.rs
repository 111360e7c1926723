/// Multisig Kernel v1: Engine
///
/// Top-level orchestrator. Delegates mutation to transitions,
/// enforces envelope sequencing, and exposes the wallet operations.
///
/// The engine itself is single-threaded (`&mut self`); callers that share
/// a wallet across threads serialize access around it.

use crate::domain::{Address, Amount, TxIndex, WalletState};
use crate::error::{EngineError, SetupError, WalletError};
use crate::events::{EventEnvelope, WalletCommand, WalletEvent, SCHEMA_VERSION};
use crate::invariants::try_validate_invariants;
use crate::state::create_initial_state;
use crate::transitions;

/// Stateful engine wrapping the pure transition layer.
#[derive(Debug, Clone)]
pub struct MultisigEngine {
    state: WalletState,
    last_sequence: u64,
}

impl MultisigEngine {
    /// Create an engine around a fresh wallet.
    pub fn new(owners: Vec<Address>, threshold: u32) -> Result<Self, SetupError> {
        Ok(Self {
            state: create_initial_state(owners, threshold)?,
            last_sequence: 0,
        })
    }

    /// Resume from a state that was committed at `last_sequence`.
    /// The state must already have passed invariant validation.
    pub fn from_state(state: WalletState, last_sequence: u64) -> Self {
        Self {
            state,
            last_sequence,
        }
    }

    pub fn state(&self) -> &WalletState {
        &self.state
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Stamp `command` with the next sequence number.
    pub fn envelope(&self, command: WalletCommand) -> EventEnvelope {
        EventEnvelope::new(self.last_sequence + 1, command)
    }

    /// Check a command against the current state without applying it.
    pub fn check(&self, command: &WalletCommand) -> Result<WalletEvent, WalletError> {
        transitions::check(&self.state, command)
    }

    /// Apply a single envelope:
    ///   1. Validate schema version
    ///   2. Validate sequence (strictly increasing, no gaps)
    ///   3. Delegate to transitions; the sequence advances only if the
    ///      command was accepted
    pub fn apply_event(&mut self, envelope: &EventEnvelope) -> Result<WalletEvent, EngineError> {
        if envelope.schema_version != SCHEMA_VERSION {
            return Err(EngineError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                got: envelope.schema_version,
            });
        }

        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(EngineError::SequenceViolation {
                expected,
                got: envelope.sequence,
            });
        }

        Ok(self.dispatch(envelope.command.clone())?)
    }

    /// Apply an unsequenced command at the next sequence number.
    pub fn dispatch(&mut self, command: WalletCommand) -> Result<WalletEvent, WalletError> {
        let event = transitions::apply_command(&mut self.state, &command)?;
        debug_assert_eq!(try_validate_invariants(&self.state), Ok(()));
        self.last_sequence += 1;
        Ok(event)
    }

    /// Event-sourced reconstruction: fresh wallet, then every envelope in order.
    pub fn replay(
        owners: Vec<Address>,
        threshold: u32,
        envelopes: &[EventEnvelope],
    ) -> Result<Self, ReplayError> {
        let mut engine = Self::new(owners, threshold)?;
        for envelope in envelopes {
            engine.apply_event(envelope)?;
        }
        Ok(engine)
    }

    // ── Wallet operations ──────────────────────────────────────────

    /// Propose a transfer. Returns the assigned index.
    pub fn submit(
        &mut self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<TxIndex, WalletError> {
        let index = self.state.next_index();
        self.dispatch(WalletCommand::Submit {
            caller: caller.clone(),
            recipient: recipient.clone(),
            amount,
        })?;
        Ok(index)
    }

    pub fn confirm(&mut self, caller: &Address, index: TxIndex) -> Result<(), WalletError> {
        self.dispatch(WalletCommand::Confirm {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn revoke(&mut self, caller: &Address, index: TxIndex) -> Result<(), WalletError> {
        self.dispatch(WalletCommand::Revoke {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn execute(&mut self, caller: &Address, index: TxIndex) -> Result<(), WalletError> {
        self.dispatch(WalletCommand::Execute {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn deposit(&mut self, from: &Address, amount: Amount) -> Result<(), WalletError> {
        self.dispatch(WalletCommand::Deposit {
            from: from.clone(),
            amount,
        })
        .map(drop)
    }
}

/// Failure to rebuild an engine from a command log.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("cannot construct wallet: {0}")]
    Setup(#[from] SetupError),

    #[error("log refused during replay: {0}")]
    Engine(#[from] EngineError),
}
