/// Multisig Kernel v1: Error Taxonomy
///
/// Every refusal is a precondition failure detected before any mutation.
/// None of them require rollback.

use thiserror::Error;

use crate::domain::{Address, Amount, TxIndex};

/// Refusal of a wallet operation. The wallet is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("{0} is not an owner of this wallet")]
    NotOwner(Address),

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error("transaction {0} does not exist")]
    UnknownTransaction(TxIndex),

    #[error("transaction {0} has already been executed")]
    AlreadyExecuted(TxIndex),

    #[error("transaction {index} is already confirmed by {owner}")]
    AlreadyConfirmed { index: TxIndex, owner: Address },

    #[error("transaction {index} is not confirmed by {owner}")]
    NotConfirmed { index: TxIndex, owner: Address },

    #[error("transaction {index} has {confirmations} of {threshold} required confirmations")]
    QuorumNotMet {
        index: TxIndex,
        confirmations: usize,
        threshold: u32,
    },

    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Amount, required: Amount },

    #[error("deposit of {amount} would overflow balance {balance}")]
    BalanceOverflow { balance: Amount, amount: Amount },
}

impl WalletError {
    /// Stable snake_case name, for logs and harness output.
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::NotOwner(_) => "not_owner",
            WalletError::InvalidAmount => "invalid_amount",
            WalletError::UnknownTransaction(_) => "unknown_transaction",
            WalletError::AlreadyExecuted(_) => "already_executed",
            WalletError::AlreadyConfirmed { .. } => "already_confirmed",
            WalletError::NotConfirmed { .. } => "not_confirmed",
            WalletError::QuorumNotMet { .. } => "quorum_not_met",
            WalletError::InsufficientFunds { .. } => "insufficient_funds",
            WalletError::BalanceOverflow { .. } => "balance_overflow",
        }
    }
}

/// Failure to construct a wallet or parse one of its identities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a wallet needs at least one owner")]
    NoOwners,

    #[error("owner {0} is listed more than once")]
    DuplicateOwner(Address),

    #[error("threshold {threshold} is outside 1..={owners}")]
    InvalidThreshold { threshold: u32, owners: usize },

    #[error("invalid address {0:?}: must match [A-Za-z0-9_-]{{1,128}}")]
    InvalidAddress(String),
}

/// Failure while applying a sequenced envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("sequence violation: expected {expected}, got {got}")]
    SequenceViolation { expected: u64, got: u64 },

    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },
}

/// A state that breaks one of the wallet invariants. Only reachable by
/// loading externally produced state (snapshots); the transition layer
/// never produces one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("[owner_set] {0}")]
    OwnerSet(SetupError),

    #[error("[index_sequence] transaction at position {position} carries index {index}")]
    IndexSequence { position: usize, index: TxIndex },

    #[error("[positive_amount] transaction {0} has a zero amount")]
    ZeroAmount(TxIndex),

    #[error("[owner_confirmations] transaction {index} is confirmed by non-owner {who}")]
    NonOwnerConfirmation { index: TxIndex, who: Address },

    #[error("[unique_confirmations] transaction {index} lists {who} more than once")]
    DuplicateConfirmation { index: TxIndex, who: Address },

    #[error("[quorum_before_execution] transaction {index} executed with {confirmations} of {threshold}")]
    ExecutedWithoutQuorum {
        index: TxIndex,
        confirmations: usize,
        threshold: u32,
    },
}
