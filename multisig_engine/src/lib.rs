#![forbid(unsafe_code)]

/// Kernel v1. Behavioral changes require kernel_v2.
pub const KERNEL_VERSION: u32 = 1;

pub mod arithmetic;
pub mod domain;
pub mod error;
pub mod events;
pub mod state;
pub mod transitions;
pub mod invariants;
pub mod query;
pub mod hashing;
pub mod engine;

pub use domain::{Address, Amount, Transaction, TxIndex, TxStatus, WalletState};
pub use engine::{MultisigEngine, ReplayError};
pub use error::{EngineError, InvariantViolation, SetupError, WalletError};
pub use events::{EventEnvelope, EventKind, WalletCommand, WalletEvent};
pub use query::TransactionView;
