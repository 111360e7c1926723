//! Runtime error type. Wraps kernel refusals, I/O and codec failures.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use multisig_engine::{Address, EngineError, ReplayError, SetupError, WalletError};

use crate::proto_bridge::CodecError;
use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The kernel refused the operation. Expected under concurrent use.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error("invalid wallet setup: {0}")]
    Setup(#[from] SetupError),

    #[error("command could not be applied: {0}")]
    Engine(#[from] EngineError),

    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),

    #[error("command log I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("command log frame could not be decoded: {0}")]
    Codec(#[from] CodecError),

    #[error("snapshot failed: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("config is not valid JSON: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("genesis record is not valid JSON: {0}")]
    GenesisFormat(#[source] serde_json::Error),

    #[error(
        "wallet was created with owners {recorded_owners:?} and threshold {recorded_threshold}, \
         config has owners {configured_owners:?} and threshold {configured_threshold}"
    )]
    GenesisMismatch {
        recorded_owners: Vec<Address>,
        recorded_threshold: u32,
        configured_owners: Vec<Address>,
        configured_threshold: u32,
    },

    #[error("command log exists but genesis record {} is missing", .0.display())]
    MissingGenesis(PathBuf),

    #[error("replays diverged: {first} != {second}")]
    Nondeterministic { first: String, second: String },
}

impl RuntimeError {
    /// The kernel refusal behind this error, if that is what it is.
    pub fn as_wallet_error(&self) -> Option<&WalletError> {
        match self {
            RuntimeError::Wallet(err) | RuntimeError::Engine(EngineError::Wallet(err)) => Some(err),
            _ => None,
        }
    }
}
