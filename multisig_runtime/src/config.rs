//! Wallet configuration, loaded from JSON.
//!
//! ```json
//! {
//!   "owners": ["0xf39F…", "0x7099…", "0x3C44…"],
//!   "threshold": 2,
//!   "data_dir": "./data",
//!   "wallet_id": "treasury",
//!   "snapshot_interval": 100
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use multisig_engine::arithmetic::validate_address;
use multisig_engine::domain::Address;
use multisig_engine::state::validate_owner_set;

use crate::error::RuntimeError;

pub const DEFAULT_SNAPSHOT_INTERVAL: u64 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletConfig {
    /// Fixed for the lifetime of the wallet. Order is reported by `list_owners`.
    pub owners: Vec<Address>,
    pub threshold: u32,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Subdirectory of `data_dir` holding this wallet's log and snapshots.
    #[serde(default = "default_wallet_id")]
    pub wallet_id: String,
    /// Snapshot every N commands. 0 disables snapshots.
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_wallet_id() -> String {
    "wallet".to_string()
}

fn default_snapshot_interval() -> u64 {
    DEFAULT_SNAPSHOT_INTERVAL
}

impl WalletConfig {
    pub fn new(owners: Vec<Address>, threshold: u32, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            owners,
            threshold,
            data_dir: data_dir.into(),
            wallet_id: default_wallet_id(),
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
        }
    }

    pub fn with_wallet_id(mut self, wallet_id: impl Into<String>) -> Self {
        self.wallet_id = wallet_id.into();
        self
    }

    pub fn with_snapshot_interval(mut self, interval: u64) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Parse and validate a JSON config string.
    pub fn from_json_str(raw: &str) -> Result<Self, RuntimeError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Owner set rules from the kernel; `wallet_id` must be path-safe.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        validate_owner_set(&self.owners, self.threshold)?;
        validate_address(&self.wallet_id)?;
        Ok(())
    }

    pub fn wallet_dir(&self) -> PathBuf {
        self.data_dir.join(&self.wallet_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_engine::SetupError;

    #[test]
    fn defaults_fill_optional_fields() {
        let config =
            WalletConfig::from_json_str(r#"{"owners": ["alice", "bob", "carol"], "threshold": 2}"#)
                .unwrap();
        assert_eq!(config.owners.len(), 3);
        assert_eq!(config.snapshot_interval, DEFAULT_SNAPSHOT_INTERVAL);
        assert_eq!(config.wallet_dir(), PathBuf::from("data").join("wallet"));
    }

    #[test]
    fn bad_threshold_is_rejected() {
        let err = WalletConfig::from_json_str(r#"{"owners": ["alice"], "threshold": 2}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Setup(SetupError::InvalidThreshold { threshold: 2, owners: 1 })
        ));
    }

    #[test]
    fn malformed_owner_is_a_format_error() {
        let err = WalletConfig::from_json_str(r#"{"owners": ["al ice"], "threshold": 1}"#)
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ConfigFormat(_)));
    }

    #[test]
    fn wallet_id_must_be_path_safe() {
        let err = WalletConfig::from_json_str(
            r#"{"owners": ["alice"], "threshold": 1, "wallet_id": "../escape"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::Setup(SetupError::InvalidAddress(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(WalletConfig::from_json_str(
            r#"{"owners": ["alice"], "threshold": 1, "thresold": 1}"#
        )
        .is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        fs::write(
            &path,
            r#"{"owners": ["a", "b"], "threshold": 1, "wallet_id": "ops", "snapshot_interval": 0}"#,
        )
        .unwrap();
        let config = WalletConfig::from_file(&path).unwrap();
        assert_eq!(config.wallet_id, "ops");
        assert_eq!(config.snapshot_interval, 0);
    }
}
