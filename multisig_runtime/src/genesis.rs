//! Genesis record: the owner set and threshold a wallet was created with.
//!
//! Written once, before the first command is logged, and checked on every
//! open. Membership and threshold are fixed for the life of the wallet, so
//! a config that disagrees with the record is refused.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use multisig_engine::domain::Address;

use crate::config::WalletConfig;
use crate::error::RuntimeError;

pub const GENESIS_FILE: &str = "genesis.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Genesis {
    pub owners: Vec<Address>,
    pub threshold: u32,
}

impl Genesis {
    pub fn from_config(config: &WalletConfig) -> Self {
        Self {
            owners: config.owners.clone(),
            threshold: config.threshold,
        }
    }
}

pub fn genesis_path(dir: &Path) -> PathBuf {
    dir.join(GENESIS_FILE)
}

/// Read the genesis record in `dir`, if there is one.
pub fn read_genesis(dir: &Path) -> Result<Option<Genesis>, RuntimeError> {
    let path = genesis_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read(&path)?;
    serde_json::from_slice(&content)
        .map(Some)
        .map_err(RuntimeError::GenesisFormat)
}

/// Write the genesis record via a temporary file and rename.
pub fn write_genesis(dir: &Path, genesis: &Genesis) -> Result<(), RuntimeError> {
    fs::create_dir_all(dir)?;
    let content = serde_json::to_vec_pretty(genesis).map_err(RuntimeError::GenesisFormat)?;

    let path = genesis_path(dir);
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&content)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, &path)?;
    Ok(())
}

/// Check `config` against the recorded genesis, creating the record for a
/// wallet whose log is still empty.
pub fn establish(
    dir: &Path,
    config: &WalletConfig,
    logged_commands: u64,
) -> Result<Genesis, RuntimeError> {
    let configured = Genesis::from_config(config);
    match read_genesis(dir)? {
        Some(recorded) if recorded == configured => Ok(recorded),
        Some(recorded) => Err(RuntimeError::GenesisMismatch {
            recorded_owners: recorded.owners,
            recorded_threshold: recorded.threshold,
            configured_owners: configured.owners,
            configured_threshold: configured.threshold,
        }),
        None if logged_commands > 0 => Err(RuntimeError::MissingGenesis(genesis_path(dir))),
        None => {
            write_genesis(dir, &configured)?;
            tracing::info!(
                wallet = %config.wallet_id,
                owners = configured.owners.len(),
                threshold = configured.threshold,
                "genesis recorded"
            );
            Ok(configured)
        }
    }
}
