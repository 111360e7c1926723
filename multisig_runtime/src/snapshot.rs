//! Snapshot layer: deterministic wallet snapshots.
//!
//! A snapshot holds the full state, its canonical hash and the sequence it
//! was taken at. No timestamps in snapshot content.
//!
//! A snapshot is only trusted after `verify_snapshot`: kernel version,
//! hash and every invariant must check out. Otherwise the caller falls back
//! to full replay.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use multisig_engine::domain::WalletState;
use multisig_engine::hashing::canonical_hash;
use multisig_engine::invariants::try_validate_invariants;
use multisig_engine::{InvariantViolation, KERNEL_VERSION};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("snapshot is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("snapshot written by kernel v{found}, this is v{expected}")]
    KernelVersion { expected: u32, found: u32 },

    #[error("snapshot hash mismatch: recorded {recorded}, computed {computed}")]
    HashMismatch { recorded: String, computed: String },

    #[error("snapshot owner set or threshold differs from the wallet config")]
    OwnerSetMismatch,

    #[error("snapshot at sequence {snapshot} is ahead of the command log ({log})")]
    AheadOfLog { snapshot: u64, log: u64 },

    #[error("snapshot state violates an invariant: {0}")]
    Invariant(#[from] InvariantViolation),
}

/// Snapshot on-disk format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Sequence number at which this snapshot was taken.
    pub sequence: u64,
    /// Canonical hash of `state`.
    pub hash: String,
    /// Kernel version at snapshot time.
    pub kernel_version: u32,
    pub state: WalletState,
}

fn snapshot_path(dir: &Path, sequence: u64) -> PathBuf {
    dir.join(format!("snapshot_{:08}.json", sequence))
}

/// Save a snapshot of `state` taken at `sequence`.
///
/// Written to a temporary file and renamed, so a crash never leaves a
/// half-written snapshot under the final name.
pub fn save_snapshot(
    dir: &Path,
    sequence: u64,
    state: &WalletState,
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(dir)?;

    let snap = Snapshot {
        sequence,
        hash: canonical_hash(state),
        kernel_version: KERNEL_VERSION,
        state: state.clone(),
    };
    let content = serde_json::to_vec(&snap)?;

    let path = snapshot_path(dir, sequence);
    let tmp = path.with_extension("json.tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(&content)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, &path)?;

    Ok(path)
}

/// Load the snapshot taken at `sequence`, if there is one.
pub fn load_snapshot(dir: &Path, sequence: u64) -> Result<Option<Snapshot>, SnapshotError> {
    let path = snapshot_path(dir, sequence);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read(&path)?;
    Ok(Some(serde_json::from_slice(&content)?))
}

/// Sequence numbers of every snapshot in `dir`, ascending.
pub fn list_snapshots(dir: &Path) -> Result<Vec<u64>, SnapshotError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut sequences = Vec::new();
    for entry in fs::read_dir(dir)? {
        let name = entry?.file_name();
        let seq = name
            .to_str()
            .and_then(|n| n.strip_prefix("snapshot_"))
            .and_then(|n| n.strip_suffix(".json"))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(seq) = seq {
            sequences.push(seq);
        }
    }
    sequences.sort_unstable();
    Ok(sequences)
}

/// Load the snapshot with the highest sequence number.
pub fn load_latest_snapshot(dir: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match list_snapshots(dir)?.last() {
        Some(seq) => load_snapshot(dir, *seq),
        None => Ok(None),
    }
}

/// Check kernel version, recorded hash and invariants.
pub fn verify_snapshot(snap: &Snapshot) -> Result<(), SnapshotError> {
    if snap.kernel_version != KERNEL_VERSION {
        return Err(SnapshotError::KernelVersion {
            expected: KERNEL_VERSION,
            found: snap.kernel_version,
        });
    }

    let computed = canonical_hash(&snap.state);
    if computed != snap.hash {
        return Err(SnapshotError::HashMismatch {
            recorded: snap.hash.clone(),
            computed,
        });
    }

    try_validate_invariants(&snap.state)?;
    Ok(())
}
