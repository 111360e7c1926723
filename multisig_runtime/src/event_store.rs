//! Append-only command log: binary protobuf frames.
//!
//! Storage format: length-prefixed protobuf frames.
//!   [4-byte LE length][protobuf bytes][4-byte LE length][protobuf bytes]...
//!
//! Rules:
//!   - Strict append only. No mutation, no deletion, no reordering.
//!   - fsync after every write
//!   - Sequence strictly increasing (validated on append and load)
//!   - Bytes past the last complete frame are an unacknowledged write and
//!     are cut off on open and before every append

use std::fs::{self, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use prost::Message;

use crate::proto_types::ProtoEnvelope;

/// Largest frame body accepted on append and on load.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Append-only command log backed by a single file.
#[derive(Debug)]
pub struct EventStore {
    path: PathBuf,
    last_sequence: u64,
    /// Byte length of the acknowledged frames.
    len: u64,
}

/// Result of scanning a log file.
struct LogScan {
    envelopes: Vec<ProtoEnvelope>,
    /// End of the last complete frame.
    valid_len: u64,
}

impl EventStore {
    /// Open or create a log at the given path.
    pub fn open(path: &Path) -> io::Result<Self> {
        Self::open_with_frames(path).map(|(store, _)| store)
    }

    /// Open or create a log and return every frame already in it.
    ///
    /// A torn tail (partial length prefix or partial body at end of file)
    /// is truncated away. Any other damage fails here rather than later.
    pub fn open_with_frames(path: &Path) -> io::Result<(Self, Vec<ProtoEnvelope>)> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (envelopes, len) = if path.exists() {
            let bytes = fs::read(path)?;
            let scan = scan_frames(&bytes)?;
            if scan.valid_len < bytes.len() as u64 {
                tracing::warn!(
                    path = %path.display(),
                    dropped = bytes.len() as u64 - scan.valid_len,
                    "truncating torn tail of command log"
                );
                let file = OpenOptions::new().write(true).open(path)?;
                file.set_len(scan.valid_len)?;
                file.sync_all()?;
            }
            (scan.envelopes, scan.valid_len)
        } else {
            (Vec::new(), 0)
        };

        let store = Self {
            path: path.to_path_buf(),
            last_sequence: envelopes.last().map_or(0, |e| e.sequence),
            len,
        };
        Ok((store, envelopes))
    }

    /// Append one envelope and fsync before returning.
    ///
    /// On any failure the file is cut back to the last acknowledged frame.
    pub fn append(&mut self, envelope: &ProtoEnvelope) -> io::Result<()> {
        let expected = self.last_sequence + 1;
        if envelope.sequence != expected {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "sequence violation in command log: expected {}, got {}",
                    expected, envelope.sequence
                ),
            ));
        }

        let body = envelope.encode_to_vec();
        if body.len() > MAX_FRAME_LEN {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "frame of {} bytes exceeds the {} byte limit",
                    body.len(),
                    MAX_FRAME_LEN
                ),
            ));
        }
        let mut frame = Vec::with_capacity(4 + body.len());
        frame.extend_from_slice(&(body.len() as u32).to_le_bytes());
        frame.extend_from_slice(&body);

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)?;
        if file.metadata()?.len() != self.len {
            file.set_len(self.len)?;
        }

        let written = file
            .seek(SeekFrom::Start(self.len))
            .and_then(|_| file.write_all(&frame))
            .and_then(|()| file.sync_all());
        if let Err(err) = written {
            if let Err(rollback) = file.set_len(self.len) {
                tracing::error!(
                    path = %self.path.display(),
                    error = %rollback,
                    "could not roll back failed append"
                );
            }
            return Err(err);
        }

        self.len += frame.len() as u64;
        self.last_sequence = envelope.sequence;
        Ok(())
    }

    /// Load every envelope in sequence order.
    pub fn load_all(&self) -> io::Result<Vec<ProtoEnvelope>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        let end = usize::try_from(self.len).unwrap_or(usize::MAX).min(bytes.len());
        Ok(scan_frames(&bytes[..end])?.envelopes)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parse frames, validating frame integrity and ordering. Stops at a torn
/// tail and reports where the complete frames end.
fn scan_frames(bytes: &[u8]) -> io::Result<LogScan> {
    let mut envelopes: Vec<ProtoEnvelope> = Vec::new();
    let mut pos = 0usize;

    while pos < bytes.len() {
        let rest = &bytes[pos..];
        let Some(len_bytes) = rest.get(..4) else {
            break;
        };
        let mut len_buf = [0u8; 4];
        len_buf.copy_from_slice(len_bytes);
        let len = u32::from_le_bytes(len_buf) as usize;
        if len == 0 || len > MAX_FRAME_LEN {
            return Err(invalid_data(format!(
                "invalid frame length {} after {} frames",
                len,
                envelopes.len()
            )));
        }

        let Some(body) = rest.get(4..4 + len) else {
            break;
        };
        let envelope = ProtoEnvelope::decode(body)
            .map_err(|e| invalid_data(format!("protobuf decode error: {}", e)))?;

        let expected = envelopes.last().map_or(1, |prev| prev.sequence + 1);
        if envelope.sequence != expected {
            return Err(invalid_data(format!(
                "log out of order: expected sequence {}, found {}",
                expected, envelope.sequence
            )));
        }

        envelopes.push(envelope);
        pos += 4 + len;
    }

    Ok(LogScan {
        envelopes,
        valid_len: pos as u64,
    })
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
