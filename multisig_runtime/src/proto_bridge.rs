//! Proto ↔ Kernel conversion bridge.
//!
//! Converts between the protobuf wire types (proto_types.rs) and the
//! kernel's `EventEnvelope`. Decoding re-validates every address, so a
//! tampered log cannot smuggle a malformed identity into the kernel.

use thiserror::Error;

use multisig_engine::domain::{Address, Amount};
use multisig_engine::events::{EventEnvelope, WalletCommand};
use multisig_engine::SetupError;

use crate::proto_types::*;

/// A log frame that decoded as protobuf but is not a valid command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("envelope {0} carries no command")]
    MissingCommand(u64),

    #[error("envelope {sequence}: {source}")]
    InvalidAddress {
        sequence: u64,
        #[source]
        source: SetupError,
    },

    #[error("envelope {sequence}: amount is {len} bytes, at most 16 allowed")]
    AmountTooWide { sequence: u64, len: usize },
}

/// Convert a kernel envelope to its protobuf form.
pub fn kernel_to_proto(envelope: &EventEnvelope) -> ProtoEnvelope {
    let kind = match &envelope.command {
        WalletCommand::Submit {
            caller,
            recipient,
            amount,
        } => CommandKind::Submit(Submit {
            caller: caller.to_string(),
            recipient: recipient.to_string(),
            amount: encode_amount(*amount),
        }),
        WalletCommand::Confirm { caller, index } => CommandKind::Confirm(action(caller, *index)),
        WalletCommand::Revoke { caller, index } => CommandKind::Revoke(action(caller, *index)),
        WalletCommand::Execute { caller, index } => CommandKind::Execute(action(caller, *index)),
        WalletCommand::Deposit { from, amount } => CommandKind::Deposit(Deposit {
            from: from.to_string(),
            amount: encode_amount(*amount),
        }),
    };

    ProtoEnvelope {
        sequence: envelope.sequence,
        schema_version: envelope.schema_version,
        command: Some(ProtoCommand { kind: Some(kind) }),
    }
}

/// Convert a protobuf envelope back to the kernel's form.
pub fn proto_to_kernel(proto: &ProtoEnvelope) -> Result<EventEnvelope, CodecError> {
    let sequence = proto.sequence;
    let kind = proto
        .command
        .as_ref()
        .and_then(|c| c.kind.as_ref())
        .ok_or(CodecError::MissingCommand(sequence))?;

    let address = |raw: &str| -> Result<Address, CodecError> {
        Address::parse(raw).map_err(|source| CodecError::InvalidAddress { sequence, source })
    };

    let command = match kind {
        CommandKind::Submit(s) => WalletCommand::Submit {
            caller: address(&s.caller)?,
            recipient: address(&s.recipient)?,
            amount: decode_amount(sequence, &s.amount)?,
        },
        CommandKind::Confirm(a) => WalletCommand::Confirm {
            caller: address(&a.caller)?,
            index: a.index,
        },
        CommandKind::Revoke(a) => WalletCommand::Revoke {
            caller: address(&a.caller)?,
            index: a.index,
        },
        CommandKind::Execute(a) => WalletCommand::Execute {
            caller: address(&a.caller)?,
            index: a.index,
        },
        CommandKind::Deposit(d) => WalletCommand::Deposit {
            from: address(&d.from)?,
            amount: decode_amount(sequence, &d.amount)?,
        },
    };

    Ok(EventEnvelope {
        sequence,
        schema_version: proto.schema_version,
        command,
    })
}

fn action(caller: &Address, index: u64) -> TxAction {
    TxAction {
        caller: caller.to_string(),
        index,
    }
}

/// Minimal big-endian encoding. Zero encodes as an empty byte string.
fn encode_amount(amount: Amount) -> Vec<u8> {
    let bytes = amount.to_be_bytes();
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[first..].to_vec()
}

fn decode_amount(sequence: u64, raw: &[u8]) -> Result<Amount, CodecError> {
    if raw.len() > 16 {
        return Err(CodecError::AmountTooWide {
            sequence,
            len: raw.len(),
        });
    }
    let mut bytes = [0u8; 16];
    bytes[16 - raw.len()..].copy_from_slice(raw);
    Ok(Amount::from_be_bytes(bytes))
}
