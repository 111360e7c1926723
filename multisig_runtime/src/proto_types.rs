//! Hand-written protobuf types for the command log.
//!
//! Uses prost derive macros for encode/decode without prost-build.
//! Field numbers are part of the on-disk format; never renumber.

use prost::Message;

// ── Envelope ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct ProtoEnvelope {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(uint32, tag = "2")]
    pub schema_version: u32,
    #[prost(message, optional, tag = "3")]
    pub command: Option<ProtoCommand>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProtoCommand {
    #[prost(oneof = "CommandKind", tags = "1, 2, 3, 4, 5")]
    pub kind: Option<CommandKind>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum CommandKind {
    #[prost(message, tag = "1")]
    Submit(Submit),
    #[prost(message, tag = "2")]
    Confirm(TxAction),
    #[prost(message, tag = "3")]
    Revoke(TxAction),
    #[prost(message, tag = "4")]
    Execute(TxAction),
    #[prost(message, tag = "5")]
    Deposit(Deposit),
}

// ── Commands ───────────────────────────────────────────────────

/// Amounts are big-endian, leading zeros stripped, at most 16 bytes.
#[derive(Clone, PartialEq, Message)]
pub struct Submit {
    #[prost(string, tag = "1")]
    pub caller: String,
    #[prost(string, tag = "2")]
    pub recipient: String,
    #[prost(bytes = "vec", tag = "3")]
    pub amount: Vec<u8>,
}

/// An owner acting on an existing transaction.
#[derive(Clone, PartialEq, Message)]
pub struct TxAction {
    #[prost(string, tag = "1")]
    pub caller: String,
    #[prost(uint64, tag = "2")]
    pub index: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct Deposit {
    #[prost(string, tag = "1")]
    pub from: String,
    #[prost(bytes = "vec", tag = "2")]
    pub amount: Vec<u8>,
}
