//! Replay orchestrator: rebuild wallet state from the command log.
//!
//! Delegates all domain logic to the kernel. No shortcuts, no cached
//! state logic.

use multisig_engine::domain::{Address, WalletState};
use multisig_engine::engine::MultisigEngine;
use multisig_engine::events::EventEnvelope;
use multisig_engine::hashing::canonical_hash;
use multisig_engine::ReplayError;

use crate::error::RuntimeError;
use crate::event_store::EventStore;
use crate::proto_bridge::proto_to_kernel;
use crate::proto_types::ProtoEnvelope;

/// Rebuild the wallet from a sequence of envelopes.
///
/// 1. Create a fresh engine for the given owner set
/// 2. Pass each envelope sequentially to the kernel
/// 3. Return (final_state, canonical_hash)
///
/// Pure function of its inputs.
pub fn rebuild_state(
    owners: &[Address],
    threshold: u32,
    envelopes: &[EventEnvelope],
) -> Result<(WalletState, String), ReplayError> {
    let engine = MultisigEngine::replay(owners.to_vec(), threshold, envelopes)?;
    let hash = canonical_hash(engine.state());
    Ok((engine.state().clone(), hash))
}

/// Rebuild and return only the canonical hash.
pub fn rebuild_hash(
    owners: &[Address],
    threshold: u32,
    envelopes: &[EventEnvelope],
) -> Result<String, ReplayError> {
    rebuild_state(owners, threshold, envelopes).map(|(_, hash)| hash)
}

/// Load and decode every envelope in the store.
pub fn load_envelopes(store: &EventStore) -> Result<Vec<EventEnvelope>, RuntimeError> {
    decode_envelopes(&store.load_all()?)
}

/// Decode frames already read from the log.
pub fn decode_envelopes(frames: &[ProtoEnvelope]) -> Result<Vec<EventEnvelope>, RuntimeError> {
    frames
        .iter()
        .map(|proto| proto_to_kernel(proto).map_err(RuntimeError::from))
        .collect()
}
