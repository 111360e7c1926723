//! Wallet sessions: one wallet, its command log and its snapshots.
//!
//! Each durable wallet gets its own directory:
//!   <data_dir>/<wallet_id>/genesis.json
//!   <data_dir>/<wallet_id>/commands.log
//!   <data_dir>/<wallet_id>/snapshots/
//!
//! Check-before-persist order:
//!   1. engine.check(command)   refusals stop here, nothing is written
//!   2. log.append(envelope)    fsynced before the state changes
//!   3. engine.apply_event()    commit
//!   4. snapshot if interval reached
//!
//! `SharedWallet` serializes mutations behind one write lock and notifies
//! observers after the lock is released.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use multisig_engine::domain::{Address, Amount, TxIndex, TxStatus, WalletState};
use multisig_engine::engine::MultisigEngine;
use multisig_engine::events::{EventEnvelope, WalletCommand};
use multisig_engine::hashing::canonical_hash;
use multisig_engine::query::TransactionView;
use multisig_engine::WalletError;

use crate::config::WalletConfig;
use crate::error::RuntimeError;
use crate::event_store::EventStore;
use crate::genesis::{self, Genesis};
use crate::notifier::{Notifier, SequencedEvent};
use crate::proto_bridge::kernel_to_proto;
use crate::replay;
use crate::snapshot::{self, SnapshotError};

const LOG_FILE: &str = "commands.log";
const SNAPSHOT_DIR: &str = "snapshots";

/// Where accepted commands are recorded.
enum CommandLog {
    Durable(EventStore),
    /// Kept in memory so in-memory wallets can still be replayed and audited.
    Memory(Vec<EventEnvelope>),
}

impl CommandLog {
    fn append(&mut self, envelope: &EventEnvelope) -> Result<(), RuntimeError> {
        match self {
            CommandLog::Durable(store) => store.append(&kernel_to_proto(envelope))?,
            CommandLog::Memory(entries) => entries.push(envelope.clone()),
        }
        Ok(())
    }

    fn envelopes(&self) -> Result<Vec<EventEnvelope>, RuntimeError> {
        match self {
            CommandLog::Durable(store) => replay::load_envelopes(store),
            CommandLog::Memory(entries) => Ok(entries.clone()),
        }
    }
}

/// A single wallet with its own command log and state.
pub struct WalletSession {
    wallet_id: String,
    dir: Option<PathBuf>,
    owners: Vec<Address>,
    threshold: u32,
    engine: MultisigEngine,
    log: CommandLog,
    snapshot_interval: u64,
}

impl WalletSession {
    /// Open (or create) the durable wallet described by `config`.
    ///
    /// The config must agree with the wallet's genesis record. Restores from
    /// the newest snapshot that verifies and replays the log tail after it.
    /// A damaged snapshot falls back to full replay; a snapshot recording a
    /// different owner set is refused.
    pub fn open(config: &WalletConfig) -> Result<Self, RuntimeError> {
        config.validate()?;
        let dir = config.wallet_dir();
        let (store, frames) = EventStore::open_with_frames(&dir.join(LOG_FILE))?;
        let Genesis { owners, threshold } = genesis::establish(&dir, config, store.last_sequence())?;
        let envelopes = replay::decode_envelopes(&frames)?;

        let engine = match restore_from_snapshot(&dir.join(SNAPSHOT_DIR), config, &envelopes) {
            Ok(Some(engine)) => engine,
            Ok(None) => MultisigEngine::replay(owners.clone(), threshold, &envelopes)?,
            Err(err @ RuntimeError::Snapshot(SnapshotError::OwnerSetMismatch)) => return Err(err),
            Err(err) => {
                tracing::warn!(
                    wallet = %config.wallet_id,
                    error = %err,
                    "snapshot rejected, falling back to full replay"
                );
                MultisigEngine::replay(owners.clone(), threshold, &envelopes)?
            }
        };

        tracing::info!(
            wallet = %config.wallet_id,
            sequence = engine.last_sequence(),
            hash = %canonical_hash(engine.state()),
            "wallet opened"
        );

        Ok(Self {
            wallet_id: config.wallet_id.clone(),
            dir: Some(dir),
            owners,
            threshold,
            engine,
            log: CommandLog::Durable(store),
            snapshot_interval: config.snapshot_interval,
        })
    }

    /// A wallet that lives only as long as this value.
    pub fn in_memory(owners: Vec<Address>, threshold: u32) -> Result<Self, RuntimeError> {
        let engine = MultisigEngine::new(owners.clone(), threshold)?;
        Ok(Self {
            wallet_id: "memory".to_string(),
            dir: None,
            owners,
            threshold,
            engine,
            log: CommandLog::Memory(Vec::new()),
            snapshot_interval: 0,
        })
    }

    /// Check, persist and commit one command.
    ///
    /// A refused command is neither logged nor applied.
    pub fn apply(&mut self, command: WalletCommand) -> Result<SequencedEvent, RuntimeError> {
        if let Err(err) = self.engine.check(&command) {
            tracing::debug!(
                wallet = %self.wallet_id,
                command = command.name(),
                caller = %command.actor(),
                code = err.code(),
                "command refused"
            );
            return Err(err.into());
        }

        let envelope = self.engine.envelope(command);
        if let Err(err) = self.log.append(&envelope) {
            tracing::error!(
                wallet = %self.wallet_id,
                sequence = envelope.sequence,
                error = %err,
                "command log append failed"
            );
            return Err(err);
        }

        let event = self.engine.apply_event(&envelope)?;
        tracing::info!(
            wallet = %self.wallet_id,
            sequence = envelope.sequence,
            kind = event.kind.as_str(),
            actor = %event.actor,
            index = ?event.index,
            "command committed"
        );

        self.maybe_snapshot(envelope.sequence);

        Ok(SequencedEvent {
            sequence: envelope.sequence,
            event,
        })
    }

    /// A failed snapshot never fails the committed command.
    fn maybe_snapshot(&self, sequence: u64) {
        let Some(dir) = &self.dir else { return };
        if self.snapshot_interval == 0 || sequence % self.snapshot_interval != 0 {
            return;
        }
        match snapshot::save_snapshot(&dir.join(SNAPSHOT_DIR), sequence, self.engine.state()) {
            Ok(path) => tracing::debug!(wallet = %self.wallet_id, path = %path.display(), "snapshot saved"),
            Err(err) => tracing::warn!(wallet = %self.wallet_id, sequence, error = %err, "snapshot failed"),
        }
    }

    /// Full replay from the command log. Resets the engine to the result.
    pub fn replay_full(&mut self) -> Result<(WalletState, String), RuntimeError> {
        let envelopes = self.log.envelopes()?;
        let (state, hash) = replay::rebuild_state(&self.owners, self.threshold, &envelopes)?;
        let last = envelopes.last().map_or(0, |e| e.sequence);
        self.engine = MultisigEngine::from_state(state.clone(), last);
        Ok((state, hash))
    }

    /// Every accepted command so far, in order.
    pub fn envelopes(&self) -> Result<Vec<EventEnvelope>, RuntimeError> {
        self.log.envelopes()
    }

    pub fn state(&self) -> &WalletState {
        self.engine.state()
    }

    pub fn current_hash(&self) -> String {
        canonical_hash(self.engine.state())
    }

    pub fn current_sequence(&self) -> u64 {
        self.engine.last_sequence()
    }

    pub fn wallet_id(&self) -> &str {
        &self.wallet_id
    }

    /// Owner set and threshold the wallet was created with.
    pub fn genesis(&self) -> (&[Address], u32) {
        (&self.owners, self.threshold)
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

fn restore_from_snapshot(
    snapshot_dir: &Path,
    config: &WalletConfig,
    envelopes: &[EventEnvelope],
) -> Result<Option<MultisigEngine>, RuntimeError> {
    let Some(snap) = snapshot::load_latest_snapshot(snapshot_dir)? else {
        return Ok(None);
    };
    snapshot::verify_snapshot(&snap)?;

    if snap.state.list_owners() != config.owners.as_slice()
        || snap.state.required_confirmations() != config.threshold
    {
        return Err(SnapshotError::OwnerSetMismatch.into());
    }
    let log_end = envelopes.last().map_or(0, |e| e.sequence);
    if snap.sequence > log_end {
        return Err(SnapshotError::AheadOfLog {
            snapshot: snap.sequence,
            log: log_end,
        }
        .into());
    }

    let base = snap.sequence;
    let mut engine = MultisigEngine::from_state(snap.state, base);
    for envelope in envelopes.iter().filter(|e| e.sequence > base) {
        engine.apply_event(envelope)?;
    }
    tracing::debug!(
        wallet = %config.wallet_id,
        snapshot = base,
        tail = log_end - base,
        "restored from snapshot"
    );
    Ok(Some(engine))
}

/// Thread-safe wallet handle.
///
/// Mutations are serialized by the write lock; queries share the read lock
/// and never observe a half-applied command. Observers run after the lock
/// is released, so they may query or mutate the wallet themselves.
pub struct SharedWallet {
    inner: RwLock<WalletSession>,
    notifier: Notifier,
}

impl SharedWallet {
    pub fn new(session: WalletSession) -> Self {
        Self {
            inner: RwLock::new(session),
            notifier: Notifier::new(),
        }
    }

    pub fn open(config: &WalletConfig) -> Result<Self, RuntimeError> {
        Ok(Self::new(WalletSession::open(config)?))
    }

    pub fn in_memory(owners: Vec<Address>, threshold: u32) -> Result<Self, RuntimeError> {
        Ok(Self::new(WalletSession::in_memory(owners, threshold)?))
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Apply under the write lock, then notify.
    pub fn apply(&self, command: WalletCommand) -> Result<SequencedEvent, RuntimeError> {
        let fact = self.write().apply(command)?;
        self.notifier.notify(&fact);
        Ok(fact)
    }

    // ── Mutations ──────────────────────────────────────────────────

    /// Propose a transfer. Returns the assigned index.
    pub fn submit(
        &self,
        caller: &Address,
        recipient: &Address,
        amount: Amount,
    ) -> Result<TxIndex, RuntimeError> {
        let fact = self.apply(WalletCommand::Submit {
            caller: caller.clone(),
            recipient: recipient.clone(),
            amount,
        })?;
        Ok(fact.event.index.unwrap_or_default())
    }

    pub fn confirm(&self, caller: &Address, index: TxIndex) -> Result<(), RuntimeError> {
        self.apply(WalletCommand::Confirm {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn revoke(&self, caller: &Address, index: TxIndex) -> Result<(), RuntimeError> {
        self.apply(WalletCommand::Revoke {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn execute(&self, caller: &Address, index: TxIndex) -> Result<(), RuntimeError> {
        self.apply(WalletCommand::Execute {
            caller: caller.clone(),
            index,
        })
        .map(drop)
    }

    pub fn deposit(&self, from: &Address, amount: Amount) -> Result<(), RuntimeError> {
        self.apply(WalletCommand::Deposit {
            from: from.clone(),
            amount,
        })
        .map(drop)
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn list_owners(&self) -> Vec<Address> {
        self.read().state().list_owners().to_vec()
    }

    pub fn balance(&self) -> Amount {
        self.read().state().balance()
    }

    pub fn required_confirmations(&self) -> u32 {
        self.read().state().required_confirmations()
    }

    pub fn transaction_count(&self) -> u64 {
        self.read().state().transaction_count()
    }

    pub fn transaction(&self, index: TxIndex) -> Result<TransactionView, WalletError> {
        self.read().state().transaction(index)
    }

    pub fn is_confirmed_by(&self, index: TxIndex, owner: &Address) -> Result<bool, WalletError> {
        self.read().state().is_confirmed_by(index, owner)
    }

    pub fn confirmers_of(&self, index: TxIndex) -> Result<Vec<Address>, WalletError> {
        self.read().state().confirmers_of(index).map(<[Address]>::to_vec)
    }

    pub fn status(&self, index: TxIndex) -> Result<TxStatus, WalletError> {
        self.read().state().status(index)
    }

    pub fn can_execute(&self, index: TxIndex) -> Result<bool, WalletError> {
        self.read().state().can_execute(index)
    }

    pub fn transactions(&self) -> Vec<TransactionView> {
        self.read().state().transactions()
    }

    pub fn pending(&self) -> Vec<TransactionView> {
        self.read().state().pending()
    }

    pub fn current_hash(&self) -> String {
        self.read().current_hash()
    }

    pub fn current_sequence(&self) -> u64 {
        self.read().current_sequence()
    }

    /// A consistent copy of the whole wallet state.
    pub fn snapshot_state(&self) -> WalletState {
        self.read().state().clone()
    }

    pub fn envelopes(&self) -> Result<Vec<EventEnvelope>, RuntimeError> {
        self.read().envelopes()
    }

    pub fn replay_full(&self) -> Result<(WalletState, String), RuntimeError> {
        self.write().replay_full()
    }

    fn read(&self) -> RwLockReadGuard<'_, WalletSession> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, WalletSession> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_engine::state::parse_owners;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn wallet() -> SharedWallet {
        SharedWallet::in_memory(parse_owners(&["alice", "bob", "carol"]).unwrap(), 2).unwrap()
    }

    #[test]
    fn refused_command_is_not_recorded() {
        let w = wallet();
        let err = w.submit(&addr("dave"), &addr("dave"), 1).unwrap_err();
        assert_eq!(err.as_wallet_error(), Some(&WalletError::NotOwner(addr("dave"))));
        assert_eq!(w.current_sequence(), 0);
        assert!(w.envelopes().unwrap().is_empty());
    }

    #[test]
    fn accepted_commands_are_sequenced_from_one() {
        let w = wallet();
        w.deposit(&addr("dave"), 10).unwrap();
        assert_eq!(w.submit(&addr("alice"), &addr("dave"), 4).unwrap(), 0);
        assert_eq!(w.submit(&addr("bob"), &addr("dave"), 4).unwrap(), 1);

        let seqs: Vec<u64> = w.envelopes().unwrap().iter().map(|e| e.sequence).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert_eq!(w.current_sequence(), 3);
    }

    #[test]
    fn replay_full_matches_live_state() {
        let w = wallet();
        w.deposit(&addr("dave"), 10).unwrap();
        let i = w.submit(&addr("alice"), &addr("dave"), 4).unwrap();
        w.confirm(&addr("alice"), i).unwrap();
        w.confirm(&addr("bob"), i).unwrap();
        w.execute(&addr("carol"), i).unwrap();

        let live = w.current_hash();
        let (state, hash) = w.replay_full().unwrap();
        assert_eq!(hash, live);
        assert_eq!(state.balance(), 6);
        assert_eq!(w.current_sequence(), 5);
    }

    #[test]
    fn queries_return_owned_values() {
        let w = wallet();
        let i = w.submit(&addr("alice"), &addr("erin"), 3).unwrap();
        w.confirm(&addr("bob"), i).unwrap();
        assert_eq!(w.list_owners(), parse_owners(&["alice", "bob", "carol"]).unwrap());
        assert_eq!(w.confirmers_of(i).unwrap(), vec![addr("bob")]);
        assert_eq!(w.status(i).unwrap(), TxStatus::Confirming);
        assert!(!w.can_execute(i).unwrap());
        assert_eq!(w.pending().len(), 1);
        assert_eq!(w.transaction(9).unwrap_err(), WalletError::UnknownTransaction(9));
    }
}
