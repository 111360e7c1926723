//! Event notifier: explicit observer registry plus polling channels.
//!
//! Delivery happens after the mutation is committed and the wallet lock
//! is released, so an observer that re-queries sees the new state.
//! Observers are called outside the registry lock and may subscribe or
//! unsubscribe from inside `on_event`. A panicking observer is logged and
//! skipped; the command it was told about stays committed.
//!
//! Each fact carries its sequence number. Facts from concurrent callers
//! may be delivered out of sequence order.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use multisig_engine::events::WalletEvent;

/// A committed fact and its position in the command log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: u64,
    pub event: WalletEvent,
}

/// Receives every committed fact.
///
/// A panic in `on_event` is caught and logged. It does not reach the
/// caller that committed the command, and later observers still run.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &SequencedEvent);
}

impl<F> Observer for F
where
    F: Fn(&SequencedEvent) + Send + Sync,
{
    fn on_event(&self, event: &SequencedEvent) {
        self(event)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    observers: Mutex<Vec<(SubscriptionId, Arc<dyn Observer>)>>,
    channels: Mutex<Vec<Sender<SequencedEvent>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<O: Observer + 'static>(&self, observer: O) -> SubscriptionId {
        self.subscribe_arc(Arc::new(observer))
    }

    pub fn subscribe_arc(&self, observer: Arc<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.observers).push((id, observer));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    /// A receiver that gets every fact committed from now on. Dropping the
    /// receiver unsubscribes it on the next delivery.
    pub fn channel(&self) -> Receiver<SequencedEvent> {
        let (tx, rx) = mpsc::channel();
        lock(&self.channels).push(tx);
        rx
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }

    /// Deliver `event` to every observer and channel.
    pub fn notify(&self, event: &SequencedEvent) {
        let observers: Vec<Arc<dyn Observer>> = lock(&self.observers)
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(event)));
            if delivered.is_err() {
                tracing::error!(sequence = event.sequence, "observer panicked");
            }
        }

        let mut channels = lock(&self.channels);
        let before = channels.len();
        channels.retain(|tx| tx.send(event.clone()).is_ok());
        if channels.len() != before {
            tracing::warn!(
                dropped = before - channels.len(),
                "pruned disconnected event channels"
            );
        }
    }
}

/// Registry contents stay consistent even if an observer panicked mid-call.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use multisig_engine::events::EventKind;
    use multisig_engine::Address;
    use std::sync::atomic::AtomicUsize;

    fn fact(sequence: u64) -> SequencedEvent {
        SequencedEvent {
            sequence,
            event: WalletEvent {
                kind: EventKind::Deposited,
                index: None,
                actor: Address::parse("dave").unwrap(),
                amount: Some(1),
            },
        }
    }

    #[test]
    fn closures_are_observers() {
        let notifier = Notifier::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        notifier.subscribe(move |_: &SequencedEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify(&fact(1));
        notifier.notify(&fact(2));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let notifier = Notifier::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let id = notifier.subscribe(move |_: &SequencedEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        notifier.notify(&fact(1));
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
        notifier.notify(&fact(2));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.observer_count(), 0);
    }

    #[test]
    fn channels_receive_and_are_pruned_when_dropped() {
        let notifier = Notifier::new();
        let rx = notifier.channel();
        let dropped = notifier.channel();
        drop(dropped);

        notifier.notify(&fact(1));
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
        assert_eq!(lock(&notifier.channels).len(), 1);
    }

    #[test]
    fn panicking_observer_does_not_stop_delivery() {
        let notifier = Notifier::new();
        notifier.subscribe(|_: &SequencedEvent| panic!("observer bug"));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        notifier.subscribe(move |_: &SequencedEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let rx = notifier.channel();

        notifier.notify(&fact(1));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_recv().unwrap().sequence, 1);
    }

    #[test]
    fn observer_may_unsubscribe_itself() {
        let notifier = Arc::new(Notifier::new());
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let (n, s) = (Arc::clone(&notifier), Arc::clone(&slot));
        let id = notifier.subscribe(move |_: &SequencedEvent| {
            if let Some(id) = *s.lock().unwrap() {
                n.unsubscribe(id);
            }
        });
        *slot.lock().unwrap() = Some(id);
        notifier.notify(&fact(1));
        assert_eq!(notifier.observer_count(), 0);
    }
}
