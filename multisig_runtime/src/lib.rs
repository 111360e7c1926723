#![forbid(unsafe_code)]

//! Multisig Runtime v1
//!
//! Wraps the multisig kernel with a durable command log, snapshots,
//! replay, lock-guarded shared access and event notification.
//!
//! No domain logic lives here. Every precondition and transition is
//! delegated to the kernel.

pub mod audit;
pub mod config;
pub mod error;
pub mod event_store;
pub mod genesis;
pub mod notifier;
pub mod proto_bridge;
pub mod proto_types;
pub mod replay;
pub mod session;
pub mod snapshot;

pub use config::WalletConfig;
pub use error::RuntimeError;
pub use notifier::{Notifier, Observer, SequencedEvent, SubscriptionId};
pub use session::{SharedWallet, WalletSession};
