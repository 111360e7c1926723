/// Multisig Kernel v1: Core Domain Types
///
/// Pure data. No transition logic lives here.
/// All value amounts: u128 in the smallest native unit. No float.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::arithmetic::validate_address;
use crate::error::SetupError;

/// Value in the smallest indivisible native unit.
pub type Amount = u128;

/// Position of a transaction in the wallet's log. Assigned from 0, never reused.
pub type TxIndex = u64;

// ── Identities ─────────────────────────────────────────────────────

/// Opaque address-like key identifying an owner, recipient or depositor.
///
/// Always matches `[A-Za-z0-9_-]+`, so both `0x…` hex addresses and
/// symbolic names are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Validate and wrap a raw address string.
    pub fn parse(raw: &str) -> Result<Self, SetupError> {
        validate_address(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = SetupError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        validate_address(&raw)?;
        Ok(Self(raw))
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

// ── Transactions ───────────────────────────────────────────────────

/// A proposed outgoing transfer and the approvals collected for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Transaction {
    pub(crate) index: TxIndex,
    pub(crate) recipient: Address,
    pub(crate) amount: Amount,
    /// Insertion-ordered, membership-unique.
    pub(crate) confirmations: Vec<Address>,
    pub(crate) executed: bool,
}

impl Transaction {
    pub fn index(&self) -> TxIndex {
        self.index
    }

    pub fn recipient(&self) -> &Address {
        &self.recipient
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn confirmations(&self) -> &[Address] {
        &self.confirmations
    }

    pub fn executed(&self) -> bool {
        self.executed
    }

    pub fn is_confirmed_by(&self, owner: &Address) -> bool {
        self.confirmations.contains(owner)
    }

    /// Lifecycle position, derived from the stored fields on every call.
    pub fn status(&self, threshold: u32) -> TxStatus {
        if self.executed {
            TxStatus::Executed
        } else if self.confirmations.is_empty() {
            TxStatus::Proposed
        } else if self.confirmations.len() < threshold as usize {
            TxStatus::Confirming
        } else {
            TxStatus::Executable
        }
    }
}

/// Derived lifecycle of a transaction. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    Proposed,
    Confirming,
    Executable,
    Executed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Proposed => "proposed",
            TxStatus::Confirming => "confirming",
            TxStatus::Executable => "executable",
            TxStatus::Executed => "executed",
        }
    }
}

// ── Wallet ─────────────────────────────────────────────────────────

/// Complete wallet state: owner set, quorum, balance and transaction log.
///
/// Fields are crate-private. Outside the kernel, state is read through the
/// query methods and changed only by applying commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WalletState {
    /// Ordered as given at construction.
    pub(crate) owners: Vec<Address>,
    pub(crate) threshold: u32,
    pub(crate) balance: Amount,
    /// Append-only; position == index.
    pub(crate) transactions: Vec<Transaction>,
}

impl WalletState {
    pub fn is_owner(&self, who: &Address) -> bool {
        self.owners.contains(who)
    }

    pub(crate) fn transaction_ref(&self, index: TxIndex) -> Option<&Transaction> {
        let i = usize::try_from(index).ok()?;
        self.transactions.get(i)
    }

    pub(crate) fn transaction_mut(&mut self, index: TxIndex) -> Option<&mut Transaction> {
        let i = usize::try_from(index).ok()?;
        self.transactions.get_mut(i)
    }

    pub(crate) fn next_index(&self) -> TxIndex {
        self.transactions.len() as TxIndex
    }
}
