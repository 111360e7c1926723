/// Multisig Kernel v1: Query Surface
///
/// Side-effect-free projections over a committed WalletState.
/// Every derived field (status, executability) is recomputed per call.

use serde::{Deserialize, Serialize};

use crate::domain::{Address, Amount, Transaction, TxIndex, TxStatus, WalletState};
use crate::error::WalletError;

/// Owned, read-only view of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionView {
    pub index: TxIndex,
    pub recipient: Address,
    pub amount: Amount,
    pub executed: bool,
    /// Insertion order.
    pub confirmations: Vec<Address>,
    pub num_confirmations: usize,
    pub status: TxStatus,
}

impl TransactionView {
    fn project(tx: &Transaction, threshold: u32) -> Self {
        Self {
            index: tx.index,
            recipient: tx.recipient.clone(),
            amount: tx.amount,
            executed: tx.executed,
            confirmations: tx.confirmations.clone(),
            num_confirmations: tx.confirmations.len(),
            status: tx.status(threshold),
        }
    }

    pub fn can_execute(&self) -> bool {
        self.status == TxStatus::Executable
    }
}

impl WalletState {
    /// Owners in construction order.
    pub fn list_owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn balance(&self) -> Amount {
        self.balance
    }

    pub fn required_confirmations(&self) -> u32 {
        self.threshold
    }

    pub fn transaction_count(&self) -> u64 {
        self.transactions.len() as u64
    }

    pub fn transaction(&self, index: TxIndex) -> Result<TransactionView, WalletError> {
        self.transaction_ref(index)
            .map(|tx| TransactionView::project(tx, self.threshold))
            .ok_or(WalletError::UnknownTransaction(index))
    }

    pub fn is_confirmed_by(&self, index: TxIndex, owner: &Address) -> Result<bool, WalletError> {
        self.transaction_ref(index)
            .map(|tx| tx.is_confirmed_by(owner))
            .ok_or(WalletError::UnknownTransaction(index))
    }

    /// Confirmers in the order they confirmed.
    pub fn confirmers_of(&self, index: TxIndex) -> Result<&[Address], WalletError> {
        self.transaction_ref(index)
            .map(Transaction::confirmations)
            .ok_or(WalletError::UnknownTransaction(index))
    }

    pub fn status(&self, index: TxIndex) -> Result<TxStatus, WalletError> {
        self.transaction_ref(index)
            .map(|tx| tx.status(self.threshold))
            .ok_or(WalletError::UnknownTransaction(index))
    }

    /// Not executed and at or above quorum. Says nothing about funds.
    pub fn can_execute(&self, index: TxIndex) -> Result<bool, WalletError> {
        Ok(self.status(index)? == TxStatus::Executable)
    }

    /// Every transaction, in index order.
    pub fn transactions(&self) -> Vec<TransactionView> {
        self.transactions
            .iter()
            .map(|tx| TransactionView::project(tx, self.threshold))
            .collect()
    }

    /// Transactions that have not been executed yet.
    pub fn pending(&self) -> Vec<TransactionView> {
        self.transactions
            .iter()
            .filter(|tx| !tx.executed)
            .map(|tx| TransactionView::project(tx, self.threshold))
            .collect()
    }
}
