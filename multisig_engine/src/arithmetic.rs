/// Multisig Kernel v1: Arithmetic Primitives
///
/// All value amounts: u128 in the smallest native unit.
/// No float. No f64. No f32. No wrapping.

use crate::domain::Amount;
use crate::error::{SetupError, WalletError};

/// Credit `amount` to `balance`. Refuses instead of overflowing.
pub fn checked_credit(balance: Amount, amount: Amount) -> Result<Amount, WalletError> {
    balance
        .checked_add(amount)
        .ok_or(WalletError::BalanceOverflow { balance, amount })
}

/// Debit `amount` from `balance`. Refuses instead of underflowing.
pub fn checked_debit(balance: Amount, amount: Amount) -> Result<Amount, WalletError> {
    balance
        .checked_sub(amount)
        .ok_or(WalletError::InsufficientFunds {
            balance,
            required: amount,
        })
}

/// Longest accepted address, in bytes. Keeps every command well inside
/// the command log's frame limit.
pub const MAX_ADDRESS_LEN: usize = 128;

/// Validate that an address matches `[A-Za-z0-9_-]{1,128}`.
pub fn validate_address(raw: &str) -> Result<(), SetupError> {
    if raw.len() > MAX_ADDRESS_LEN {
        let head: String = raw.chars().take(MAX_ADDRESS_LEN).collect();
        return Err(SetupError::InvalidAddress(head));
    }
    if raw.is_empty()
        || !raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(SetupError::InvalidAddress(raw.to_string()));
    }
    Ok(())
}
