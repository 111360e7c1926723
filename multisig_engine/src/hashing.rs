/// Multisig Kernel v1: Canonical Hashing
///
/// Deterministic canonical serialization + SHA-256 hashing.
/// Produces byte-identical output across platforms.
///
/// Rules:
///   - Owners in construction order (that order is part of the wallet)
///   - Transactions in index order, confirmations in insertion order
///   - Amounts and balance as decimal strings (u128 exceeds JSON integers)
///   - UTF-8 JSON, no whitespace, no float, fixed field order

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::WalletState;
use crate::KERNEL_VERSION;

/// Canonical serialization of WalletState to UTF-8 JSON bytes.
/// Includes kernel_version as the first field for identity binding.
pub fn canonical_serialize(state: &WalletState) -> Vec<u8> {
    // Serializing a Value built from strings, bools and u64s cannot fail.
    build_canonical_value(state).to_string().into_bytes()
}

/// SHA-256 of canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &WalletState) -> String {
    hex_digest(&canonical_serialize(state))
}

/// Lowercase hex SHA-256 of arbitrary bytes.
pub fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<String>()
}

/// Build the canonical serde_json::Value in strict field order.
///
/// Field order: kernel_version, owners, threshold, balance, transactions
fn build_canonical_value(state: &WalletState) -> Value {
    let owners: Vec<Value> = state
        .owners
        .iter()
        .map(|o| Value::String(o.to_string()))
        .collect();

    let mut transactions: Vec<Value> = Vec::with_capacity(state.transactions.len());
    for tx in &state.transactions {
        let mut tx_map = Map::new();
        tx_map.insert("index".to_string(), Value::Number(tx.index.into()));
        tx_map.insert(
            "recipient".to_string(),
            Value::String(tx.recipient.to_string()),
        );
        tx_map.insert("amount".to_string(), Value::String(tx.amount.to_string()));
        tx_map.insert(
            "confirmations".to_string(),
            Value::Array(
                tx.confirmations
                    .iter()
                    .map(|c| Value::String(c.to_string()))
                    .collect(),
            ),
        );
        tx_map.insert("executed".to_string(), Value::Bool(tx.executed));
        transactions.push(Value::Object(tx_map));
    }

    // kernel_version MUST be first; it is part of the kernel identity.
    let mut root = Map::new();
    root.insert(
        "kernel_version".to_string(),
        Value::Number(KERNEL_VERSION.into()),
    );
    root.insert("owners".to_string(), Value::Array(owners));
    root.insert("threshold".to_string(), Value::Number(state.threshold.into()));
    root.insert("balance".to_string(), Value::String(state.balance.to_string()));
    root.insert("transactions".to_string(), Value::Array(transactions));

    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{create_initial_state, parse_owners};

    #[test]
    fn canonical_form_has_fixed_field_order() {
        let state = create_initial_state(parse_owners(&["bob", "alice"]).unwrap(), 1).unwrap();
        let json = String::from_utf8(canonical_serialize(&state)).unwrap();
        assert_eq!(
            json,
            r#"{"kernel_version":1,"owners":["bob","alice"],"threshold":1,"balance":"0","transactions":[]}"#
        );
    }

    #[test]
    fn hash_is_lowercase_hex_sha256() {
        let state = create_initial_state(parse_owners(&["alice"]).unwrap(), 1).unwrap();
        let h = canonical_hash(&state);
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert_eq!(h, canonical_hash(&state.clone()));
    }

    #[test]
    fn owner_order_changes_identity() {
        let a = create_initial_state(parse_owners(&["alice", "bob"]).unwrap(), 1).unwrap();
        let b = create_initial_state(parse_owners(&["bob", "alice"]).unwrap(), 1).unwrap();
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
