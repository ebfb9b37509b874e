//! Ledger record types: accounts and transaction entries.
//!
//! Everything here is a plain serializable value. Balance arithmetic and
//! persistence live in [`super::store`]; these types just hold state and
//! know how to stamp timestamps.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// A ledger account, keyed by its string identity.
///
/// Balances are whole micro-units (1e-6 of the display unit), always
/// non-negative. There is no debit path in this ledger, so the balance
/// only ever grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Caller-supplied identity, e.g. `"alice"`.
    pub account_id: String,
    /// Current balance in micros.
    pub balance_micros: u64,
    /// Number of transactions recorded against this account. Doubles as
    /// the next transaction sequence number.
    pub tx_count: u64,
    /// When the account was first materialized.
    pub created_at: DateTime<Utc>,
    /// Last mutation instant.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A fresh zero-balance account created now.
    pub fn new(account_id: &str) -> Self {
        let now = Utc::now();
        Self {
            account_id: account_id.to_string(),
            balance_micros: 0,
            tx_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Transaction records
// ---------------------------------------------------------------------------

/// What kind of ledger event a record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credit funded by a verified signed intent.
    IntentDeposit,
}

/// Terminal (or pending) state of a recorded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
    Pending,
}

/// One append-only ledger entry. Never mutated after being written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Random v4 UUID, unique across the ledger.
    pub id: String,
    /// Owning account.
    pub account_id: String,
    pub tx_type: TransactionType,
    pub status: TransactionStatus,
    /// Credited amount in micros. `None` for records that carry no
    /// value movement.
    pub amount_micros: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// Free-form context: intent id, nonce, token, memo. Opaque to the
    /// ledger itself.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl TransactionRecord {
    /// A completed intent-deposit record for `amount_micros`.
    pub fn intent_deposit(
        account_id: &str,
        amount_micros: u64,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            tx_type: TransactionType::IntentDeposit,
            status: TransactionStatus::Completed,
            amount_micros: Some(amount_micros),
            created_at: Utc::now(),
            metadata,
        }
    }
}
