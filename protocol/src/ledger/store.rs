//! Persistent ledger backed by sled.
//!
//! Three named trees:
//!
//! | Tree           | Key                         | Value                 |
//! |----------------|-----------------------------|-----------------------|
//! | `accounts`     | account id                  | [`Account`] JSON      |
//! | `transactions` | `{account}\0{seq:016x}`     | [`TransactionRecord`] |
//! | `nonces`       | `{account}\0{nonce}`        | intent id             |
//!
//! The credit path runs as one serializable multi-tree transaction:
//! balance update, record append, and nonce burn either all land or none
//! do. A nonce that is already present aborts the whole transaction, so a
//! replayed intent can never move money — not even partially, not even
//! under concurrent submission.
//!
//! Values are JSON rather than a binary codec because records carry
//! open-ended `serde_json::Value` metadata, which needs a self-describing
//! format to deserialize.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::Utc;
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use thiserror::Error;
use tracing::{debug, info};

use super::account::{Account, TransactionRecord};

const ACCOUNTS_TREE: &str = "accounts";
const TRANSACTIONS_TREE: &str = "transactions";
const NONCES_TREE: &str = "nonces";

/// Separator between account id and suffix in composite keys. Account
/// ids are caller-facing strings and must not contain NUL.
const KEY_SEP: u8 = 0x00;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// Balance would exceed `u64::MAX` micros. Practically unreachable,
    /// checked anyway.
    #[error("balance overflow for account")]
    Overflow,

    /// The `(account, nonce)` pair was already consumed by an earlier
    /// credit.
    #[error("intent nonce already consumed: account {account_id}, nonce {nonce}")]
    DuplicateIntent { account_id: String, nonce: String },

    /// Account ids become key prefixes, so they carry a couple of
    /// structural restrictions.
    #[error("invalid account id: {reason}")]
    InvalidAccountId { reason: String },
}

type TxAbort = ConflictableTransactionError<LedgerError>;

// ---------------------------------------------------------------------------
// LedgerStore
// ---------------------------------------------------------------------------

/// Handle to the on-disk ledger. Cheap to clone; all clones share the
/// same underlying sled database.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    accounts: sled::Tree,
    transactions: sled::Tree,
    nonces: sled::Tree,
}

impl LedgerStore {
    /// Opens (or creates) the ledger at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "ledger opened");
        Self::from_db(&db)
    }

    /// Opens an ephemeral in-memory ledger. For tests and dry runs.
    pub fn open_temporary() -> Result<Self, LedgerError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(&db)
    }

    fn from_db(db: &sled::Db) -> Result<Self, LedgerError> {
        Ok(Self {
            accounts: db.open_tree(ACCOUNTS_TREE)?,
            transactions: db.open_tree(TRANSACTIONS_TREE)?,
            nonces: db.open_tree(NONCES_TREE)?,
        })
    }

    // -- credit path --------------------------------------------------------

    /// Credits `amount_micros` to `account_id`, burning `nonce` in the
    /// same transaction.
    ///
    /// The account is created on first use. Returns the updated account
    /// and the appended record. Fails with [`LedgerError::DuplicateIntent`]
    /// if this `(account, nonce)` pair was ever credited before; in that
    /// case nothing is written.
    pub fn credit_intent(
        &self,
        account_id: &str,
        amount_micros: u64,
        nonce: &str,
        intent_id: &str,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> Result<(Account, TransactionRecord), LedgerError> {
        validate_account_id(account_id)?;
        let record = TransactionRecord::intent_deposit(account_id, amount_micros, metadata);

        let updated = (&self.accounts, &self.transactions, &self.nonces)
            .transaction(|(accounts, transactions, nonces)| {
                // Nonce first: the cheapest check, and the one that makes
                // the whole operation idempotent-or-reject.
                let nonce_key = composite_key(account_id, nonce.as_bytes());
                if nonces.get(&nonce_key)?.is_some() {
                    return Err(TxAbort::Abort(LedgerError::DuplicateIntent {
                        account_id: account_id.to_string(),
                        nonce: nonce.to_string(),
                    }));
                }
                nonces.insert(nonce_key, intent_id.as_bytes())?;

                let mut account = match accounts.get(account_id.as_bytes())? {
                    Some(raw) => decode::<Account>(&raw).map_err(TxAbort::Abort)?,
                    None => Account::new(account_id),
                };
                account.balance_micros = account
                    .balance_micros
                    .checked_add(amount_micros)
                    .ok_or(TxAbort::Abort(LedgerError::Overflow))?;

                let tx_key = composite_key(
                    account_id,
                    format!("{:016x}", account.tx_count).as_bytes(),
                );
                account.tx_count += 1;
                account.updated_at = Utc::now();

                transactions.insert(tx_key, encode(&record).map_err(TxAbort::Abort)?)?;
                accounts.insert(
                    account_id.as_bytes(),
                    encode(&account).map_err(TxAbort::Abort)?,
                )?;
                Ok(account)
            })
            .map_err(|e| match e {
                sled::transaction::TransactionError::Abort(err) => err,
                sled::transaction::TransactionError::Storage(err) => LedgerError::Storage(err),
            })?;

        debug!(
            account = %account_id,
            amount_micros,
            balance_micros = updated.balance_micros,
            "intent credited"
        );
        Ok((updated, record))
    }

    // -- reads --------------------------------------------------------------

    /// Fetches an account, `None` if it was never credited.
    pub fn get_account(&self, account_id: &str) -> Result<Option<Account>, LedgerError> {
        match self.accounts.get(account_id.as_bytes())? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Current balance in micros; zero for unknown accounts.
    pub fn balance_micros(&self, account_id: &str) -> Result<u64, LedgerError> {
        Ok(self
            .get_account(account_id)?
            .map(|a| a.balance_micros)
            .unwrap_or(0))
    }

    /// All transaction records for an account, oldest first.
    pub fn transactions_for(
        &self,
        account_id: &str,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut prefix = account_id.as_bytes().to_vec();
        prefix.push(KEY_SEP);

        let mut records = Vec::new();
        for entry in self.transactions.scan_prefix(&prefix) {
            let (_, raw) = entry?;
            records.push(decode(&raw)?);
        }
        Ok(records)
    }

    /// Whether a nonce was already consumed for an account.
    pub fn nonce_consumed(&self, account_id: &str, nonce: &str) -> Result<bool, LedgerError> {
        let key = composite_key(account_id, nonce.as_bytes());
        Ok(self.nonces.get(key)?.is_some())
    }

    /// Number of materialized accounts.
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Flushes pending writes to disk.
    pub fn flush(&self) -> Result<(), LedgerError> {
        self.accounts.flush()?;
        self.transactions.flush()?;
        self.nonces.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn composite_key(account_id: &str, suffix: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(account_id.len() + 1 + suffix.len());
    key.extend_from_slice(account_id.as_bytes());
    key.push(KEY_SEP);
    key.extend_from_slice(suffix);
    key
}

fn validate_account_id(account_id: &str) -> Result<(), LedgerError> {
    if account_id.is_empty() {
        return Err(LedgerError::InvalidAccountId {
            reason: "empty".into(),
        });
    }
    if account_id.bytes().any(|b| b == KEY_SEP) {
        return Err(LedgerError::InvalidAccountId {
            reason: "contains NUL byte".into(),
        });
    }
    Ok(())
}

fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LedgerError> {
    serde_json::to_vec(value).map_err(|e| LedgerError::Serialization(e.to_string()))
}

fn decode<T: serde::de::DeserializeOwned>(raw: &[u8]) -> Result<T, LedgerError> {
    serde_json::from_slice(raw).map_err(|e| LedgerError::Serialization(e.to_string()))
}
