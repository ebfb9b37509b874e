//! Account balances and the append-only transaction log.
//!
//! The ledger is the only component that moves value. It exposes one
//! mutation, the atomic intent credit, and a handful of reads. All
//! arithmetic is integer micros — see [`crate::money`] for the
//! display-unit conversions.

pub mod account;
pub mod handle;
pub mod store;

pub use account::{Account, TransactionRecord, TransactionStatus, TransactionType};
pub use handle::LedgerHandle;
pub use store::{LedgerError, LedgerStore};
