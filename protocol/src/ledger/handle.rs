//! Lazily-initialized shared ledger handle.
//!
//! Opening sled touches the filesystem and takes a lock, so services
//! defer it until the first operation actually needs the ledger. The
//! [`LedgerHandle`] wraps that deferral: construction is free, and the
//! first caller to need the store pays for opening it.
//!
//! Concurrency contract: when several tasks hit an uninitialized handle
//! at once, exactly one performs the open and the rest await the same
//! result. A failed open is not cached — the next caller retries from
//! scratch.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::warn;

use super::store::{LedgerError, LedgerStore};

/// Deferred-open wrapper around [`LedgerStore`]. Cheap to clone; clones
/// share the same initialization cell, so the store opens at most once
/// per handle lineage.
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    path: PathBuf,
    cell: Arc<OnceCell<LedgerStore>>,
}

impl LedgerHandle {
    /// Creates a handle for the ledger at `path` without touching disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Returns the store, opening it on first use.
    ///
    /// Concurrent callers during the first open all await the single
    /// in-flight attempt. On failure the error propagates to every
    /// waiter and the cell stays empty, so a later call gets a fresh
    /// attempt.
    pub async fn store(&self) -> Result<&LedgerStore, LedgerError> {
        self.cell
            .get_or_try_init(|| {
                let path = self.path.clone();
                async move {
                    LedgerStore::open(&path).map_err(|e| {
                        warn!(path = %path.display(), error = %e, "ledger open failed");
                        e
                    })
                }
            })
            .await
    }

    /// Whether the underlying store has been opened yet.
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}
