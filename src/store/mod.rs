//! Append-only ledger storage.
//!
//! The [`LedgerStore`] trait is the whole storage contract: entries can be
//! appended and read back in insertion order. There is no update or delete
//! operation.
//!
//! Implementations must be `Send + Sync`; concurrent `append` calls from
//! independent submissions must not lose writes.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`memory::InMemoryLedger`] | tests and embedded use |
//! | [`sqlite::SqliteLedger`] | the durable store behind the server and CLI |

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{EntryId, LedgerEntry};

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Durably appends `entry` and returns its insertion sequence number.
    ///
    /// Fails with [`StoreError::DuplicateId`] if the `application_id` is
    /// already recorded. Any `sequence` already set on `entry` is ignored.
    async fn append(&self, entry: &LedgerEntry) -> Result<EntryId, StoreError>;

    /// Every entry in insertion order, each with its `sequence` populated.
    async fn list_all(&self) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Entries recorded for `resume_hash`, in insertion order.
    ///
    /// The default scans [`list_all`](LedgerStore::list_all); backends with
    /// an index on the hash override it.
    async fn find_by_hash(&self, resume_hash: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|e| e.resume_hash == resume_hash)
            .collect())
    }
}
