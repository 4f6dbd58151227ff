//! In-memory [`LedgerStore`] for tests and embedded use.
//!
//! A `Vec` behind a `std::sync::RwLock`; the write lock serialises appends,
//! so concurrent submissions never lose entries.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::LedgerStore;
use crate::error::StoreError;
use crate::models::{EntryId, LedgerEntry};

#[derive(Default)]
pub struct InMemoryLedger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries. Still counts them after a writer panicked;
    /// appends and reads report the poisoned lock as `Unavailable`.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Unavailable("in-memory ledger lock poisoned".to_string())
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<EntryId, StoreError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        if entries
            .iter()
            .any(|e| e.application_id == entry.application_id)
        {
            return Err(StoreError::DuplicateId(entry.application_id.clone()));
        }
        let sequence = entries.len() as EntryId + 1;
        let mut stored = entry.clone();
        stored.sequence = Some(sequence);
        entries.push(stored);
        Ok(sequence)
    }

    async fn list_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.clone())
    }
}
