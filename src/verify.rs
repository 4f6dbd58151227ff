//! Public verification against the ledger.
//!
//! Anyone holding a document can recompute its fingerprint and check which
//! ledger entries, if any, were recorded for exactly those bytes.

use serde::Serialize;

use crate::error::StoreError;
use crate::fingerprint::fingerprint;
use crate::models::LedgerEntry;
use crate::store::LedgerStore;

#[derive(Debug, Clone, Serialize)]
pub struct Verification {
    pub resume_hash: String,
    pub found: bool,
    pub entries: Vec<LedgerEntry>,
}

/// Entries whose `resume_hash` equals `resume_hash`, in ledger order.
pub async fn lookup_hash(
    store: &dyn LedgerStore,
    resume_hash: &str,
) -> Result<Verification, StoreError> {
    let entries = store.find_by_hash(resume_hash).await?;
    Ok(Verification {
        resume_hash: resume_hash.to_string(),
        found: !entries.is_empty(),
        entries,
    })
}

/// Fingerprints `bytes` and looks the digest up in the ledger.
pub async fn verify_document(
    store: &dyn LedgerStore,
    bytes: &[u8],
) -> Result<Verification, StoreError> {
    lookup_hash(store, &fingerprint(bytes)).await
}
