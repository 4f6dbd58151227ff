//! Error taxonomy for the intake pipeline.
//!
//! Each component surfaces its own error type; [`IntakeError`] is the single
//! type the orchestrator and the HTTP layer reason about.

use thiserror::Error;

/// Failure while turning document bytes into text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported media type: {0}")]
    UnsupportedFormat(String),
    #[error("corrupt document: {0}")]
    Corrupt(String),
    #[error("document extraction timed out")]
    TimedOut,
}

/// Failure reported by a [`LedgerStore`](crate::store::LedgerStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
    #[error("application id already recorded: {0}")]
    DuplicateId(String),
}

/// Terminal failure of a submission.
///
/// `UnsupportedFormat` and `CorruptDocument` are raised before the ledger is
/// touched. `StoreUnavailable` is transient and left for the caller to retry.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("corrupt document: {0}")]
    CorruptDocument(String),
    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("duplicate application id: {0}")]
    DuplicateId(String),
}

impl From<ExtractError> for IntakeError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::UnsupportedFormat(media_type) => IntakeError::UnsupportedFormat(
                format!("unsupported media type: {}", media_type),
            ),
            ExtractError::Corrupt(msg) => IntakeError::CorruptDocument(msg),
            ExtractError::TimedOut => {
                IntakeError::CorruptDocument("document extraction timed out".to_string())
            }
        }
    }
}

impl From<StoreError> for IntakeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => IntakeError::StoreUnavailable(msg),
            StoreError::DuplicateId(id) => IntakeError::DuplicateId(id),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::DuplicateId(db_err.message().to_string());
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}
