//! Submission orchestration.
//!
//! One submission runs through a fixed sequence of stages:
//!
//! ```text
//! Validating → Extracting → Tokenizing → PersistingTokens → Fingerprinting
//!            → Appending → Refreshing → Done
//! ```
//!
//! Any stage before `Appending` may fail the submission, in which case the
//! ledger is never written. Token persistence is best effort: its failure is
//! logged and the submission carries on. Once `Appending` succeeds the
//! submission is committed; a failed `Refreshing` only adds a warning.
//!
//! The refreshed ledger is a display convenience. It may or may not include
//! the entry just appended when the store sits across a network boundary;
//! the [`Receipt`] is the authoritative acknowledgment.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::{Config, IntakeConfig};
use crate::error::{ExtractError, IntakeError, StoreError};
use crate::extract::{extract_text, DocumentFormat};
use crate::fingerprint::{fingerprint, new_application_id};
use crate::models::{ApplicantMetadata, Document, LedgerEntry, Receipt};
use crate::store::sqlite::SqliteLedger;
use crate::store::LedgerStore;
use crate::tokenize::tokenize;
use crate::tokens::{FileTokenStore, TokenStore};
use crate::{db, migrate};

/// A single application as received from the client.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub document: Option<Document>,
    pub metadata: ApplicantMetadata,
}

impl Submission {
    pub fn new(document: Document, metadata: ApplicantMetadata) -> Self {
        Self {
            document: Some(document),
            metadata,
        }
    }
}

/// Result of a committed submission.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub receipt: Receipt,
    /// The ledger as re-read after the append, if that read succeeded.
    pub ledger: Option<Vec<LedgerEntry>>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Extracting,
    Tokenizing,
    PersistingTokens,
    Fingerprinting,
    Appending,
    Refreshing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Extracting => "extracting",
            Stage::Tokenizing => "tokenizing",
            Stage::PersistingTokens => "persisting_tokens",
            Stage::Fingerprinting => "fingerprinting",
            Stage::Appending => "appending",
            Stage::Refreshing => "refreshing",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// The intake pipeline. Built once at startup and shared across requests.
pub struct Intake {
    ledger: Arc<dyn LedgerStore>,
    tokens: Arc<dyn TokenStore>,
    extract_timeout: Duration,
    store_timeout: Duration,
}

impl Intake {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        tokens: Arc<dyn TokenStore>,
        config: &IntakeConfig,
    ) -> Self {
        Self {
            ledger,
            tokens,
            extract_timeout: config.extract_timeout(),
            store_timeout: config.store_timeout(),
        }
    }

    /// Overrides the extraction and store-call bounds.
    pub fn with_timeouts(mut self, extract: Duration, store: Duration) -> Self {
        self.extract_timeout = extract;
        self.store_timeout = store;
        self
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerStore> {
        &self.ledger
    }

    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Runs one submission to completion or to its first fatal failure.
    pub async fn submit(&self, submission: Submission) -> Result<SubmissionOutcome, IntakeError> {
        let Submission { document, metadata } = submission;

        enter(Stage::Validating);
        let document = document.ok_or_else(|| {
            IntakeError::UnsupportedFormat("no document attached".to_string())
        })?;
        if DocumentFormat::from_media_type(&document.media_type).is_none() {
            return Err(ExtractError::UnsupportedFormat(document.media_type).into());
        }

        enter(Stage::Extracting);
        let (document, text) = self.extract(document).await?;

        enter(Stage::Tokenizing);
        let tokens = tokenize(&text);
        let application_id = new_application_id();

        enter(Stage::PersistingTokens);
        match tokio::time::timeout(
            self.store_timeout,
            self.tokens.save(Some(&application_id), &tokens),
        )
        .await
        {
            Ok(Ok(())) => debug!(application_id = %application_id, tokens = tokens.len(), "tokens saved"),
            Ok(Err(e)) => {
                let error = format!("{:#}", e);
                warn!(application_id = %application_id, %error, "token persistence failed; continuing")
            }
            Err(_) => warn!(application_id = %application_id, "token persistence timed out; continuing"),
        }

        enter(Stage::Fingerprinting);
        let resume_hash = fingerprint(&document.bytes);
        drop(document);

        enter(Stage::Appending);
        let entry = LedgerEntry::new(application_id, resume_hash, metadata);
        let sequence = self.bounded(self.ledger.append(&entry)).await?;
        info!(
            application_id = %entry.application_id,
            resume_hash = %entry.resume_hash,
            sequence,
            "ledger entry committed"
        );
        let receipt = Receipt {
            application_id: entry.application_id,
            resume_hash: entry.resume_hash,
            sequence,
        };

        enter(Stage::Refreshing);
        let mut warnings = Vec::new();
        let ledger = match self.bounded(self.ledger.list_all()).await {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(application_id = %receipt.application_id, error = %e, "ledger refresh failed after commit");
                warnings.push(format!("entry committed but ledger refresh failed: {}", e));
                None
            }
        };

        enter(Stage::Done);
        Ok(SubmissionOutcome {
            receipt,
            ledger,
            warnings,
        })
    }

    /// Parses off the async runtime, bounded by the extract timeout. A parser
    /// panic is reported as a corrupt document.
    async fn extract(&self, document: Document) -> Result<(Document, String), IntakeError> {
        let task = tokio::task::spawn_blocking(move || {
            let text = extract_text(&document.bytes, &document.media_type);
            (document, text)
        });
        match tokio::time::timeout(self.extract_timeout, task).await {
            Ok(Ok((document, Ok(text)))) => {
                debug!(chars = text.len(), "text extracted");
                Ok((document, text))
            }
            Ok(Ok((_, Err(e)))) => Err(e.into()),
            Ok(Err(join_err)) => Err(IntakeError::CorruptDocument(format!(
                "document parser aborted: {}",
                join_err
            ))),
            Err(_) => Err(ExtractError::TimedOut.into()),
        }
    }

    /// Applies the store timeout to a store call.
    pub async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.store_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(StoreError::Unavailable(format!(
                    "store call exceeded {:?}",
                    self.store_timeout
                )))
            })
    }
}

/// Opens the SQLite ledger (migrating it if needed) and the file token
/// store named in `config`, and wires them into an [`Intake`].
pub async fn open(config: &Config) -> anyhow::Result<Intake> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let ledger: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::new(pool));
    let tokens: Arc<dyn TokenStore> = Arc::new(FileTokenStore::from_config(&config.tokens));
    Ok(Intake::new(ledger, tokens, &config.intake))
}

fn enter(stage: Stage) {
    debug!(%stage, "intake stage");
}
