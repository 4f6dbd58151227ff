//! SQLite-backed [`LedgerStore`].
//!
//! Each append is a single-row `INSERT`, so SQLite's own write lock is the
//! only coordination concurrent submissions need. The sequence column is an
//! `AUTOINCREMENT` key and doubles as insertion order.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use super::LedgerStore;
use crate::error::StoreError;
use crate::models::{ApplicantMetadata, EntryId, LedgerEntry};

pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const SELECT_ENTRIES: &str = r#"
    SELECT sequence, application_id, resume_hash, timestamp,
           name, email, phone, qualification, experience, skills, gender
    FROM ledger_entries
"#;

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row_to_entry(row: &SqliteRow) -> Result<LedgerEntry, StoreError> {
    let sequence: i64 = row.try_get("sequence")?;
    let raw_ts: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&raw_ts)
        .map_err(|e| StoreError::Unavailable(format!("bad timestamp {:?}: {}", raw_ts, e)))?
        .with_timezone(&Utc);

    Ok(LedgerEntry {
        sequence: Some(sequence as EntryId),
        application_id: row.try_get("application_id")?,
        resume_hash: row.try_get("resume_hash")?,
        timestamp,
        metadata: ApplicantMetadata {
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            qualification: row.try_get("qualification")?,
            experience: row.try_get("experience")?,
            skills: row.try_get("skills")?,
            gender: row.try_get("gender")?,
        },
    })
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    async fn append(&self, entry: &LedgerEntry) -> Result<EntryId, StoreError> {
        let m = &entry.metadata;
        let result = sqlx::query(
            r#"
            INSERT INTO ledger_entries (application_id, resume_hash, timestamp,
                                        name, email, phone, qualification,
                                        experience, skills, gender)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.application_id)
        .bind(&entry.resume_hash)
        .bind(format_timestamp(&entry.timestamp))
        .bind(&m.name)
        .bind(&m.email)
        .bind(&m.phone)
        .bind(&m.qualification)
        .bind(&m.experience)
        .bind(&m.skills)
        .bind(&m.gender)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::DuplicateId(_) => StoreError::DuplicateId(entry.application_id.clone()),
            other => other,
        })?;

        Ok(result.last_insert_rowid() as EntryId)
    }

    async fn list_all(&self) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(&format!("{} ORDER BY sequence ASC", SELECT_ENTRIES))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Served from `idx_ledger_entries_resume_hash`.
    async fn find_by_hash(&self, resume_hash: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(&find_by_hash_sql())
            .bind(resume_hash)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry).collect()
    }
}

fn find_by_hash_sql() -> String {
    format!(
        "{} WHERE resume_hash = ? ORDER BY sequence ASC",
        SELECT_ENTRIES
    )
}
