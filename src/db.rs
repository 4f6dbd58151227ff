//! SQLite connection pool for the ledger database.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

use crate::config::Config;

/// Opens (creating if needed) the database at `[db].path`.
///
/// WAL lets readers of `GET /ledger` proceed while an append holds the write
/// lock; writers wait up to `acquire_timeout_secs` for that lock.
pub async fn connect(config: &Config) -> Result<SqlitePool> {
    let db = &config.db;
    if let Some(parent) = db.path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database dir: {}", parent.display()))?;
    }

    let wait = Duration::from_secs(db.acquire_timeout_secs);
    let options = SqliteConnectOptions::new()
        .filename(&db.path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(wait);

    SqlitePoolOptions::new()
        .max_connections(db.max_connections)
        .acquire_timeout(wait)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open ledger database: {}", db.path.display()))
}
