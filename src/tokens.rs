//! Token artifact persistence.
//!
//! Token sets are an auxiliary artifact: the orchestrator writes them best
//! effort and never lets a failure here block the ledger append.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::config::{TokenKeying, TokensConfig};
use crate::models::TokenSet;

/// File name used when artifacts are not keyed per submission.
pub const LATEST_TOKEN_FILE: &str = "token.json";

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Persists `tokens`. `key` is the submission's application id when known.
    async fn save(&self, key: Option<&str>, tokens: &TokenSet) -> Result<()>;
}

/// Writes token sets as pretty-printed `{ "word": true }` JSON files.
pub struct FileTokenStore {
    dir: PathBuf,
    keying: TokenKeying,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>, keying: TokenKeying) -> Self {
        Self {
            dir: dir.into(),
            keying,
        }
    }

    pub fn from_config(config: &TokensConfig) -> Self {
        Self::new(config.dir.clone(), config.keying)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the artifact for `key` lands under the configured keying.
    pub fn path_for(&self, key: Option<&str>) -> Result<PathBuf> {
        match (self.keying, key) {
            (TokenKeying::PerSubmission, Some(key)) => {
                if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    anyhow::bail!("invalid token artifact key: {:?}", key);
                }
                Ok(self.dir.join(format!("{}.json", key)))
            }
            _ => Ok(self.dir.join(LATEST_TOKEN_FILE)),
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn save(&self, key: Option<&str>, tokens: &TokenSet) -> Result<()> {
        let path = self.path_for(key)?;
        let json = serde_json::to_vec_pretty(&tokens.to_presence_map())?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create token dir: {}", self.dir.display()))?;

        // Write-then-rename so readers never observe a partial file.
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e).with_context(|| format!("Failed to write {}", path.display()));
        }
        Ok(())
    }
}
