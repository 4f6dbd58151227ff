use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub intake: IntakeConfig,
    #[serde(default)]
    pub tokens: TokensConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_acquire_timeout_secs() -> u64 {
    5
}
fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntakeConfig {
    #[serde(default = "default_extract_timeout_secs")]
    pub extract_timeout_secs: u64,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            extract_timeout_secs: default_extract_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

fn default_extract_timeout_secs() -> u64 {
    20
}
fn default_store_timeout_secs() -> u64 {
    10
}

impl IntakeConfig {
    pub fn extract_timeout(&self) -> Duration {
        Duration::from_secs(self.extract_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// How token artifacts are named on disk.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenKeying {
    /// One file per submission, named by application id.
    #[default]
    PerSubmission,
    /// A single `token.json`, overwritten by every submission.
    Latest,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokensConfig {
    #[serde(default = "default_tokens_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub keying: TokenKeying,
}

impl Default for TokensConfig {
    fn default() -> Self {
        Self {
            dir: default_tokens_dir(),
            keying: TokenKeying::default(),
        }
    }
}

fn default_tokens_dir() -> PathBuf {
    PathBuf::from("./data/tokens")
}

impl Config {
    /// Defaults with every artifact rooted under `data_dir`.
    pub fn minimal(data_dir: &Path) -> Self {
        Self {
            db: DbConfig {
                path: data_dir.join("ledger.sqlite"),
                acquire_timeout_secs: default_acquire_timeout_secs(),
                max_connections: default_max_connections(),
            },
            server: ServerConfig::default(),
            intake: IntakeConfig::default(),
            tokens: TokensConfig {
                dir: data_dir.join("tokens"),
                keying: TokenKeying::default(),
            },
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.acquire_timeout_secs == 0 {
        anyhow::bail!("db.acquire_timeout_secs must be > 0");
    }
    if config.db.max_connections == 0 {
        anyhow::bail!("db.max_connections must be > 0");
    }
    if config.server.request_timeout_secs == 0 {
        anyhow::bail!("server.request_timeout_secs must be > 0");
    }
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }
    if config.intake.extract_timeout_secs == 0 || config.intake.store_timeout_secs == 0 {
        anyhow::bail!("intake timeouts must be > 0");
    }
    Ok(())
}
