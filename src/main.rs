//! # Resume Ledger CLI (`ledger`)
//!
//! ## Usage
//!
//! ```bash
//! ledger --config ./config/ledger.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ledger init` | Create the SQLite ledger and run schema migrations |
//! | `ledger serve` | Start the HTTP server |
//! | `ledger submit <file>` | Run a document through the intake pipeline |
//! | `ledger list` | Print every ledger entry in insertion order |
//! | `ledger verify <file>` | Check whether a document's fingerprint is on the ledger |

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use resume_ledger::config;
use resume_ledger::extract::DocumentFormat;
use resume_ledger::intake::{self, Submission};
use resume_ledger::migrate;
use resume_ledger::models::{ApplicantMetadata, Document, LedgerEntry};
use resume_ledger::server;
use resume_ledger::verify::verify_document;

/// Resume Ledger: intake job applications and record their fingerprints on
/// an append-only, publicly readable ledger.
#[derive(Parser)]
#[command(name = "ledger", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/ledger.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the ledger database. Safe to run repeatedly.
    Init,

    /// Start the HTTP server on `[server].bind`.
    Serve,

    /// Extract, tokenize, fingerprint and append a document to the ledger.
    Submit {
        /// Path to a `.pdf` or `.docx` file.
        path: PathBuf,

        /// Declared media type. Inferred from the file extension when omitted.
        #[arg(long)]
        media_type: Option<String>,

        #[command(flatten)]
        applicant: ApplicantArgs,
    },

    /// Print the full ledger in insertion order.
    List {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Fingerprint a document and report matching ledger entries.
    ///
    /// Exits non-zero when no entry matches.
    Verify {
        path: PathBuf,
    },
}

/// Optional applicant details recorded alongside the fingerprint.
#[derive(Args)]
struct ApplicantArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    qualification: Option<String>,
    #[arg(long)]
    experience: Option<String>,
    #[arg(long)]
    skills: Option<String>,
    #[arg(long)]
    gender: Option<String>,
}

impl From<ApplicantArgs> for ApplicantMetadata {
    fn from(a: ApplicantArgs) -> Self {
        ApplicantMetadata {
            name: a.name,
            email: a.email,
            phone: a.phone,
            qualification: a.qualification,
            experience: a.experience,
            skills: a.skills,
            gender: a.gender,
        }
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn infer_media_type(path: &Path) -> anyhow::Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(DocumentFormat::media_type_for_extension)
        .map(str::to_string)
        .with_context(|| {
            format!(
                "cannot infer media type for {}; pass --media-type",
                path.display()
            )
        })
}

fn print_entry(entry: &LedgerEntry) {
    let seq = entry
        .sequence
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>5}  {}  {}  {}  {}",
        seq,
        entry.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        entry.application_id,
        entry.resume_hash,
        entry.metadata.name.as_deref().unwrap_or("")
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(match cli.command {
        Commands::Serve => "info",
        _ => "warn",
    });

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Ledger initialized successfully.");
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Submit {
            path,
            media_type,
            applicant,
        } => {
            let media_type = match media_type {
                Some(mt) => mt,
                None => infer_media_type(&path)?,
            };
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;

            let pipeline = intake::open(&cfg).await?;
            let outcome = pipeline
                .submit(Submission::new(
                    Document::new(bytes, media_type),
                    applicant.into(),
                ))
                .await?;

            println!("submitted {}", path.display());
            println!("  application_id: {}", outcome.receipt.application_id);
            println!("  resume_hash: {}", outcome.receipt.resume_hash);
            println!("  sequence: {}", outcome.receipt.sequence);
            if let Some(ledger) = &outcome.ledger {
                println!("  ledger size: {}", ledger.len());
            }
            for w in &outcome.warnings {
                println!("  warning: {}", w);
            }
            println!("ok");
        }
        Commands::List { json } => {
            let pipeline = intake::open(&cfg).await?;
            let entries = pipeline.ledger().list_all().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("ledger is empty");
            } else {
                for entry in &entries {
                    print_entry(entry);
                }
            }
        }
        Commands::Verify { path } => {
            let bytes = std::fs::read(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let pipeline = intake::open(&cfg).await?;
            let result = verify_document(pipeline.ledger().as_ref(), &bytes).await?;

            println!("resume_hash: {}", result.resume_hash);
            if !result.found {
                anyhow::bail!("no ledger entry matches {}", path.display());
            }
            println!("matches: {}", result.entries.len());
            for entry in &result.entries {
                print_entry(entry);
            }
        }
    }

    Ok(())
}
