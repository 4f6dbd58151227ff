//! # Resume Ledger
//!
//! Intake for job-application documents with a public integrity ledger.
//!
//! A submitted PDF or Word document is reduced to plain text and a token set,
//! its raw bytes are fingerprinted with SHA-256, and an immutable entry
//! carrying that fingerprint is appended to a shared ledger that anyone can
//! re-read to verify a document.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────┐   ┌────────────┐   ┌─────────────┐
//!   bytes ───────▶│  extract   │──▶│  tokenize  │──▶│   tokens    │ (best effort)
//!     │           └────────────┘   └────────────┘   └─────────────┘
//!     │           ┌─────────────┐  ┌────────────┐
//!     └──────────▶│ fingerprint │─▶│   store    │──▶ ledger (append-only)
//!                 └─────────────┘  └────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types |
//! | [`extract`] | PDF / DOCX text extraction |
//! | [`tokenize`] | Canonical token sets |
//! | [`fingerprint`] | SHA-256 digests and application ids |
//! | [`store`] | Append-only ledger storage |
//! | [`tokens`] | Token artifact persistence |
//! | [`intake`] | Submission orchestration |
//! | [`verify`] | Document verification against the ledger |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod intake;
pub mod migrate;
pub mod models;
pub mod server;
pub mod store;
pub mod tokenize;
pub mod tokens;
pub mod verify;
