//! Core data models for the intake pipeline.
//!
//! A [`Document`] lives only for one submission. Its text becomes a
//! [`TokenSet`] and its raw bytes become the `resume_hash` of a
//! [`LedgerEntry`], the only record that is kept durably.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Raw bytes of an uploaded document plus the media type the client declared.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

impl Document {
    pub fn new(bytes: impl Into<Vec<u8>>, media_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            media_type: media_type.into(),
        }
    }
}

/// Deduplicated set of lowercase words from a document's text.
///
/// Ordered so that the persisted artifact is byte-stable for the same input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a token. Empty strings are ignored.
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.is_empty() {
            return false;
        }
        self.0.insert(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// The `{ "word": true, ... }` wire shape used by `POST /tokens`.
    pub fn to_presence_map(&self) -> BTreeMap<&str, bool> {
        self.0.iter().map(|t| (t.as_str(), true)).collect()
    }

    /// Builds a set from a client-supplied presence map. Keys marked `true`
    /// go through [`tokenize`](crate::tokenize::tokenize), so the result obeys
    /// the same lowercase, punctuation-free rule as a document's tokens.
    pub fn from_presence_map(map: BTreeMap<String, bool>) -> Self {
        let words: Vec<String> = map
            .into_iter()
            .filter_map(|(word, present)| present.then_some(word))
            .collect();
        crate::tokenize::tokenize(&words.join(" "))
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for token in iter {
            set.insert(token);
        }
        set
    }
}

/// Optional applicant details carried verbatim from the submission form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantMetadata {
    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// One immutable record in the ledger.
///
/// `sequence` is assigned by the store on append and is `None` on entries
/// that have not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    pub application_id: String,
    pub resume_hash: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub metadata: ApplicantMetadata,
}

impl LedgerEntry {
    /// Builds an unsequenced entry stamped with the current instant.
    pub fn new(
        application_id: impl Into<String>,
        resume_hash: impl Into<String>,
        metadata: ApplicantMetadata,
    ) -> Self {
        Self {
            sequence: None,
            application_id: application_id.into(),
            resume_hash: resume_hash.into(),
            timestamp: now_millis(),
            metadata,
        }
    }
}

/// Store-assigned position of an appended entry (1-based insertion order).
pub type EntryId = u64;

/// Acknowledgment returned once an entry is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub application_id: String,
    pub resume_hash: String,
    pub sequence: EntryId,
}

/// Current instant truncated to milliseconds, the precision the ledger keeps.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
