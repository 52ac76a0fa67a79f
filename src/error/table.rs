//! Per-integration classification tables
//!
//! A [`ClassificationTable`] is plain data: a map from an upstream error code
//! to the [`ErrorKind`] and retryability it should be classified as. Codes are
//! normalised to their string form on insertion and lookup, so the numeric
//! code `401` and the text code `"401"` address the same entry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use super::classification::{ClassifiedError, ErrorCode, ErrorKind};

/// Transport-level failure codes surfaced by common HTTP clients.
pub const NETWORK_CODES: &[&str] = &[
    "ECONNRESET",
    "ECONNREFUSED",
    "ETIMEDOUT",
    "ENOTFOUND",
    "EAI_AGAIN",
    "EPIPE",
];

/// Errors raised while building a classification table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Two entries normalise to the same code.
    #[error("duplicate classification entry for code '{0}'")]
    DuplicateCode(String),

    /// A table file could not be parsed.
    #[error("failed to parse classification table: {0}")]
    Parse(#[from] toml::de::Error),
}

/// How a single code is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawEntry")]
pub struct TableEntry {
    pub kind: ErrorKind,
    pub retryable: bool,
}

impl TableEntry {
    pub fn new(kind: ErrorKind, retryable: bool) -> Self {
        Self { kind, retryable }
    }

    /// An entry that keeps the kind's default retryability.
    pub fn of_kind(kind: ErrorKind) -> Self {
        Self::new(kind, kind.is_retryable_by_default())
    }
}

/// Serialized entry; `retryable` may be omitted.
#[derive(Deserialize)]
struct RawEntry {
    kind: ErrorKind,
    #[serde(default)]
    retryable: Option<bool>,
}

impl From<RawEntry> for TableEntry {
    fn from(raw: RawEntry) -> Self {
        match raw.retryable {
            Some(retryable) => TableEntry::new(raw.kind, retryable),
            None => TableEntry::of_kind(raw.kind),
        }
    }
}

/// Immutable mapping from error code to classification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationTable {
    entries: HashMap<String, TableEntry>,
}

impl ClassificationTable {
    /// An empty table; every error falls through to the status ladder.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    /// Build a table from `(code, entry)` pairs.
    ///
    /// Fails if two codes normalise to the same key.
    pub fn from_entries<I, C>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (C, TableEntry)>,
        C: Into<ErrorCode>,
    {
        entries
            .into_iter()
            .fold(TableBuilder::default(), |builder, (code, entry)| {
                builder.insert(code.into(), entry)
            })
            .build()
    }

    /// Parse a table from TOML where each top-level key is a code.
    ///
    /// ```toml
    /// "401" = { kind = "Authentication" }
    /// rate_limited = { kind = "RateLimit", retryable = true }
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, TableError> {
        let entries: HashMap<String, TableEntry> = toml::from_str(source)?;
        Ok(Self { entries })
    }

    /// Look up the entry for a code.
    pub fn get(&self, code: &ErrorCode) -> Option<TableEntry> {
        self.get_key(&code.key())
    }

    /// Look up the entry for an already-normalised key.
    pub fn get_key(&self, key: &str) -> Option<TableEntry> {
        self.entries.get(key).copied()
    }

    pub fn contains(&self, code: &ErrorCode) -> bool {
        self.entries.contains_key(&code.key())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, entry)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Return a new table with `overrides` layered on top.
    ///
    /// An override replaces the entry for the same code.
    pub fn with_overrides(&self, overrides: &ClassificationTable) -> Self {
        let mut entries = self.entries.clone();
        entries.extend(overrides.entries.iter().map(|(k, v)| (k.clone(), *v)));
        Self { entries }
    }

    /// Classify a raw upstream error against this table.
    pub fn classify(&self, raw: Value) -> ClassifiedError {
        super::classifier::classify(raw, self)
    }
}

/// Incremental builder for [`ClassificationTable`].
#[derive(Debug, Default)]
pub struct TableBuilder {
    entries: HashMap<String, TableEntry>,
    duplicate: Option<String>,
}

impl TableBuilder {
    /// Add an entry with explicit retryability.
    pub fn entry(self, code: impl Into<ErrorCode>, kind: ErrorKind, retryable: bool) -> Self {
        self.insert(code.into(), TableEntry::new(kind, retryable))
    }

    /// Add an entry that keeps the kind's default retryability.
    pub fn kind(self, code: impl Into<ErrorCode>, kind: ErrorKind) -> Self {
        self.insert(code.into(), TableEntry::of_kind(kind))
    }

    /// Map the common transport failure codes to retryable `Network` errors.
    pub fn with_network_defaults(self) -> Self {
        NETWORK_CODES
            .iter()
            .fold(self, |builder, code| builder.entry(*code, ErrorKind::Network, true))
    }

    fn insert(mut self, code: ErrorCode, entry: TableEntry) -> Self {
        let key = code.key();
        if self.entries.insert(key.clone(), entry).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(key);
        }
        self
    }

    /// Finish the table, failing on the first duplicated code.
    pub fn build(self) -> Result<ClassificationTable, TableError> {
        match self.duplicate {
            Some(code) => Err(TableError::DuplicateCode(code)),
            None => Ok(ClassificationTable {
                entries: self.entries,
            }),
        }
    }
}
