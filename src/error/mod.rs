//! Error classification module
//!
//! This module maps heterogeneous upstream API failures onto one shared
//! taxonomy with retry semantics. Each integration supplies a data-only
//! [`ClassificationTable`]; a single classifier serves them all.

pub mod classification;
pub mod classifier;
pub mod table;

// Re-export main types for convenient access
pub use classification::{ClassifiedError, ErrorCode, ErrorKind, DEFAULT_MESSAGE};
pub use classifier::{classify, ErrorClassifier};
pub use table::{ClassificationTable, TableBuilder, TableEntry, TableError, NETWORK_CODES};
