//! Error types for the vouch-core library.

use thiserror::Error;

/// Main error type for the vouch library.
#[derive(Error, Debug)]
pub enum VouchError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text recognition error.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors raised while loading the per-bank rule table.
#[derive(Error, Debug)]
pub enum RulesError {
    /// The rule asset is not valid JSON for the expected schema.
    #[error("failed to parse rule table: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field pattern does not compile.
    #[error("invalid pattern for {bank}.{field}: {source}")]
    Pattern {
        bank: String,
        field: &'static str,
        #[source]
        source: regex::Error,
    },

    /// The table has no `generic` entry to fall back on.
    #[error("rule table has no \"generic\" entry")]
    MissingGeneric,

    /// The rule file could not be read.
    #[error("failed to read rule file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by a persistence collaborator.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record exists for the given id.
    #[error("transfer not found: {0}")]
    NotFound(uuid::Uuid),

    /// Underlying SQLite failure.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A second record would share an existing (bank, operation number) pair.
    #[error("duplicate operation number {operation_number} for bank {bank}")]
    UniqueViolation { bank: String, operation_number: String },

    /// A stored column could not be decoded.
    #[error("corrupt stored value in {column}: {value}")]
    Corrupt { column: &'static str, value: String },

    /// Extras could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The single-writer lock was poisoned by a panicking writer.
    #[error("ledger writer lock poisoned")]
    Poisoned,
}

/// Result type for the vouch library.
pub type Result<T> = std::result::Result<T, VouchError>;
