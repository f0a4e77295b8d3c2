//! Core library for bank transfer receipt processing.
//!
//! This crate provides:
//! - Receipt parsing from OCR transcripts (bank detection, per-bank rule
//!   table, a hand-tuned BBVA extractor, masked-account heuristics)
//! - Field normalization to ISO dates, 24-hour times and `CUR NNN.NN` amounts
//! - A deduplicating ledger of transfer records over pluggable storage

pub mod error;
pub mod ledger;
pub mod models;
pub mod ocr;
pub mod receipt;
pub mod store;

pub use error::{Result, RulesError, StoreError, VouchError};
pub use ledger::{DuplicateMatch, ExportFilter, SubmitOutcome, TransferLedger, ValidationError};
pub use models::config::VouchConfig;
pub use models::receipt::{ParseOutput, ParsedField};
pub use models::transfer::{Amount, Extras, TransferForm, TransferRecord};
pub use ocr::{OcrText, PlainTextRecognizer, TextRecognizer};
pub use receipt::rules::{Bank, RuleTable};
pub use receipt::{BankStrategy, ReceiptParser};
pub use store::{MemoryStore, TransferStore};

#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
