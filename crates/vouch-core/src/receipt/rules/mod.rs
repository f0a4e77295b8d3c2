//! Rule-based field extractors for bank transfer receipts.

pub mod accounts;
pub mod amounts;
pub mod bank;
pub mod bbva;
pub mod confidence;
pub mod dates;
pub mod generic;
pub mod patterns;
pub mod table;
pub mod text;
pub mod times;

pub use accounts::{assign_by_anchor, find_masked_numbers, is_receipt_year, AnchorAssignment};
pub use amounts::normalize_amount;
pub use bank::{detect_bank, Bank, DETECTION_ORDER};
pub use confidence::{ConfidenceScorer, FieldScore, ScoreTable};
pub use dates::{month_number, normalize_date};
pub use table::{BankRules, FieldPattern, RuleTable};
pub use text::{clean_holder_name, normalize_text, strip_accents, title_case_words};
pub use times::{normalize_time, to_24_hour};

/// A value found in the receipt text together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte position of the whole match in the searched text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }

    /// Start offset of the match, or 0 when unknown.
    pub fn start(&self) -> usize {
        self.position.map(|(start, _)| start).unwrap_or(0)
    }
}

/// Which path produced a field. Drives the confidence table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// Dedicated hand-tuned extractor for a distinctive issuer layout.
    BankSpecific,
    /// Generic per-bank rule table.
    RuleTable,
    /// Nearest-anchor assignment of masked account numbers.
    Heuristic,
}

/// A masked destination or origin account and the holder printed next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountHit {
    /// Last four digits.
    pub suffix: String,
    /// Holder name, cleaned, when the same match carried one.
    pub holder: Option<String>,
    pub path: ExtractionPath,
}

/// Raw field values recovered by one bank strategy, before normalization.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub date: Option<String>,
    pub time: Option<String>,
    pub amount: Option<String>,
    pub operation_number: Option<String>,
    pub beneficiary: Option<String>,
    pub destination: Option<AccountHit>,
    pub origin: Option<AccountHit>,
}
