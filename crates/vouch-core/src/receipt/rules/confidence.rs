//! Fixed per-field confidence scores.
//!
//! A score is picked from a table by extraction path and by whether the
//! field came back with a value. Bank name and amount keep a non-zero
//! failure score; account suffixes fail to 0 because a missing account
//! number says nothing.

use crate::models::receipt::ParsedField;

use super::ExtractionPath;

/// Success / failure score pair for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldScore {
    pub success: u8,
    pub failure: u8,
}

impl FieldScore {
    pub const fn new(success: u8, failure: u8) -> Self {
        Self { success, failure }
    }

    pub fn score(&self, present: bool) -> u8 {
        if present { self.success } else { self.failure }
    }
}

/// Scores for every field on one extraction path.
#[derive(Debug, Clone, Copy)]
pub struct ScoreTable {
    pub bank: FieldScore,
    pub date: FieldScore,
    pub time: FieldScore,
    pub operation_number: FieldScore,
    pub beneficiary: FieldScore,
    pub account: FieldScore,
    pub amount: FieldScore,
}

const BANK_SPECIFIC: ScoreTable = ScoreTable {
    bank: FieldScore::new(95, 95),
    date: FieldScore::new(95, 20),
    time: FieldScore::new(95, 20),
    operation_number: FieldScore::new(85, 0),
    beneficiary: FieldScore::new(85, 0),
    account: FieldScore::new(95, 0),
    amount: FieldScore::new(95, 30),
};

const RULE_TABLE: ScoreTable = ScoreTable {
    bank: FieldScore::new(90, 60),
    date: FieldScore::new(90, 20),
    time: FieldScore::new(90, 20),
    operation_number: FieldScore::new(85, 0),
    beneficiary: FieldScore::new(80, 0),
    account: FieldScore::new(90, 0),
    amount: FieldScore::new(90, 30),
};

const HEURISTIC_ACCOUNT: FieldScore = FieldScore::new(70, 0);

/// Maps extraction outcomes to `ParsedField`s.
pub struct ConfidenceScorer;

impl ConfidenceScorer {
    /// Score table for a strategy's own fields.
    pub fn table(path: ExtractionPath) -> &'static ScoreTable {
        match path {
            ExtractionPath::BankSpecific => &BANK_SPECIFIC,
            ExtractionPath::RuleTable | ExtractionPath::Heuristic => &RULE_TABLE,
        }
    }

    /// Score for an account suffix, by the path that found it.
    pub fn account(path: ExtractionPath) -> FieldScore {
        match path {
            ExtractionPath::Heuristic => HEURISTIC_ACCOUNT,
            other => Self::table(other).account,
        }
    }

    /// Wrap a string value; blank strings count as missing.
    pub fn field(value: Option<String>, score: FieldScore) -> ParsedField<String> {
        let value = value.filter(|v| !v.trim().is_empty());
        let confidence = score.score(value.is_some());
        ParsedField::new(value, confidence)
    }
}
