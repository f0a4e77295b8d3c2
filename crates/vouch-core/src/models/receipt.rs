//! Parse results produced from a single OCR transcript.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::transfer::{Extras, TransferForm};

/// Extras key for the origin account's last four digits.
pub const EXTRA_ORIGIN_SUFFIX: &str = "origin_account_suffix";

/// Extras key for the origin account holder.
pub const EXTRA_ORIGIN_HOLDER: &str = "origin_holder_name";

/// A single extracted value with the score of the path that produced it.
///
/// The confidence is not a probability. It is a fixed integer in `0..=100`
/// picked by which extraction path succeeded, and it is `0` when the field
/// carries no information at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedField<T> {
    pub value: Option<T>,
    pub confidence: u8,
}

impl<T> ParsedField<T> {
    pub fn new(value: Option<T>, confidence: u8) -> Self {
        Self {
            value,
            confidence: confidence.min(100),
        }
    }

    /// A field with no value and zero confidence.
    pub fn missing() -> Self {
        Self {
            value: None,
            confidence: 0,
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for ParsedField<T> {
    fn default() -> Self {
        Self::missing()
    }
}

/// Structured view of one receipt, used to pre-fill an editable form.
///
/// Built once per transcript and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub bank: ParsedField<String>,
    pub date: ParsedField<String>,
    pub time: ParsedField<String>,
    pub operation_number: ParsedField<String>,
    pub beneficiary: ParsedField<String>,
    pub destination_account_suffix: ParsedField<String>,
    pub amount: ParsedField<String>,

    /// Optional origin-account metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extras: Extras,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_holder_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_holder_name: Option<String>,
}

impl ParseOutput {
    pub fn origin_account_suffix(&self) -> Option<&str> {
        self.extras.get(EXTRA_ORIGIN_SUFFIX).and_then(Value::as_str)
    }

    /// Names of the schema fields that came back empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.date.is_present() {
            missing.push("fecha");
        }
        if !self.time.is_present() {
            missing.push("hora");
        }
        if !self.operation_number.is_present() {
            missing.push("nro_operacion");
        }
        if !self.beneficiary.is_present() {
            missing.push("beneficiario");
        }
        if !self.destination_account_suffix.is_present() {
            missing.push("cta_dest_ult4");
        }
        if !self.amount.is_present() {
            missing.push("importe");
        }
        missing
    }

    /// Pre-fill a form submission from this parse.
    ///
    /// Missing values become empty strings so the submission fails validation
    /// on the first absent field instead of being silently accepted.
    pub fn to_form(&self) -> TransferForm {
        let text = |field: &ParsedField<String>| field.value.clone().unwrap_or_default();

        TransferForm {
            id: None,
            date: text(&self.date),
            time: text(&self.time),
            bank: text(&self.bank),
            operation_number: self.operation_number.value.clone(),
            beneficiary: text(&self.beneficiary),
            destination_account_suffix: text(&self.destination_account_suffix),
            amount: text(&self.amount),
            extras: if self.extras.is_empty() {
                None
            } else {
                Some(self.extras.clone())
            },
        }
    }
}
