//! Form validation and normalization ahead of deduplication.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::models::transfer::{is_canonical_amount, TransferForm};
use crate::receipt::rules::title_case_words;

lazy_static! {
    static ref TIME_24H: Regex = Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap();
    static ref SUFFIX: Regex = Regex::new(r"^\d{4}$").unwrap();
}

/// A user-correctable problem with one form field.
///
/// Fields are checked in a fixed order (date, time, destination suffix,
/// amount, operation number) and only the first failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid or future date {0:?}, expected YYYY-MM-DD")]
    Date(String),

    #[error("Invalid time {0:?}, expected 24-hour HH:MM")]
    Time(String),

    #[error("Destination account suffix {0:?} must be exactly 4 digits")]
    DestinationSuffix(String),

    #[error("Invalid amount {0:?}, expected CUR 999.99")]
    Amount(String),

    #[error("Operation number {0:?} must be 6 to 12 characters")]
    OperationNumber(String),
}

impl ValidationError {
    /// Form field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Date(_) => "fecha",
            ValidationError::Time(_) => "hora",
            ValidationError::DestinationSuffix(_) => "cta_dest_ult4",
            ValidationError::Amount(_) => "importe",
            ValidationError::OperationNumber(_) => "nro_operacion",
        }
    }
}

/// A form that passed validation, with every field in stored form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CleanForm {
    pub date: String,
    pub time: String,
    pub bank: String,
    pub operation_number: Option<String>,
    pub beneficiary: String,
    pub destination_account_suffix: String,
    pub amount: String,
}

/// Validate a submission against `today`, then normalize it.
pub(crate) fn clean_form(form: &TransferForm, today: NaiveDate) -> Result<CleanForm, ValidationError> {
    let date = form.date.trim();
    let valid_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d <= today)
        .unwrap_or(false);
    if !valid_date || date.len() != 10 {
        return Err(ValidationError::Date(form.date.clone()));
    }

    let time = form.time.trim();
    if !TIME_24H.is_match(time) {
        return Err(ValidationError::Time(form.time.clone()));
    }

    let suffix = form.destination_account_suffix.trim();
    if !SUFFIX.is_match(suffix) {
        return Err(ValidationError::DestinationSuffix(form.destination_account_suffix.clone()));
    }

    let amount = form.amount.trim();
    if !is_canonical_amount(amount) {
        return Err(ValidationError::Amount(form.amount.clone()));
    }

    let operation_number = form
        .operation_number
        .as_deref()
        .map(str::trim)
        .filter(|op| !op.is_empty());
    if let Some(op) = operation_number {
        let len = op.chars().count();
        if !(6..=12).contains(&len) {
            return Err(ValidationError::OperationNumber(op.to_string()));
        }
    }

    Ok(CleanForm {
        date: date.to_string(),
        time: time.to_string(),
        bank: normalize_bank(&form.bank),
        operation_number: operation_number.map(str::to_string),
        beneficiary: normalize_beneficiary(&form.beneficiary),
        destination_account_suffix: suffix.to_string(),
        amount: amount.to_string(),
    })
}

/// Trim and upper-case a bank name.
pub fn normalize_bank(bank: &str) -> String {
    bank.trim().to_uppercase()
}

/// Collapse whitespace and title-case each word.
pub fn normalize_beneficiary(name: &str) -> String {
    title_case_words(name)
}
