//! Persisted transfer records and the form boundary that produces them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form JSON metadata attached to a transfer.
pub type Extras = serde_json::Map<String, serde_json::Value>;

lazy_static! {
    static ref AMOUNT_CANONICAL: Regex = Regex::new(r"^([A-Z]{3}) (\d+\.\d{2})$").unwrap();
}

/// A stored bank transfer.
///
/// `(bank, operation_number)` is unique whenever `operation_number` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub id: Uuid,

    /// ISO date, `YYYY-MM-DD`.
    pub date: String,

    /// 24-hour time, `HH:MM`.
    pub time: String,

    /// Upper-cased issuer name.
    pub bank: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_number: Option<String>,

    pub beneficiary: String,

    /// Last four digits of the destination account.
    pub destination_account_suffix: String,

    /// Canonical amount, e.g. `PEN 921.88`.
    pub amount: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl TransferRecord {
    /// Split the canonical amount into currency and value.
    pub fn parsed_amount(&self) -> Option<Amount> {
        self.amount.parse().ok()
    }
}

/// Flat form submission accepted by the ledger.
///
/// Field names on the wire follow the receipt vocabulary used by the rule
/// table (`fecha`, `hora`, `banco`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferForm {
    /// `None` creates a record, `Some` updates the record with that id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    #[serde(rename = "fecha")]
    pub date: String,

    #[serde(rename = "hora")]
    pub time: String,

    #[serde(rename = "banco")]
    pub bank: String,

    #[serde(rename = "nro_operacion", default, skip_serializing_if = "Option::is_none")]
    pub operation_number: Option<String>,

    #[serde(rename = "beneficiario")]
    pub beneficiary: String,

    #[serde(rename = "cta_dest_ult4")]
    pub destination_account_suffix: String,

    #[serde(rename = "importe")]
    pub amount: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

/// A canonical `CUR NNN.NN` amount split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub currency: String,
    pub value: Decimal,
}

/// Error returned when a string is not a canonical amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a canonical amount: {0}")]
pub struct AmountParseError(pub String);

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = AMOUNT_CANONICAL
            .captures(s.trim())
            .ok_or_else(|| AmountParseError(s.to_string()))?;
        let value = Decimal::from_str(&caps[2]).map_err(|_| AmountParseError(s.to_string()))?;

        Ok(Self {
            currency: caps[1].to_string(),
            value,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.value)
    }
}

/// Check whether a string is in canonical `CUR NNN.NN` form.
pub fn is_canonical_amount(s: &str) -> bool {
    AMOUNT_CANONICAL.is_match(s.trim())
}
