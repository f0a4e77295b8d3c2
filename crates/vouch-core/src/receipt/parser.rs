//! Parse orchestrator: raw transcript in, `ParseOutput` out.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, trace};

use crate::error::RulesError;
use crate::models::receipt::{ParseOutput, ParsedField, EXTRA_ORIGIN_HOLDER, EXTRA_ORIGIN_SUFFIX};
use crate::models::transfer::Extras;
use crate::ocr::OcrText;

use super::rules::{
    bbva, detect_bank, generic, normalize_amount, normalize_date, normalize_text, normalize_time, AccountHit, Bank,
    BankRules, ConfidenceScorer, Extraction, ExtractionPath, RuleTable,
};

/// Bank label reported when no issuer keyword matched.
const GENERIC_BANK_LABEL: &str = "GENERIC";

/// How fields are pulled out of one receipt.
///
/// The set of issuers is closed, so dispatch is a plain match.
#[derive(Debug, Clone, Copy)]
pub enum BankStrategy<'a> {
    /// Hand-tuned BBVA extractor.
    Bbva,
    /// Rule table entry for a detected bank, or the generic entry.
    RuleTable { bank: Option<Bank>, rules: &'a BankRules },
}

impl<'a> BankStrategy<'a> {
    /// Pick the strategy for a detected bank.
    pub fn select(bank: Option<Bank>, table: &'a RuleTable) -> Self {
        match bank {
            Some(Bank::Bbva) => BankStrategy::Bbva,
            Some(bank) => BankStrategy::RuleTable {
                bank: Some(bank),
                rules: table.rules_for(bank.rule_key()),
            },
            None => BankStrategy::RuleTable {
                bank: None,
                rules: table.generic(),
            },
        }
    }

    pub fn path(&self) -> ExtractionPath {
        match self {
            BankStrategy::Bbva => ExtractionPath::BankSpecific,
            BankStrategy::RuleTable { .. } => ExtractionPath::RuleTable,
        }
    }

    pub fn bank(&self) -> Option<Bank> {
        match self {
            BankStrategy::Bbva => Some(Bank::Bbva),
            BankStrategy::RuleTable { bank, .. } => *bank,
        }
    }

    /// Run the extractor over normalized text.
    pub fn extract(&self, text: &str) -> Extraction {
        match self {
            BankStrategy::Bbva => bbva::extract(text),
            BankStrategy::RuleTable { rules, .. } => generic::extract(text, rules),
        }
    }
}

/// Receipt parser over a shared, immutable rule table.
///
/// Parsing never fails: a field that cannot be recovered comes back with
/// no value and its failure score.
#[derive(Debug, Clone)]
pub struct ReceiptParser {
    rules: Arc<RuleTable>,
}

impl ReceiptParser {
    pub fn new(rules: Arc<RuleTable>) -> Self {
        Self { rules }
    }

    /// Parser over the rule table embedded in the crate.
    pub fn with_embedded_rules() -> Result<Self, RulesError> {
        Ok(Self::new(Arc::new(RuleTable::embedded()?)))
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Parse one raw OCR transcript.
    pub fn parse(&self, raw: &str) -> ParseOutput {
        trace!("Raw transcript: {:?}", raw);

        let text = normalize_text(raw);
        let bank = detect_bank(&text);
        let strategy = BankStrategy::select(bank, &self.rules);

        info!(
            "Parsing receipt ({} chars), bank: {}",
            text.len(),
            bank.map(|b| b.name()).unwrap_or(GENERIC_BANK_LABEL)
        );

        let extraction = strategy.extract(&text);
        let output = build_output(&strategy, extraction);

        let missing = output.missing_fields();
        if missing.is_empty() {
            info!("Parsed receipt with every field present");
        } else {
            info!("Parsed receipt, missing: {}", missing.join(", "));
        }

        output
    }

    /// Parse the transcript produced by a text recognizer.
    pub fn parse_ocr(&self, ocr: &OcrText) -> ParseOutput {
        self.parse(&ocr.full_text)
    }
}

fn build_output(strategy: &BankStrategy<'_>, extraction: Extraction) -> ParseOutput {
    let scores = ConfidenceScorer::table(strategy.path());

    let bank = match strategy.bank() {
        Some(bank) => ParsedField::new(Some(bank.name().to_string()), scores.bank.success),
        None => ParsedField::new(Some(GENERIC_BANK_LABEL.to_string()), scores.bank.failure),
    };

    let date = extraction.date.as_deref().and_then(normalize_date);
    let time = extraction.time.as_deref().and_then(normalize_time);
    let amount = extraction.amount.as_deref().and_then(normalize_amount);
    let operation_number = extraction.operation_number.map(|op| op.trim().to_string());

    debug!("Normalized date={:?} time={:?} amount={:?}", date, time, amount);

    let destination_holder_name = extraction.destination.as_ref().and_then(|d| d.holder.clone());
    let origin_holder_name = extraction.origin.as_ref().and_then(|o| o.holder.clone());

    ParseOutput {
        bank,
        date: ConfidenceScorer::field(date, scores.date),
        time: ConfidenceScorer::field(time, scores.time),
        operation_number: ConfidenceScorer::field(operation_number, scores.operation_number),
        beneficiary: ConfidenceScorer::field(extraction.beneficiary, scores.beneficiary),
        destination_account_suffix: account_field(extraction.destination.as_ref()),
        amount: ConfidenceScorer::field(amount, scores.amount),
        extras: origin_extras(extraction.origin.as_ref()),
        destination_holder_name,
        origin_holder_name,
    }
}

fn account_field(hit: Option<&AccountHit>) -> ParsedField<String> {
    match hit {
        Some(hit) => ConfidenceScorer::field(Some(hit.suffix.clone()), ConfidenceScorer::account(hit.path)),
        None => ParsedField::missing(),
    }
}

fn origin_extras(origin: Option<&AccountHit>) -> Extras {
    let mut extras = Extras::new();
    if let Some(origin) = origin {
        extras.insert(EXTRA_ORIGIN_SUFFIX.to_string(), Value::from(origin.suffix.clone()));
        if let Some(holder) = &origin.holder {
            extras.insert(EXTRA_ORIGIN_HOLDER.to_string(), Value::from(holder.clone()));
        }
    }
    extras
}
