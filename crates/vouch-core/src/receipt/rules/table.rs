//! Declarative per-bank rule table.
//!
//! The table maps a bank key (`bcp`, `interbank`, ..., `generic`) to one
//! pattern per logical field. It is loaded once, compiled eagerly so a bad
//! pattern fails at startup, and shared read-only afterwards.

use std::collections::HashMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use tracing::{debug, warn};

use super::text::holder_capture;
use super::ExtractionMatch;
use crate::error::RulesError;

/// The rule asset shipped with the crate.
pub static EMBEDDED_RULES: &str = include_str!("../../../assets/parser_rules.json");

/// Key of the fallback entry used for unknown issuers.
pub const GENERIC_KEY: &str = "generic";

/// A compiled field pattern with a fixed value-selection contract.
///
/// Patterns are matched case-insensitively with Unicode classes. For the
/// first match in the text the value is:
///
/// 1. the last capture group that is non-empty after trimming, scanning from
///    the highest group index down to 1, so alternations whose branches fill
///    different group slots all work;
/// 2. otherwise the whole match.
///
/// The value is always trimmed.
#[derive(Debug, Clone)]
pub struct FieldPattern {
    regex: Regex,
}

impl FieldPattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .unicode(true)
            .build()?;
        Ok(Self { regex })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Value of the first match, following the last-non-empty-group contract.
    pub fn first_value(&self, text: &str) -> Option<ExtractionMatch<String>> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;

        let value = (1..caps.len())
            .rev()
            .filter_map(|i| caps.get(i))
            .map(|m| m.as_str().trim())
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| whole.as_str().trim());

        Some(ExtractionMatch::new(value.to_string(), whole.as_str()).with_position(whole.start(), whole.end()))
    }

    /// Value of the first match, read as a holder name that may run into an
    /// amount's currency marker.
    pub fn first_holder(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let name = (1..caps.len())
            .rev()
            .filter_map(|i| caps.get(i))
            .find(|m| !m.as_str().trim().is_empty())
            .or_else(|| caps.get(0))?;

        Some(holder_capture(text, name).trim().to_string())
    }

    /// First account block: group 1 is the suffix, group 2 (optional) the
    /// holder printed next to it. Both come from the same physical match.
    pub fn first_block(&self, text: &str) -> Option<ExtractionMatch<(String, Option<String>)>> {
        let caps = self.regex.captures(text)?;
        let whole = caps.get(0)?;
        let suffix = caps.get(1)?.as_str().trim().to_string();
        let holder = caps
            .get(2)
            .map(|m| holder_capture(text, m).trim().to_string())
            .filter(|s| !s.is_empty());

        Some(ExtractionMatch::new((suffix, holder), whole.as_str()).with_position(whole.start(), whole.end()))
    }
}

/// Raw rule entry as it appears in the JSON asset.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBankRules {
    fecha: Option<String>,
    hora: Option<String>,
    importe: Option<String>,
    nro_operacion: Option<String>,
    beneficiario: Option<String>,
    cta_destino: Option<String>,
    cta_origen: Option<String>,
    destino_block: Option<String>,
    origen_block: Option<String>,
}

/// Compiled patterns for one bank. Blank or absent patterns are `None`.
#[derive(Debug, Clone, Default)]
pub struct BankRules {
    pub date: Option<FieldPattern>,
    pub time: Option<FieldPattern>,
    pub amount: Option<FieldPattern>,
    pub operation_number: Option<FieldPattern>,
    pub beneficiary: Option<FieldPattern>,
    /// Explicit single-value destination suffix pattern.
    pub destination_suffix: Option<FieldPattern>,
    /// Explicit single-value origin suffix pattern.
    pub origin_suffix: Option<FieldPattern>,
    pub destination_block: Option<FieldPattern>,
    pub origin_block: Option<FieldPattern>,
}

impl BankRules {
    fn compile(bank: &str, raw: RawBankRules) -> Result<Self, RulesError> {
        let field = |name: &'static str, pattern: Option<String>| -> Result<Option<FieldPattern>, RulesError> {
            match pattern {
                Some(p) if !p.trim().is_empty() => FieldPattern::new(&p)
                    .map(Some)
                    .map_err(|source| RulesError::Pattern {
                        bank: bank.to_string(),
                        field: name,
                        source,
                    }),
                _ => Ok(None),
            }
        };

        Ok(Self {
            date: field("fecha", raw.fecha)?,
            time: field("hora", raw.hora)?,
            amount: field("importe", raw.importe)?,
            operation_number: field("nro_operacion", raw.nro_operacion)?,
            beneficiary: field("beneficiario", raw.beneficiario)?,
            destination_suffix: field("cta_destino", raw.cta_destino)?,
            origin_suffix: field("cta_origen", raw.cta_origen)?,
            destination_block: field("destino_block", raw.destino_block)?,
            origin_block: field("origen_block", raw.origen_block)?,
        })
    }
}

/// Immutable table of compiled rules, keyed by lower-case bank key.
#[derive(Debug, Clone)]
pub struct RuleTable {
    banks: HashMap<String, BankRules>,
}

impl RuleTable {
    /// Parse and compile a rule table from JSON.
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let raw: HashMap<String, RawBankRules> = serde_json::from_str(json)?;

        let mut banks = HashMap::with_capacity(raw.len());
        for (key, rules) in raw {
            let key = key.trim().to_lowercase();
            let compiled = BankRules::compile(&key, rules)?;
            banks.insert(key, compiled);
        }

        if !banks.contains_key(GENERIC_KEY) {
            return Err(RulesError::MissingGeneric);
        }

        debug!("Loaded rule table with {} bank entries", banks.len());
        Ok(Self { banks })
    }

    /// Load the rule asset embedded in the crate.
    pub fn embedded() -> Result<Self, RulesError> {
        Self::from_json(EMBEDDED_RULES)
    }

    /// Load a rule table from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, RulesError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Rules for a bank key, falling back to the generic entry.
    pub fn rules_for(&self, key: &str) -> &BankRules {
        if let Some(rules) = self.banks.get(key) {
            return rules;
        }
        if key != GENERIC_KEY {
            warn!("No rules for bank key {:?}, using generic rules", key);
        }
        self.generic()
    }

    pub fn generic(&self) -> &BankRules {
        // `from_json` refuses tables without a generic entry.
        &self.banks[GENERIC_KEY]
    }

    pub fn contains(&self, key: &str) -> bool {
        self.banks.contains_key(key)
    }

    /// Bank keys present in the table, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.banks.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_non_empty_group_wins() {
        let pattern = FieldPattern::new(r"(\d{4}-\d{2}-\d{2})|(\d{2}/\d{2}/\d{4})").unwrap();
        let found = pattern.first_value("Fecha: 17/06/2023").unwrap();
        assert_eq!(found.value, "17/06/2023");

        let found = pattern.first_value("Fecha: 2023-06-17").unwrap();
        assert_eq!(found.value, "2023-06-17");
    }

    #[test]
    fn test_whole_match_without_groups() {
        let pattern = FieldPattern::new(r"\d{1,2}:\d{2}").unwrap();
        let found = pattern.first_value("Hora 19:22 hrs").unwrap();
        assert_eq!(found.value, "19:22");
        assert_eq!(found.position, Some((5, 10)));
    }

    #[test]
    fn test_blank_groups_fall_back_to_whole_match() {
        let pattern = FieldPattern::new(r"op\s*(\s*)\d+").unwrap();
        let found = pattern.first_value("OP 123456").unwrap();
        assert_eq!(found.value, "OP 123456");
    }

    #[test]
    fn test_case_insensitive_unicode() {
        let pattern = FieldPattern::new(r"operación\s*(\d+)").unwrap();
        assert_eq!(pattern.first_value("OPERACIÓN 998877").unwrap().value, "998877");
    }

    #[test]
    fn test_block_pairs_suffix_with_holder() {
        let pattern = FieldPattern::new(r"destino\s*\*+\s*(\d{4})\s*([a-z ]+)").unwrap();
        let found = pattern.first_block("Destino **** 7042 Juan Perez").unwrap();
        assert_eq!(found.value, ("7042".to_string(), Some("Juan Perez".to_string())));
    }

    #[test]
    fn test_holder_stops_before_currency_marker() {
        let pattern = FieldPattern::new(r"beneficiario\s*:?\s*([a-z ]+)").unwrap();
        assert_eq!(
            pattern.first_holder("Beneficiario: Juan Perez S/ 921.88").as_deref(),
            Some("Juan Perez")
        );

        let block = FieldPattern::new(r"destino\s*\*+\s*(\d{4})\s*([a-z ]+)").unwrap();
        let found = block.first_block("Destino **** 7042 Juan Perez US$ 50").unwrap();
        assert_eq!(found.value.1.as_deref(), Some("Juan Perez"));
    }

    #[test]
    fn test_embedded_rules_compile() {
        let table = RuleTable::embedded().unwrap();
        assert!(table.contains("generic"));
        assert!(table.contains("bcp"));
        assert!(table.generic().date.is_some());
    }

    #[test]
    fn test_blank_pattern_is_absent() {
        let table = RuleTable::from_json(r#"{ "generic": { "fecha": "  ", "hora": "\\d{2}:\\d{2}" } }"#).unwrap();
        assert!(table.generic().date.is_none());
        assert!(table.generic().time.is_some());
        assert!(table.generic().amount.is_none());
    }

    #[test]
    fn test_unknown_key_uses_generic() {
        let table = RuleTable::from_json(r#"{ "generic": { "hora": "x" }, "bcp": {} }"#).unwrap();
        assert!(table.rules_for("interbank").time.is_some());
        assert!(table.rules_for("bcp").time.is_none());
        assert_eq!(table.keys(), vec!["bcp", "generic"]);
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let err = RuleTable::from_json(r#"{ "generic": { "importe": "(unclosed" } }"#).unwrap_err();
        assert!(matches!(err, RulesError::Pattern { field: "importe", .. }));
    }

    #[test]
    fn test_missing_generic_is_rejected() {
        let err = RuleTable::from_json(r#"{ "bcp": {} }"#).unwrap_err();
        assert!(matches!(err, RulesError::MissingGeneric));
    }
}
