//! Rule-table extraction for banks without a hand-tuned extractor.

use tracing::debug;

use super::accounts::assign_by_anchor;
use super::table::{BankRules, FieldPattern};
use super::text::clean_holder_name;
use super::{AccountHit, Extraction, ExtractionPath};

/// Extract every field from normalized text using one bank's rules.
///
/// Destination and origin suffixes come from the explicit single-value
/// patterns first, then from the account blocks. When either is still
/// missing, masked numbers are assigned by proximity to keyword anchors.
pub fn extract(text: &str, rules: &BankRules) -> Extraction {
    let mut destination = account(text, rules.destination_suffix.as_ref(), rules.destination_block.as_ref());
    let mut origin = account(text, rules.origin_suffix.as_ref(), rules.origin_block.as_ref());

    if destination.is_none() || origin.is_none() {
        let known_destination = destination.as_ref().map(|d| d.suffix.as_str());
        let known_origin = origin.as_ref().map(|o| o.suffix.as_str());
        let assignment = assign_by_anchor(text, known_destination, known_origin);

        debug!(
            "Heuristic account assignment: dest={:?} origin={:?}",
            assignment.destination, assignment.origin
        );

        if destination.is_none() {
            destination = assignment.destination.map(heuristic_hit);
        }
        if origin.is_none() {
            origin = assignment.origin.map(heuristic_hit);
        }
    }

    let beneficiary = destination
        .as_ref()
        .and_then(|d| d.holder.clone())
        .or_else(|| {
            rules
                .beneficiary
                .as_ref()
                .and_then(|p| p.first_holder(text))
                .and_then(|raw| clean_holder_name(&raw))
        });

    let extraction = Extraction {
        date: value(text, rules.date.as_ref()),
        time: value(text, rules.time.as_ref()),
        amount: value(text, rules.amount.as_ref()),
        operation_number: value(text, rules.operation_number.as_ref()),
        beneficiary,
        destination,
        origin,
    };

    debug!(
        "Rule extraction: date={:?} time={:?} op={:?} dest={:?} origin={:?} amount={:?}",
        extraction.date,
        extraction.time,
        extraction.operation_number,
        extraction.destination.as_ref().map(|d| &d.suffix),
        extraction.origin.as_ref().map(|o| &o.suffix),
        extraction.amount
    );

    extraction
}

fn value(text: &str, pattern: Option<&FieldPattern>) -> Option<String> {
    pattern
        .and_then(|p| p.first_value(text))
        .map(|m| m.value)
        .filter(|v| !v.is_empty())
}

fn account(text: &str, suffix: Option<&FieldPattern>, block: Option<&FieldPattern>) -> Option<AccountHit> {
    if let Some(suffix) = value(text, suffix) {
        return Some(AccountHit {
            suffix,
            holder: None,
            path: ExtractionPath::RuleTable,
        });
    }

    let found = block?.first_block(text)?;
    let (suffix, holder) = found.value;
    Some(AccountHit {
        suffix,
        holder: holder.as_deref().and_then(clean_holder_name),
        path: ExtractionPath::RuleTable,
    })
}

fn heuristic_hit(suffix: String) -> AccountHit {
    AccountHit {
        suffix,
        holder: None,
        path: ExtractionPath::Heuristic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::rules::{normalize_text, RuleTable};

    fn generic() -> BankRules {
        RuleTable::embedded().unwrap().generic().clone()
    }

    #[test]
    fn test_blocks_pair_suffix_and_holder() {
        let text = normalize_text(
            "Fecha: 05/03/2024 Hora 14:05\nCuenta destino: ****7042 ROSA DIAZ\n\
             Cuenta origen: ****0035 ANA LOPEZ\nNúmero de operación: 00012345 S/ 50.00",
        );
        let extraction = extract(&text, &generic());

        assert_eq!(extraction.date.as_deref(), Some("05/03/2024"));
        assert_eq!(extraction.time.as_deref(), Some("14:05"));
        assert_eq!(extraction.operation_number.as_deref(), Some("00012345"));
        assert_eq!(extraction.amount.as_deref(), Some("S/ 50.00"));

        let destination = extraction.destination.unwrap();
        assert_eq!(destination.suffix, "7042");
        assert_eq!(destination.holder.as_deref(), Some("Rosa Diaz"));
        assert_eq!(destination.path, ExtractionPath::RuleTable);
        assert_eq!(extraction.beneficiary.as_deref(), Some("Rosa Diaz"));

        let origin = extraction.origin.unwrap();
        assert_eq!(origin.suffix, "0035");
        assert_eq!(origin.path, ExtractionPath::RuleTable);
    }

    #[test]
    fn test_heuristic_fills_missing_roles() {
        let text = "Destino ****7042 pago Origen ****0035 Beneficiario: Luis Soto";
        let extraction = extract(text, &generic());

        let destination = extraction.destination.unwrap();
        assert_eq!(destination.suffix, "7042");
        assert_eq!(destination.path, ExtractionPath::Heuristic);
        assert_eq!(extraction.origin.unwrap().suffix, "0035");
        assert_eq!(extraction.beneficiary.as_deref(), Some("Luis Soto"));
    }

    #[test]
    fn test_single_masked_number_is_destination_only() {
        let text = "Cuenta de origen usada ****4455 Yape";
        let extraction = extract(text, &generic());

        assert_eq!(extraction.destination.unwrap().suffix, "4455");
        assert!(extraction.origin.is_none());
    }

    #[test]
    fn test_heuristic_respects_structured_destination() {
        let text = "Cuenta destino: ****7042 ROSA DIAZ y tambien ****0035";
        let extraction = extract(text, &generic());

        let destination = extraction.destination.unwrap();
        assert_eq!(destination.suffix, "7042");
        assert_eq!(destination.path, ExtractionPath::RuleTable);

        let origin = extraction.origin.unwrap();
        assert_eq!(origin.suffix, "0035");
        assert_eq!(origin.path, ExtractionPath::Heuristic);
    }

    #[test]
    fn test_absent_patterns_are_not_found() {
        let extraction = extract("Fecha 2024-01-01", &BankRules::default());
        assert!(extraction.date.is_none());
        assert!(extraction.destination.is_none());
        assert!(extraction.beneficiary.is_none());
    }
}
