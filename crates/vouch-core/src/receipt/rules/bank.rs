//! Issuer detection by keyword containment.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::text::strip_accents;

/// Issuers with a known receipt layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Bcp,
    Bbva,
    Interbank,
    Scotiabank,
}

/// Detection priority. Keyword sets overlap, so the first bank in this
/// list whose keywords appear in the text wins.
pub const DETECTION_ORDER: [Bank; 4] = [Bank::Bcp, Bank::Bbva, Bank::Interbank, Bank::Scotiabank];

impl Bank {
    /// Display name, as stored on records.
    pub fn name(&self) -> &'static str {
        match self {
            Bank::Bcp => "BCP",
            Bank::Bbva => "BBVA",
            Bank::Interbank => "INTERBANK",
            Bank::Scotiabank => "SCOTIABANK",
        }
    }

    /// Key of this bank's entry in the rule table.
    pub fn rule_key(&self) -> &'static str {
        match self {
            Bank::Bcp => "bcp",
            Bank::Bbva => "bbva",
            Bank::Interbank => "interbank",
            Bank::Scotiabank => "scotiabank",
        }
    }

    /// Upper-case, accent-free keywords identifying this issuer.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Bank::Bcp => &["BANCO DE CREDITO", "BCP"],
            Bank::Bbva => &["BBVA", "CONSTANCIA DE TRANSFERENCIA", "MONTO TRANSFERIDO"],
            Bank::Interbank => &["INTERBANK"],
            Bank::Scotiabank => &["SCOTIABANK"],
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify normalized receipt text into a known issuer.
///
/// Returns `None` for receipts that match no keyword; callers treat that
/// as the generic layout.
pub fn detect_bank(text: &str) -> Option<Bank> {
    let upper = strip_accents(text).to_uppercase();

    DETECTION_ORDER.into_iter().find(|bank| {
        bank.keywords().iter().any(|keyword| upper.contains(keyword))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_by_keyword() {
        assert_eq!(detect_bank("Transferencia Interbank a terceros"), Some(Bank::Interbank));
        assert_eq!(detect_bank("Banco de Crédito del Perú"), Some(Bank::Bcp));
        assert_eq!(detect_bank("Monto transferido S/ 10.00"), Some(Bank::Bbva));
        assert_eq!(detect_bank("Yape pagaste a Juan"), None);
    }

    #[test]
    fn test_earlier_bank_wins_on_overlap() {
        let text = "Constancia de transferencia BBVA hacia cuenta BCP";
        for _ in 0..10 {
            assert_eq!(detect_bank(text), Some(Bank::Bcp));
        }
        assert_eq!(detect_bank("SCOTIABANK INTERBANK"), Some(Bank::Interbank));
    }

    #[test]
    fn test_rule_keys() {
        for bank in DETECTION_ORDER {
            assert_eq!(bank.rule_key(), bank.name().to_lowercase());
        }
    }
}
