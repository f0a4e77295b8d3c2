//! Hand-tuned extractor for BBVA transfer receipts.
//!
//! BBVA receipts have a stable layout ("Sábado, 17 Junio 2023", "07:22 p.m.",
//! "Cuenta de destino: **** 7042 ...") so fixed patterns are used instead of
//! the rule table, and results score higher.

use tracing::debug;

use super::accounts::{find_masked_blocks, is_receipt_year};
use super::dates::{iso_date, month_number, year_of};
use super::patterns::{AMOUNT_SOLES, DATE_WEEKDAY_LONG, DESTINATION_LABELED, OPERATION_NUMBER, ORIGIN_LABELED, TIME_12H};
use super::text::{clean_holder_name, holder_capture};
use super::times::to_24_hour;
use super::{AccountHit, Extraction, ExtractionPath};

/// Extract every field from normalized BBVA receipt text.
pub fn extract(text: &str) -> Extraction {
    let date = extract_date(text);
    let receipt_year = date.as_deref().and_then(year_of);

    let destination = extract_destination(text, receipt_year);
    let origin = extract_origin(text, receipt_year);

    let extraction = Extraction {
        time: extract_time(text),
        amount: extract_amount(text),
        operation_number: OPERATION_NUMBER.captures(text).map(|c| c[1].to_string()),
        beneficiary: destination.as_ref().and_then(|d| d.holder.clone()),
        date,
        destination,
        origin,
    };

    debug!(
        "BBVA extraction: date={:?} time={:?} op={:?} dest={:?} origin={:?} amount={:?}",
        extraction.date,
        extraction.time,
        extraction.operation_number,
        extraction.destination.as_ref().map(|d| &d.suffix),
        extraction.origin.as_ref().map(|o| &o.suffix),
        extraction.amount
    );

    extraction
}

fn extract_date(text: &str) -> Option<String> {
    let caps = DATE_WEEKDAY_LONG.captures(text)?;
    let day: u32 = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year: u32 = caps[3].parse().ok()?;
    iso_date(year, month, day)
}

fn extract_time(text: &str) -> Option<String> {
    let caps = TIME_12H.captures(text)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    let pm = caps[3].eq_ignore_ascii_case("p");

    let hour = to_24_hour(hour, pm);
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

fn extract_amount(text: &str) -> Option<String> {
    AMOUNT_SOLES.captures(text).map(|c| format!("S/ {}", &c[1]))
}

fn extract_destination(text: &str, receipt_year: Option<i32>) -> Option<AccountHit> {
    if let Some(caps) = DESTINATION_LABELED.captures(text) {
        return Some(AccountHit {
            suffix: caps[1].to_string(),
            holder: caps.get(2).and_then(|m| clean_holder_name(holder_capture(text, m))),
            path: ExtractionPath::BankSpecific,
        });
    }

    debug!("BBVA destination label not found, scanning masked blocks");
    unlabeled_blocks(text, receipt_year).into_iter().next()
}

fn extract_origin(text: &str, receipt_year: Option<i32>) -> Option<AccountHit> {
    if let Some(caps) = ORIGIN_LABELED.captures(text) {
        return Some(AccountHit {
            suffix: caps[1].to_string(),
            holder: caps.get(2).and_then(|m| clean_holder_name(holder_capture(text, m))),
            path: ExtractionPath::BankSpecific,
        });
    }

    debug!("BBVA origin label not found, scanning masked blocks");
    unlabeled_blocks(text, receipt_year).into_iter().nth(1)
}

/// Masked blocks in document order, minus any whose suffix is the receipt year.
fn unlabeled_blocks(text: &str, receipt_year: Option<i32>) -> Vec<AccountHit> {
    find_masked_blocks(text)
        .into_iter()
        .filter(|block| !is_receipt_year(&block.value.0, receipt_year))
        .map(|block| {
            let (suffix, holder) = block.value;
            AccountHit {
                suffix,
                holder,
                path: ExtractionPath::BankSpecific,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receipt::rules::normalize_text;

    const RECEIPT: &str = "BBVA\nConstancia de transferencia\nSábado, 17 Junio 2023\n07:22 p.m.\n\
        Monto transferido: S/ 921.88\nCuenta de origen: **** 0035 COMERCIAL ANDINA S.A.C.\n\
        Cuenta de destino: **** 7042 Juan Perez\nNúmero de operación: 123456789";

    #[test]
    fn test_labeled_receipt() {
        let extraction = extract(&normalize_text(RECEIPT));

        assert_eq!(extraction.date.as_deref(), Some("2023-06-17"));
        assert_eq!(extraction.time.as_deref(), Some("19:22"));
        assert_eq!(extraction.operation_number.as_deref(), Some("123456789"));
        assert_eq!(extraction.amount.as_deref(), Some("S/ 921.88"));

        let destination = extraction.destination.unwrap();
        assert_eq!(destination.suffix, "7042");
        assert_eq!(destination.holder.as_deref(), Some("Juan Perez"));
        assert_eq!(extraction.beneficiary.as_deref(), Some("Juan Perez"));

        let origin = extraction.origin.unwrap();
        assert_eq!(origin.suffix, "0035");
        assert_eq!(origin.holder.as_deref(), Some("Comercial Andina S.a.c."));
    }

    #[test]
    fn test_unlabeled_blocks_skip_receipt_year() {
        let text = normalize_text(
            "BBVA Domingo, 3 Setiembre 2023 **** 2023 Pago ****1188 Rosa Diaz ****0035 Hamann SAC",
        );
        let extraction = extract(&text);

        assert_eq!(extraction.date.as_deref(), Some("2023-09-03"));
        assert_eq!(extraction.destination.unwrap().suffix, "1188");
        assert_eq!(extraction.origin.unwrap().suffix, "0035");
    }

    #[test]
    fn test_midnight_and_noon() {
        assert_eq!(extract_time("12:10 a.m."), Some("00:10".to_string()));
        assert_eq!(extract_time("12:10 p. m."), Some("12:10".to_string()));
        assert_eq!(extract_time("sin hora"), None);
    }

    #[test]
    fn test_amount_with_thousands() {
        assert_eq!(extract_amount("Monto transferido S/ 1,234.50"), Some("S/ 1,234.50".to_string()));
    }

    #[test]
    fn test_date_requires_weekday_form() {
        assert_eq!(extract_date("Sábado, 17 Junio 2023"), Some("2023-06-17".to_string()));
        assert_eq!(extract_date("Fecha: 17/06/2023"), None);
        assert_eq!(extract_date("17 de junio de 2023"), None);
    }

    #[test]
    fn test_missing_everything() {
        let extraction = extract("BBVA");
        assert!(extraction.date.is_none());
        assert!(extraction.destination.is_none());
        assert!(extraction.origin.is_none());
        assert!(extraction.amount.is_none());
    }
}
