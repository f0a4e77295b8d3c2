//! Amount normalization for transfer receipts.

use super::patterns::{collapse_whitespace, AMOUNT_CANONICAL_LOOSE, CURRENCY_DOLLARS, CURRENCY_SOLES};

/// Normalize a raw amount match to `CUR NNN.NN`.
///
/// `S/` becomes `PEN` and `$` / `US$` become `USD`. Thousands separators
/// (`.`, `,` or a space right before exactly three digits that end the digit
/// run) are dropped, the remaining commas become decimal points, and the
/// fractional part is padded or truncated to two digits.
///
/// ```
/// use vouch_core::receipt::rules::normalize_amount;
///
/// assert_eq!(normalize_amount("S/ 921,88").as_deref(), Some("PEN 921.88"));
/// assert_eq!(normalize_amount("PEN 1000").as_deref(), Some("PEN 1000.00"));
/// ```
pub fn normalize_amount(raw: &str) -> Option<String> {
    let s = raw.trim().replace('\u{00a0}', " ");
    if s.is_empty() {
        return None;
    }

    let s = CURRENCY_SOLES.replace_all(&s, "PEN ");
    let s = CURRENCY_DOLLARS.replace_all(&s, "USD ");
    let s = collapse_whitespace(&s);
    let s = strip_thousands_separators(&s).replace(',', ".");

    let caps = AMOUNT_CANONICAL_LOOSE.captures(&s)?;
    let currency = caps[1].to_uppercase();
    let integer = &caps[2];
    let fraction = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    Some(format!("{} {}.{}", currency, integer, fix_fraction(fraction)))
}

/// Drop `.`, `,` or space separators that sit between a digit and a group
/// of exactly three digits followed by a non-digit or the end of input.
fn strip_thousands_separators(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, '.' | ',' | ' ') && is_group_separator(&chars, i) {
            continue;
        }
        out.push(c);
    }

    out
}

fn is_group_separator(chars: &[char], i: usize) -> bool {
    let preceded_by_digit = i > 0 && chars[i - 1].is_ascii_digit();
    let group = chars.get(i + 1..i + 4);
    let group_is_digits = group.is_some_and(|g| g.iter().all(|c| c.is_ascii_digit()));
    let group_closed = chars.get(i + 4).is_none_or(|c| !c.is_ascii_digit());

    preceded_by_digit && group_is_digits && group_closed
}

fn fix_fraction(fraction: &str) -> String {
    let mut digits: String = fraction.chars().take(2).collect();
    while digits.len() < 2 {
        digits.push('0');
    }
    digits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_amounts() {
        assert_eq!(normalize_amount("PEN 1000"), Some("PEN 1000.00".to_string()));
        assert_eq!(normalize_amount("PEN 12.5"), Some("PEN 12.50".to_string()));
        assert_eq!(normalize_amount("usd 40.00"), Some("USD 40.00".to_string()));
    }

    #[test]
    fn test_currency_markers() {
        assert_eq!(normalize_amount("S/ 921,88"), Some("PEN 921.88".to_string()));
        assert_eq!(normalize_amount("S/. 35.9"), Some("PEN 35.90".to_string()));
        assert_eq!(normalize_amount("S/921.88"), Some("PEN 921.88".to_string()));
        assert_eq!(normalize_amount("US$ 150"), Some("USD 150.00".to_string()));
    }

    #[test]
    fn test_thousands_separators() {
        assert_eq!(normalize_amount("PEN 1,234.5"), Some("PEN 1234.50".to_string()));
        assert_eq!(normalize_amount("S/ 1.234,56"), Some("PEN 1234.56".to_string()));
        assert_eq!(normalize_amount("S/ 12 345.00"), Some("PEN 12345.00".to_string()));
        assert_eq!(normalize_amount("PEN 1.234.567,89"), Some("PEN 1234567.89".to_string()));
    }

    #[test]
    fn test_missing_currency_is_rejected() {
        assert_eq!(normalize_amount("921.88"), None);
        assert_eq!(normalize_amount(""), None);
    }

    #[test]
    fn test_canonical_output_is_stable() {
        let once = normalize_amount("S/ 1.234,5").unwrap();
        assert_eq!(once, "PEN 1234.50");
        assert_eq!(normalize_amount(&once), Some(once));
    }
}
