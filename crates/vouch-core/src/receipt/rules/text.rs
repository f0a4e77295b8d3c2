//! Text canonicalization helpers.

use regex::Match;

use super::patterns::{collapse_whitespace, CURRENCY_TAIL, RECEIPT_LABEL};

/// Canonicalize a raw OCR transcript into a single search line.
///
/// Non-breaking spaces and line breaks become spaces, whitespace runs
/// collapse to one space, and the result is trimmed. Never fails.
pub fn normalize_text(raw: &str) -> String {
    let flattened: String = raw
        .chars()
        .map(|c| match c {
            '\u{00a0}' | '\n' | '\r' => ' ',
            other => other,
        })
        .collect();

    collapse_whitespace(&flattened).trim().to_string()
}

/// Remove Spanish diacritics (á → a, ñ → n, ü → u).
pub fn strip_accents(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'Á' | 'À' | 'Ä' | 'Â' => 'A',
            'É' | 'È' | 'Ë' | 'Ê' => 'E',
            'Í' | 'Ì' | 'Ï' | 'Î' => 'I',
            'Ó' | 'Ò' | 'Ö' | 'Ô' => 'O',
            'Ú' | 'Ù' | 'Ü' | 'Û' => 'U',
            'Ñ' => 'N',
            other => other,
        })
        .collect()
}

/// Collapse whitespace and title-case every word ("JUAN  perez" → "Juan Perez").
pub fn title_case_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a greedy holder-name capture into a display name.
///
/// The capture is cut at the first receipt label that follows the name,
/// since a single-line transcript puts the next field right after it.
/// Returns `None` when fewer than three characters remain.
pub fn clean_holder_name(raw: &str) -> Option<String> {
    let mut name = raw.trim();

    if let Some(label) = RECEIPT_LABEL.find(name) {
        name = &name[..label.start()];
    }

    let name = name.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '&' | '\''));
    let name = title_case_words(name);

    if name.chars().count() < 3 {
        None
    } else {
        Some(name)
    }
}

/// Raw holder capture with a swallowed currency marker removed.
///
/// Name classes stop at `/` and `$`, so "Juan Perez S/ 921.88" captures
/// "Juan Perez S". When the capture is directly followed by one of those
/// characters, a trailing lone `S` or `US` belongs to the amount.
pub fn holder_capture<'t>(text: &'t str, holder: Match<'t>) -> &'t str {
    let raw = holder.as_str();
    if !text[holder.end()..].starts_with(['/', '$']) {
        return raw;
    }

    match CURRENCY_TAIL.find(raw) {
        Some(tail) => &raw[..tail.start()],
        None => raw,
    }
}
