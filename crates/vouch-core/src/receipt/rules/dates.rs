//! Date normalization for transfer receipts.

use chrono::{Datelike, NaiveDate};

use super::patterns::{DATE_DAY_MONTH_YEAR, DATE_DMY, DATE_ISO};
use super::text::strip_accents;

/// Normalize a raw date match to ISO `YYYY-MM-DD`.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY` and `D <mes> YYYY` (Spanish month
/// names, any case, accents optional, an optional `de` between parts).
/// Anything else, or an impossible calendar date, yields `None`.
pub fn normalize_date(raw: &str) -> Option<String> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = DATE_ISO.captures(s) {
        return iso_date(parse_num(&caps[1])?, parse_num(&caps[2])?, parse_num(&caps[3])?);
    }

    if let Some(caps) = DATE_DMY.captures(s) {
        return iso_date(parse_num(&caps[3])?, parse_num(&caps[2])?, parse_num(&caps[1])?);
    }

    let folded = strip_accents(s).to_lowercase();
    let caps = DATE_DAY_MONTH_YEAR.captures(&folded)?;
    let month = month_number(&caps[2])?;

    iso_date(parse_num(&caps[3])?, month, parse_num(&caps[1])?)
}

/// Map a Spanish month name to its number.
///
/// Both `septiembre` and the regional `setiembre` map to 9.
pub fn month_number(name: &str) -> Option<u32> {
    let month = match strip_accents(name.trim()).to_uppercase().as_str() {
        "ENERO" => 1,
        "FEBRERO" => 2,
        "MARZO" => 3,
        "ABRIL" => 4,
        "MAYO" => 5,
        "JUNIO" => 6,
        "JULIO" => 7,
        "AGOSTO" => 8,
        "SEPTIEMBRE" | "SETIEMBRE" => 9,
        "OCTUBRE" => 10,
        "NOVIEMBRE" => 11,
        "DICIEMBRE" => 12,
        _ => return None,
    };
    Some(month)
}

/// Build an ISO date string, rejecting impossible dates.
pub fn iso_date(year: u32, month: u32, day: u32) -> Option<String> {
    let date = NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Year of an ISO date string.
pub fn year_of(iso: &str) -> Option<i32> {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").ok().map(|d| d.year())
}

fn parse_num(s: &str) -> Option<u32> {
    s.parse().ok()
}
