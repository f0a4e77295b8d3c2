//! Time normalization for transfer receipts.

use super::patterns::TIME_COMPACT;

/// Normalize a raw time match to zero-padded 24-hour `HH:MM`.
///
/// `a.m.` / `p.m.` spellings are folded to `am` / `pm` by dropping periods
/// and spaces. Without a meridiem the hour is taken as 24-hour already.
pub fn normalize_time(raw: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '.')
        .collect();

    let caps = TIME_COMPACT.captures(&compact)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;

    let hour = match caps.get(3).map(|m| m.as_str()) {
        Some("pm") => to_24_hour(hour, true),
        Some("am") => to_24_hour(hour, false),
        _ => hour,
    };

    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{:02}:{:02}", hour, minute))
}

/// Convert a 12-hour clock hour: `12 am → 0`, `12 pm → 12`, other pm hours `+12`.
pub fn to_24_hour(hour: u32, pm: bool) -> u32 {
    match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meridiem_spellings() {
        assert_eq!(normalize_time("07:22 p.m."), Some("19:22".to_string()));
        assert_eq!(normalize_time("7:22pm"), Some("19:22".to_string()));
        assert_eq!(normalize_time("12:05 a. m."), Some("00:05".to_string()));
        assert_eq!(normalize_time("12:40 PM"), Some("12:40".to_string()));
        assert_eq!(normalize_time("9:03 am"), Some("09:03".to_string()));
    }

    #[test]
    fn test_24_hour_passes_through() {
        assert_eq!(normalize_time("18:45"), Some("18:45".to_string()));
        assert_eq!(normalize_time("6:05"), Some("06:05".to_string()));
    }

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(normalize_time(""), None);
        assert_eq!(normalize_time("25:00"), None);
        assert_eq!(normalize_time("10:75"), None);
        assert_eq!(normalize_time("noon"), None);
    }

    #[test]
    fn test_to_24_hour() {
        assert_eq!(to_24_hour(12, false), 0);
        assert_eq!(to_24_hour(12, true), 12);
        assert_eq!(to_24_hour(1, true), 13);
        assert_eq!(to_24_hour(11, false), 11);
    }
}
