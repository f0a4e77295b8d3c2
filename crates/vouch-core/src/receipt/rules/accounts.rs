//! Masked account numbers and their assignment to destination / origin.

use regex::Regex;

use super::patterns::{DESTINATION_ANCHOR, MASKED_BLOCK, MASKED_NUMBER, ORIGIN_ANCHOR};
use super::text::{clean_holder_name, holder_capture};
use super::ExtractionMatch;

/// Every masked account number (`****1234`) in the text, in document order.
pub fn find_masked_numbers(text: &str) -> Vec<ExtractionMatch<String>> {
    MASKED_NUMBER
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(
                ExtractionMatch::new(caps[1].to_string(), whole.as_str())
                    .with_position(whole.start(), whole.end()),
            )
        })
        .collect()
}

/// Every masked account number immediately followed by a holder name.
///
/// The holder is cleaned; blocks whose name cleans away keep `None`.
pub fn find_masked_blocks(text: &str) -> Vec<ExtractionMatch<(String, Option<String>)>> {
    MASKED_BLOCK
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let holder = caps.get(2).and_then(|m| clean_holder_name(holder_capture(text, m)));
            let value = (caps[1].to_string(), holder);
            Some(ExtractionMatch::new(value, whole.as_str()).with_position(whole.start(), whole.end()))
        })
        .collect()
}

/// Whether a masked suffix is really the receipt's own year.
///
/// Some layouts print the year right after a masking run, which would
/// otherwise be read as an account suffix. This rule is kept narrow: it only
/// fires when the receipt year is known and equals the four digits exactly.
pub fn is_receipt_year(suffix: &str, receipt_year: Option<i32>) -> bool {
    match receipt_year {
        Some(year) => suffix == format!("{:04}", year),
        None => false,
    }
}

/// Result of the nearest-anchor assignment. Only roles the caller did not
/// already know are filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorAssignment {
    pub destination: Option<String>,
    pub origin: Option<String>,
}

/// Assign masked account numbers to destination and origin by proximity.
///
/// Each role takes the unclaimed occurrence closest (absolute byte distance)
/// to the first occurrence of one of its keywords; ties go to the earlier
/// occurrence. Without a keyword, destination takes the first unclaimed
/// occurrence and origin the first one destination did not take.
/// Destination claims first. With a single occurrence only destination
/// can be filled, whatever keywords are present.
///
/// Suffixes already known from structured extraction claim their occurrence
/// and are not reassigned.
pub fn assign_by_anchor(
    text: &str,
    known_destination: Option<&str>,
    known_origin: Option<&str>,
) -> AnchorAssignment {
    let occurrences = find_masked_numbers(text);
    let mut assignment = AnchorAssignment::default();

    if occurrences.is_empty() {
        return assignment;
    }

    let claimed_by = |known: Option<&str>| {
        known.and_then(|suffix| occurrences.iter().position(|o| o.value == suffix))
    };

    let origin_claim = claimed_by(known_origin);
    let destination_claim = match known_destination {
        Some(_) => claimed_by(known_destination),
        None => {
            let picked = pick_nearest(&occurrences, anchor_position(text, &DESTINATION_ANCHOR), origin_claim);
            if let Some(i) = picked {
                assignment.destination = Some(occurrences[i].value.clone());
            }
            picked
        }
    };

    if known_origin.is_none() && occurrences.len() >= 2 {
        let picked = pick_nearest(&occurrences, anchor_position(text, &ORIGIN_ANCHOR), destination_claim);
        if let Some(i) = picked {
            assignment.origin = Some(occurrences[i].value.clone());
        }
    }

    assignment
}

fn anchor_position(text: &str, anchor: &Regex) -> Option<usize> {
    anchor.find(text).map(|m| m.start())
}

fn pick_nearest(
    occurrences: &[ExtractionMatch<String>],
    anchor: Option<usize>,
    excluded: Option<usize>,
) -> Option<usize> {
    let mut candidates = occurrences
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != excluded);

    match anchor {
        Some(anchor) => candidates
            .min_by_key(|(_, o)| o.start().abs_diff(anchor))
            .map(|(i, _)| i),
        None => candidates.next().map(|(i, _)| i),
    }
}
