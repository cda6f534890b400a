//! Query-variant generation for address search.
//!
//! The search provider's text index matches addresses fuzzily, so a single
//! phrasing often misses listings that a slightly different phrasing finds.
//! From one raw address we derive a small, deterministic set of variants
//! and try them in order.

use std::collections::HashSet;

use regex::Regex;

/// Australian state abbreviations recognized for case-variant generation.
const AU_STATE_ABBREVIATIONS: &[&str] = &["QLD", "NSW", "VIC", "SA", "WA", "TAS", "NT", "ACT"];

/// Derives search-query variants from a raw address, in order:
/// the address unchanged; the leading `<digits>/` unit prefix stripped;
/// any 4-digit postcode removed; the leading street number stripped;
/// upper/lower case forms of a recognized state abbreviation.
/// Duplicates and empty strings are discarded preserving first-seen order.
/// Pure and deterministic.
#[must_use]
pub fn query_variants(address: &str) -> Vec<String> {
    let base = collapse_whitespace(address);
    let mut variants = vec![base.clone()];

    // "107/131 Smith St" -> "131 Smith St".
    let unit_re = Regex::new(r"^\d+[A-Za-z]?\s*/\s*").expect("valid regex");
    if unit_re.is_match(&base) {
        variants.push(unit_re.replace(&base, "").into_owned());
    }

    let postcode_re = Regex::new(r"\b\d{4}\b").expect("valid regex");
    if postcode_re.is_match(&base) {
        variants.push(tidy(&postcode_re.replace_all(&base, "")));
    }

    // "131 Smith St" -> "Smith St".
    let street_number_re = Regex::new(r"^\d+[A-Za-z]?[\s,]+").expect("valid regex");
    if street_number_re.is_match(&base) {
        variants.push(street_number_re.replace(&base, "").into_owned());
    }

    for token in base.split_whitespace() {
        let word = token.trim_matches(|c: char| !c.is_alphanumeric());
        if let Some(state) = AU_STATE_ABBREVIATIONS
            .iter()
            .find(|s| word.eq_ignore_ascii_case(s))
        {
            variants.push(with_state_case(&base, state, state));
            variants.push(with_state_case(&base, state, &state.to_lowercase()));
        }
    }

    let mut seen = HashSet::new();
    variants.retain(|v| !v.is_empty() && seen.insert(v.clone()));
    variants
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Recases every whitespace-delimited token equal to `state` (punctuation
/// aside); a state abbreviation embedded in a longer word ("SALT") is
/// left alone.
fn with_state_case(base: &str, state: &str, cased: &str) -> String {
    base.split_whitespace()
        .map(|token| {
            let word = token.trim_matches(|c: char| !c.is_alphanumeric());
            if word.eq_ignore_ascii_case(state) {
                token.replacen(word, cased, 1)
            } else {
                token.to_owned()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans up the hole left by a removed token: collapsed spaces, no
/// dangling separators.
fn tidy(s: &str) -> String {
    collapse_whitespace(s)
        .replace(" ,", ",")
        .trim_matches(|c: char| c == ',' || c.is_whitespace())
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_original_address_first() {
        let variants = query_variants("12 Main St, Springfield QLD 4000");
        assert_eq!(variants[0], "12 Main St, Springfield QLD 4000");
    }

    #[test]
    fn includes_unit_prefix_and_postcode_removals() {
        let variants = query_variants("107/131 Smith St QLD 4000");
        assert!(
            variants.contains(&"131 Smith St QLD 4000".to_owned()),
            "missing unit-stripped variant: {variants:?}"
        );
        assert!(
            variants.contains(&"107/131 Smith St QLD".to_owned()),
            "missing postcode-stripped variant: {variants:?}"
        );
    }

    #[test]
    fn strips_leading_street_number() {
        let variants = query_variants("131 Smith St, Collingwood VIC");
        assert!(
            variants.contains(&"Smith St, Collingwood VIC".to_owned()),
            "missing street-number-stripped variant: {variants:?}"
        );
    }

    #[test]
    fn generates_state_case_variants() {
        let variants = query_variants("12 Main St, Springfield QLD 4000");
        assert!(
            variants.contains(&"12 Main St, Springfield qld 4000".to_owned()),
            "missing lowercase state variant: {variants:?}"
        );
    }

    #[test]
    fn state_recasing_leaves_longer_words_alone() {
        let variants = query_variants("12 SALT St SA");
        assert!(
            variants.contains(&"12 SALT St sa".to_owned()),
            "missing lowercase state variant: {variants:?}"
        );
        assert!(
            variants.iter().all(|v| !v.contains("saLT")),
            "state recasing leaked into another word: {variants:?}"
        );
    }

    #[test]
    fn state_recasing_keeps_adjacent_punctuation() {
        let variants = query_variants("12 Main St, Springfield, QLD, 4000");
        assert!(
            variants.contains(&"12 Main St, Springfield, qld, 4000".to_owned()),
            "punctuation lost around recased state: {variants:?}"
        );
    }

    #[test]
    fn is_deterministic_and_idempotent() {
        let address = "107/131 Smith St QLD 4000";
        assert_eq!(query_variants(address), query_variants(address));
    }

    #[test]
    fn deduplicates_variants() {
        let variants = query_variants("Smith St");
        let mut unique = variants.clone();
        unique.dedup();
        assert_eq!(variants, unique);
        assert_eq!(variants, vec!["Smith St".to_owned()]);
    }

    #[test]
    fn postcode_removal_leaves_no_dangling_separator() {
        let variants = query_variants("12 Main St, Springfield, 4000");
        assert!(
            variants.contains(&"12 Main St, Springfield".to_owned()),
            "dangling separator survived: {variants:?}"
        );
    }

    #[test]
    fn empty_address_yields_no_variants() {
        assert!(query_variants("   ").is_empty());
    }
}
