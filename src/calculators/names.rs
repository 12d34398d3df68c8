//! Shared name-list parsing for the three categories whose input rows carry
//! a free-text "assigned technicians" cell (PBP, Spiff/Bonus, Yard Sign).
//! PBP is the category that needs the full algorithm; the other two reuse
//! it verbatim.

use std::collections::HashSet;

/// Splits a raw "assigned technicians" cell into individual names.
///
/// - A comma present anywhere means the cell is comma-delimited; split on
///   comma and trim each piece.
/// - Otherwise the cell is whitespace-delimited. A single token, or exactly
///   two tokens (a "First Last" pair), is one name. An even number of tokens
///   greater than two is reassembled as consecutive "First Last" pairs. An
///   odd number of tokens greater than one cannot be paired unambiguously;
///   each token is treated as its own name and the second return value is
///   `true` so the caller can log a warning.
///
/// Each name also has any trailing parenthetical (`"(50%)"`) stripped, and
/// the result is deduplicated case-insensitively, keeping first-seen order.
pub fn parse_name_list(raw: &str) -> (Vec<String>, bool) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return (Vec::new(), false);
    }
    if trimmed.contains(',') {
        let names = trimmed.split(',').map(strip_trailing_annotation).filter(|s| !s.is_empty()).collect();
        return (dedup_case_insensitive(names), false);
    }
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();
    let (names, warned): (Vec<String>, bool) = match tokens.len() {
        0 => (Vec::new(), false),
        1 => (vec![strip_trailing_annotation(tokens[0])], false),
        2 => (vec![strip_trailing_annotation(trimmed)], false),
        n if n % 2 == 0 => {
            (tokens.chunks(2).map(|pair| strip_trailing_annotation(&pair.join(" "))).collect(), false)
        }
        _ => (tokens.iter().map(|t| strip_trailing_annotation(t)).collect(), true),
    };
    (dedup_case_insensitive(names), warned)
}

/// Ensures `primary` is present in `names` (matched case-insensitively,
/// trimmed), appending it if not.
pub fn ensure_primary(names: &mut Vec<String>, primary: Option<&str>) {
    let Some(primary) = primary else { return };
    let primary = primary.trim();
    if primary.is_empty() {
        return;
    }
    if !names.iter().any(|n| n.eq_ignore_ascii_case(primary)) {
        names.push(primary.to_string());
    }
}

fn strip_trailing_annotation(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(idx) = trimmed.rfind('(') {
        if trimmed.ends_with(')') {
            return trimmed[..idx].trim().to_string();
        }
    }
    trimmed.to_string()
}

fn dedup_case_insensitive(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for name in names {
        if seen.insert(name.to_lowercase()) {
            out.push(name);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_delimited_splits_on_comma() {
        let (names, warned) = parse_name_list("John Smith, Jane Doe");
        assert_eq!(names, vec!["John Smith", "Jane Doe"]);
        assert!(!warned);
    }

    #[test]
    fn two_space_tokens_are_one_name() {
        let (names, warned) = parse_name_list("John Smith");
        assert_eq!(names, vec!["John Smith"]);
        assert!(!warned);
    }

    #[test]
    fn four_tokens_reassemble_as_two_names() {
        let (names, warned) = parse_name_list("John Smith Jane Doe");
        assert_eq!(names, vec!["John Smith", "Jane Doe"]);
        assert!(!warned);
    }

    #[test]
    fn three_tokens_warn_and_split_per_token() {
        let (names, warned) = parse_name_list("John Smith Jane");
        assert_eq!(names, vec!["John", "Smith", "Jane"]);
        assert!(warned);
    }

    #[test]
    fn strips_trailing_percentage_annotation() {
        let (names, _) = parse_name_list("John Smith (50%), Jane Doe (50%)");
        assert_eq!(names, vec!["John Smith", "Jane Doe"]);
    }

    #[test]
    fn dedups_case_insensitively() {
        let (names, _) = parse_name_list("John Smith, john smith");
        assert_eq!(names, vec!["John Smith"]);
    }
}
