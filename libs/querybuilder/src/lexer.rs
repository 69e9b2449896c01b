//! Filter lexer - splits filter text into operands and clauses
//!
//! The filter DSL is small enough that it is never tokenized into a stream.
//! Instead the lexer answers two questions over the raw text:
//!
//! 1. Where are the top-level ` and ` / ` or ` keywords? Keywords nested in
//!    parentheses or inside quoted values do not count.
//! 2. Which comparison operator does a single clause use, and what are the
//!    field and value around it?

use crate::token::{LogicalOperator, Operator};
use tracing::trace;

/// A single `field op value` comparison, borrowed from the filter text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause<'a> {
    pub field: &'a str,
    pub operator: Operator,
    pub value: &'a str,
}

/// Split `input` around every top-level occurrence of the logical keyword.
///
/// The keyword matches case-insensitively and must be surrounded by single
/// spaces. Each returned part is trimmed. Input without a top-level keyword
/// yields a single part. A quote with no matching closer is an ordinary
/// character, so `action = it's and dstport = 22` still splits in two.
pub fn split_on_logical(input: &str, op: LogicalOperator) -> Vec<&str> {
    let needle = format!(" {} ", op.keyword());
    let needle = needle.as_bytes();
    let bytes = input.as_bytes();

    let quoted = quoted_mask(input);

    let mut parts = Vec::new();
    let mut depth: i32 = 0;
    let mut last_split = 0;
    let mut i = 0;

    while i < bytes.len() {
        if quoted[i] {
            i += 1;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => depth -= 1,
            _ => {}
        }

        if depth == 0
            && i + needle.len() <= bytes.len()
            && bytes[i..i + needle.len()].eq_ignore_ascii_case(needle)
        {
            parts.push(input[last_split..i].trim());
            last_split = i + needle.len();
            i = last_split;
            continue;
        }
        i += 1;
    }
    parts.push(input[last_split..].trim());

    trace!(operator = op.keyword(), parts = parts.len(), "split filter operands");
    parts
}

/// Locate the comparison operator of a clause.
///
/// Operators surrounded by spaces win; only when none is present does the
/// scan fall back to bare operators (`srcport=443`). Within each pass the
/// candidates are tried in [`Operator::SCAN_ORDER`]. Operators inside quoted
/// values are ignored.
///
/// Returns `None` when the clause contains no operator at all.
pub fn split_clause(clause: &str) -> Option<Clause<'_>> {
    let lower = clause.to_ascii_lowercase();
    let quoted = quoted_mask(clause);

    for op in Operator::SCAN_ORDER {
        let spaced = format!(" {} ", op.as_str());
        if let Some(idx) = find_unquoted(&lower, &spaced, &quoted) {
            return Some(make_clause(clause, idx, idx + spaced.len(), op));
        }
    }

    for op in Operator::SCAN_ORDER {
        if let Some(idx) = find_unquoted(&lower, op.as_str(), &quoted) {
            return Some(make_clause(clause, idx, idx + op.as_str().len(), op));
        }
    }

    None
}

/// Remove any run of surrounding single or double quotes from a value.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches(|c| c == '\'' || c == '"')
}

fn make_clause(clause: &str, op_start: usize, op_end: usize, operator: Operator) -> Clause<'_> {
    Clause {
        field: clause[..op_start].trim(),
        operator,
        value: strip_quotes(clause[op_end..].trim()),
    }
}

fn find_unquoted(haystack: &str, needle: &str, quoted: &[bool]) -> Option<usize> {
    haystack
        .match_indices(needle)
        .map(|(idx, _)| idx)
        .find(|&idx| !quoted[idx])
}

/// Per-byte flag: true when the byte lies inside a quoted region (the quote
/// characters themselves included).
///
/// A quote only opens a region when the same quote character appears again
/// later in the input. An unmatched quote is left unflagged.
pub(crate) fn quoted_mask(input: &str) -> Vec<bool> {
    let bytes = input.as_bytes();
    let mut mask = vec![false; bytes.len()];
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\'' || b == b'"' {
            if let Some(offset) = bytes[i + 1..].iter().position(|&c| c == b) {
                let end = i + 1 + offset;
                mask[i..=end].fill(true);
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_parentheses() {
        let parts = split_on_logical("a = 1 and (b = 2 and c = 3)", LogicalOperator::And);
        assert_eq!(parts, vec!["a = 1", "(b = 2 and c = 3)"]);
    }

    #[test]
    fn test_split_is_case_insensitive() {
        let parts = split_on_logical("a = 1 OR b = 2", LogicalOperator::Or);
        assert_eq!(parts, vec!["a = 1", "b = 2"]);
    }

    #[test]
    fn test_split_ignores_quoted_keywords() {
        let parts = split_on_logical("action = 'a and b' and c = 1", LogicalOperator::And);
        assert_eq!(parts, vec!["action = 'a and b'", "c = 1"]);
    }

    #[test]
    fn test_unmatched_quote_is_literal() {
        let parts = split_on_logical("action = it's and dstport = 22", LogicalOperator::And);
        assert_eq!(parts, vec!["action = it's", "dstport = 22"]);

        let mask = quoted_mask("a = 'x' and b = o'brien");
        assert!(mask[4] && mask[6]);
        assert!(!mask[17]);
    }

    #[test]
    fn test_keyword_inside_identifier_does_not_split() {
        let parts = split_on_logical("brand = x", LogicalOperator::And);
        assert_eq!(parts, vec!["brand = x"]);
    }

    #[test]
    fn test_spaced_operator_preferred() {
        let clause = split_clause("a!=b = c").unwrap();
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.field, "a!=b");
        assert_eq!(clause.value, "c");
    }

    #[test]
    fn test_longest_match_first() {
        let clause = split_clause("bytes >= 10").unwrap();
        assert_eq!(clause.operator, Operator::Gte);
        assert_eq!(clause.value, "10");
    }

    #[test]
    fn test_operator_inside_quotes_is_skipped() {
        let clause = split_clause("action = 'x > y'").unwrap();
        assert_eq!(clause.operator, Operator::Eq);
        assert_eq!(clause.value, "x > y");
    }

    #[test]
    fn test_no_operator() {
        assert!(split_clause("srcaddr").is_none());
    }
}
