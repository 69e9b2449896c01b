//! Fuzzing tests to ensure the parser and builder handle malformed input gracefully

use fli_querybuilder::options::{with_fields, with_group_by};
use fli_querybuilder::{parse_filter, parse_filter_with_schema, Builder, Error, VpcFlowLogsSchema};
use std::sync::Arc;

/// Test that malformed filters don't panic
#[test]
fn test_malformed_filters_no_panic() {
    let malformed = vec![
        "(",                       // Unclosed paren
        ")",                       // Unmatched closing paren
        "()",                      // Empty group
        "(()())",                  // Nested empty groups
        "'",                       // Unterminated quote
        "srcaddr = '10.0.0.1",     // Unterminated value
        "=",                       // Just operator
        "= =",                     // Only operators
        "and",                     // Bare keyword
        " and ",                   // Keyword with no operands
        "a = 1 and",               // Trailing keyword
        "or a = 1",                // Leading keyword
        "a = 1 and and b = 2",     // Doubled keyword
        "srcaddr = /",             // Slash only
        "srcaddr = 10.0.0.0/",     // Missing prefix length
        "srcaddr = /24",           // Missing address
        "srcport = 1e9",           // Float port
        "bytes > --1",             // Double sign
        "protocol = ",             // Missing value
        "(a = 1))",                // Extra closing paren
        "((a = 1)",                // Extra opening paren
        "a = 1) or (b = 2",        // Inverted parens
    ];

    for filter in malformed {
        // Should return a result, not panic
        let result = parse_filter(filter);
        assert!(
            result.is_err() || result.is_ok(),
            "Filter '{}' should not panic",
            filter
        );
    }
}

/// Test that very long filters are handled
#[test]
fn test_very_long_filters() {
    let clauses: Vec<String> = (0..2000).map(|i| format!("dstport = {}", i % 65536)).collect();
    let filter = clauses.join(" or ");
    let expr = parse_filter(&filter).unwrap().unwrap();
    assert_eq!(expr.fields().len(), 2000);
}

/// Test that deep nesting fails cleanly instead of overflowing the stack
#[test]
fn test_deep_nesting() {
    let filter = format!("{}dstport = 1{}", "(".repeat(10_000), ")".repeat(10_000));
    assert!(matches!(
        parse_filter(&filter),
        Err(Error::TooDeeplyNested(_))
    ));
}

/// Test random character sequences
#[test]
fn test_random_characters() {
    let random_strings = vec![
        "!@#$%^&*()",
        "abcdefghijklmnopqrstuvwxyz",
        "1234567890",
        "αβγδε = ζ",       // Greek letters
        "中文 like 字",    // Chinese characters
        "\x00\x01\x02",    // Control characters
        "srcaddr = 🦀",    // Emoji value
        "🦀 != 🦀",        // Emoji field
    ];

    for s in random_strings {
        let result = parse_filter(s);
        assert!(result.is_ok() || result.is_err());
    }
}

/// Test filters with unusual whitespace
#[test]
fn test_unusual_whitespace() {
    let filters = vec![
        "dstport\t=\t22",        // Tabs
        "  dstport = 22  ",      // Leading/trailing spaces
        "dstport=22",            // No spaces
        "dstport   =    22",     // Multiple spaces
    ];

    for filter in filters {
        let result = parse_filter(filter);
        // Should parse to the same clause
        assert!(result.is_ok(), "Filter {:?} failed: {:?}", filter, result);
    }
}

/// Test that multi-byte characters next to operators don't split a character
#[test]
fn test_unicode_around_operators() {
    let schema = VpcFlowLogsSchema::new();
    let filters = vec![
        "é=é",
        "action = 'é and é'",
        "ü like 'ö'",
        "duration>é",
        "(é = 1) or (ß = 2)",
    ];

    for filter in filters {
        let result = parse_filter_with_schema(filter, &schema);
        assert!(result.is_ok() || result.is_err());
    }
}

/// Test that builder options with odd field names fail cleanly
#[test]
fn test_odd_builder_fields() {
    let odd = vec!["", " ", "*", "end - start", "'srcaddr'", "srcaddr,dstaddr", "🦀"];

    for field in odd {
        let result = Builder::new(
            Arc::new(VpcFlowLogsSchema::new()),
            [with_fields([field]), with_group_by([field])],
        );
        if let Ok(builder) = result {
            let _ = builder.to_string();
        }
    }
}
