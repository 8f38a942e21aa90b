//! Fuzzing tests to ensure the lexer, parser and resolver handle malformed input gracefully

use aip_filter::{Lexer, Parser, ParserOptions, Resolver, ResolverOptions};
use aip_schema::{FieldKind, FieldSpec, MessageSpec, Schema};

mod test_support;

fn exercise(input: &str) {
    let _ = Lexer::new(input).tokenize();
    for options in [
        ParserOptions::default(),
        ParserOptions::all_extensions(),
        ParserOptions::all_extensions().strict(),
    ] {
        if let Ok(tree) = Parser::with_options(input, options).parse() {
            let _ = tree.to_string();
            let _ = tree.unquoted();
            for indirect in [false, true] {
                let resolver = Resolver::new(test_support::record())
                    .with_options(ResolverOptions::default().allow_indirect(indirect));
                let _ = resolver.resolve(&tree);
            }
        }
    }
}

/// Test that malformed filters don't panic
#[test]
fn test_malformed_filters_no_panic() {
    let malformed = vec![
        "",                 // Empty
        "(",                // Unclosed paren
        ")",                // Unmatched closing paren
        "[",                // Unclosed bracket
        "{",                // Unclosed brace
        "\"",               // Unterminated string
        "'abc",             // Unterminated single quoted string
        "a =",              // Missing argument
        "= a",              // Missing comparable
        "a = = b",          // Double comparator
        "a..b",             // Double dot
        "a.",               // Trailing dot
        ".a",               // Leading dot
        "a AND",            // Dangling AND
        "OR b",             // Leading OR
        "NOT",              // Bare NOT
        "NOT NOT a",        // Double NOT
        "--a",              // Double minus
        "f(",               // Unclosed call
        "f(a,)",            // Trailing comma
        "f()()",            // Double call
        "a IN",             // Dangling IN
        "a IN [1,",         // Unclosed array
        "{a:}",             // Missing struct value
        "{:1}",             // Missing struct key
        "x{a:1}{b:2}",      // Chained structs
        "a ! b",            // Lone bang
        "a <> b",           // Unknown operator
        "1e",               // Truncated exponent
        "0x",               // Empty hex
        "1h1h",             // Repeated unit
        "9999-99-99T99:99:99Z", // Impossible timestamp
        "2024-02-30T00:00:00Z", // Nonexistent day
        "\u{0}",            // NUL
        "a = \u{feff}b",    // BOM inside
    ];

    for input in malformed {
        exercise(input);
    }
}

/// Test that deep nesting is rejected rather than overflowing the stack
#[test]
fn test_deep_nesting() {
    for depth in [50, 199, 200, 201, 5_000] {
        let input = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
        exercise(&input);

        let array = format!("a IN {}1{}", "[".repeat(depth), "]".repeat(depth));
        exercise(&array);

        let calls = format!("{}x{}", "f(".repeat(depth), ")".repeat(depth));
        exercise(&calls);
    }
}

/// Test that long member paths through a self-referencing message hit the depth limit
#[test]
fn test_deep_member_paths() {
    let schema = Schema::builder()
        .message(
            MessageSpec::new("t.Node")
                .field(FieldSpec::message("child", "t.Node"))
                .field(FieldSpec::map(
                    "children",
                    FieldSpec::new("key", FieldKind::String),
                    FieldSpec::message("value", "t.Node"),
                ))
                .field(FieldSpec::new("name", FieldKind::String)),
        )
        .build()
        .unwrap();
    let resolver = Resolver::new(schema.message("t.Node").unwrap());

    let shallow = format!("{}name = x", "child.".repeat(10));
    assert!(resolver.resolve(&test_support::parse(&shallow).unwrap()).is_ok());

    for input in [
        format!("{}name = x", "child.".repeat(5_000)),
        format!("{}name = x", "children.k.".repeat(5_000)),
        format!("name = x AND {}name:y", "child.".repeat(20_000)),
    ] {
        let tree = test_support::parse(&input).unwrap();
        let err = resolver.resolve(&tree).unwrap_err();
        assert!(err.is_value(), "{err:?}");
    }

    let indirect = Resolver::new(schema.message("t.Node").unwrap())
        .with_options(ResolverOptions::default().allow_indirect(true));
    let input = format!("name = {}name", "child.".repeat(5_000));
    let tree = test_support::parse(&input).unwrap();
    assert!(indirect.resolve(&tree).is_err());
}

/// Test that very long flat filters are handled
#[test]
fn test_very_long_filters() {
    let mut input = "a = 1".to_string();
    for i in 0..2_000 {
        input.push_str(if i % 2 == 0 { " AND b = 2" } else { " OR c:x" });
    }
    let tree = test_support::parse(&input).unwrap();
    assert!(test_support::resolve(&input).is_ok());
    assert!(tree.node_count() > 2_000);
}

/// Test random character sequences
#[test]
fn test_random_characters() {
    let random_strings = vec![
        "!@#$%^&*()",
        "~`|\\;",
        "a\u{200b}b",
        "é = ü",
        "日本 = 東京",
        "🙂 AND 🙃",
        "\t\r\n",
        "'\\",
        "\"\\\"",
        "a = 'x' 'y' \"z\"",
        "-",
        "- -",
        "-0x",
        "-1.e5",
        "1.5.5",
        "µs",
        "1µ",
        "NOT(NOT(NOT))",
        "IN IN IN",
        "AND OR NOT IN",
    ];

    for input in random_strings {
        exercise(input);
    }
}
