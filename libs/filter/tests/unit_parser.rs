//! Unit tests for the filter parser

use aip_filter::ast::{Arg, Comparable, Comparator, Leaf, Simple, UnaryOp};
use aip_filter::{Error, Parser, ParserOptions, Quoting, SyntaxTree, TokenKind};

mod test_support;

fn parse(input: &str) -> SyntaxTree {
    test_support::parse(input).unwrap_or_else(|e| panic!("failed to parse {input:?}: {e}"))
}

fn parse_strict(input: &str) -> Result<SyntaxTree, Error> {
    Parser::with_options(input, ParserOptions::all_extensions().strict()).parse()
}

/// (sequences, factors per sequence, terms per factor) shape of the root expression
fn shape(tree: &SyntaxTree) -> Vec<Vec<usize>> {
    let root = &tree[tree.root().unwrap()];
    root.sequences
        .iter()
        .map(|&s| tree[s].factors.iter().map(|&f| tree[f].terms.len()).collect())
        .collect()
}

#[test]
fn test_empty_input() {
    let tree = parse("");
    assert!(tree.is_empty());
    assert_eq!(tree.to_string(), "");

    let tree = parse("   \n ");
    assert!(tree.is_empty());
}

#[test]
fn test_simple_comparison() {
    let tree = parse("a = b");
    assert_eq!(shape(&tree), vec![vec![1]]);

    let root = &tree[tree.root().unwrap()];
    let term = &tree[tree[tree[root.sequences[0]].factors[0]].terms[0]];
    let Simple::Restriction(r) = term.simple else {
        panic!("expected restriction");
    };
    let restriction = &tree[r];
    let comparison = restriction.comparison.as_ref().unwrap();
    assert_eq!(comparison.comparator, Comparator::Equals);
    assert_eq!(comparison.pos.offset, 2);

    let Comparable::Member(left) = restriction.comparable else {
        panic!("expected member");
    };
    assert_eq!(tree[left].value.raw(), "a");
    let Arg::Comparable(Comparable::Member(right)) = comparison.arg else {
        panic!("expected member arg");
    };
    assert_eq!(tree[right].value.raw(), "b");
}

#[test]
fn test_grouping_shape() {
    let tree = parse("(a b) AND c OR d AND (e > f OR g < h)");
    assert_eq!(shape(&tree), vec![vec![1], vec![2], vec![1]]);
    assert_eq!(tree.to_string(), "(a b) AND c OR d AND (e > f OR g < h)");
}

#[test]
fn test_sequence_of_factors() {
    let tree = parse("New York Giants OR Yankees");
    assert_eq!(shape(&tree), vec![vec![1, 1, 2]]);
}

#[test]
fn test_unary_operators() {
    let tree = parse("NOT a -b");
    let root = &tree[tree.root().unwrap()];
    let factors = &tree[root.sequences[0]].factors;
    assert_eq!(tree[tree[factors[0]].terms[0]].unary, Some(UnaryOp::Not));
    assert_eq!(tree[tree[factors[1]].terms[0]].unary, Some(UnaryOp::Minus));
    assert_eq!(tree.to_string(), "NOT a -b");
}

#[test]
fn test_has_operator() {
    let tree = parse("labels.env:prod");
    assert_eq!(tree.to_string(), "labels.env:prod");
    let tree = parse("tags : \"x\"");
    assert_eq!(tree.to_string(), "tags:\"x\"");
}

#[test]
fn test_member_paths() {
    let tree = parse("a.b.c = 1");
    let leaves: Vec<&str> = tree.leaves().into_iter().map(Leaf::raw).collect();
    assert_eq!(leaves, vec!["a", "b", "c", "1"]);
}

#[test]
fn test_functions() {
    let tree = parse("regex(m.key, \"^.*prod.*$\")");
    assert_eq!(tree.to_string(), "regex(m.key,\"^.*prod.*$\")");

    let tree = parse("math.mem() < 1");
    assert_eq!(tree.to_string(), "math.mem() < 1");
}

#[test]
fn test_call_requires_adjacent_paren() {
    let tree = parse("f(x)");
    assert_eq!(shape(&tree), vec![vec![1]]);

    let tree = parse("f (x)");
    assert_eq!(shape(&tree), vec![vec![1, 1]]);
    let root = &tree[tree.root().unwrap()];
    let factors = &tree[root.sequences[0]].factors;
    let first = &tree[tree[factors[0]].terms[0]];
    let Simple::Restriction(r) = first.simple else {
        panic!("expected restriction");
    };
    assert!(matches!(tree[r].comparable, Comparable::Member(_)));
    let second = &tree[tree[factors[1]].terms[0]];
    assert!(matches!(second.simple, Simple::Composite(_)));

    assert_eq!(shape(&parse("a (b OR c)")), vec![vec![1, 1]]);
}

#[test]
fn test_keywords_as_identifiers() {
    assert_eq!(parse("AND = 1").to_string(), "AND = 1");
    assert_eq!(parse("a.OR:x").to_string(), "a.OR:x");
    assert_eq!(parse("f(NOT)").to_string(), "f(NOT)");
    assert_eq!(shape(&parse("x OR")), vec![vec![1, 1]]);
}

#[test]
fn test_in_requires_extension() {
    let tree = parse("i32 IN [42, 43]");
    assert_eq!(tree.to_string(), "i32 IN [42,43]");

    let without = Parser::new("i32 IN x").parse().unwrap();
    assert_eq!(shape(&without), vec![vec![1, 1, 1]]);
}

#[test]
fn test_struct_and_map_literals() {
    let tree = parse("author = test.Author{name: \"Ann\", rating: 4.5}");
    assert_eq!(tree.to_string(), "author = test.Author{name:\"Ann\",rating:4.5}");

    let tree = parse("labels = {env: prod}");
    assert_eq!(tree.to_string(), "labels = {env:prod}");
}

#[test]
fn test_extensions_disabled_by_default() {
    assert!(Parser::new("a = [1]").parse().is_err());
    assert!(Parser::new("a = {b: 1}").parse().is_err());
}

#[test]
fn test_composite_arg() {
    let tree = parse("a = (x OR y)");
    assert_eq!(tree.to_string(), "a = (x OR y)");
}

#[test]
fn test_quoted_and_unquoted_rendering() {
    let tree = parse(r#"title = "it's \"fine\"""#);
    assert_eq!(tree.render(Quoting::Quoted), r#"title = "it's \"fine\"""#);
    assert_eq!(tree.unquoted(), r#"title = it's "fine""#);
}

#[test]
fn test_round_trip() {
    for input in [
        "a = b",
        "a:b c OR d",
        "NOT (a OR b) AND -c",
        "x.y.z >= 2024-01-01T00:00:00Z",
        "d < 1h30m",
        "f(a,g(b)) != \"s\"",
        "k IN [1,2,3]",
        "m = {a:1,b:\"two\"}",
    ] {
        let first = parse(input);
        let rendered = first.to_string();
        let second = parse(&rendered);
        assert_eq!(second.to_string(), rendered, "round trip of {input:?}");
    }
}

#[test]
fn test_spans() {
    let tree = parse("  a = b  ");
    let span = tree.span().unwrap();
    assert_eq!(span.start.offset, 2);
    assert_eq!(span.end, 7);
}

#[test]
fn test_leaf_positions_increase() {
    let tree = parse("(a b) AND c OR d AND (e > f OR g < h) x.y:z");
    let offsets: Vec<usize> = tree.leaves().iter().map(|l| l.pos().offset).collect();
    assert!(offsets.windows(2).all(|w| w[0] < w[1]), "{offsets:?}");
}

#[test]
fn test_literal_kinds_preserved() {
    let tree = parse("a = 0x1F");
    let leaves = tree.leaves();
    assert_eq!(leaves[1].kind(), TokenKind::Hex);
}

#[test]
fn test_syntax_errors() {
    for input in ["(", "a = ", "a AND (b", "a )", "= b", "a = b,", "f(a", "a.", "a = 12abc", "a = (b"] {
        let err = test_support::parse(input).unwrap_err();
        assert!(err.is_syntax(), "{input:?} -> {err:?}");
    }
}

#[test]
fn test_error_positions_and_messages() {
    let (callback, messages) = test_support::recorder();
    let options = ParserOptions::default().with_error_callback(callback);
    let err = Parser::with_options("a AND (b", options).parse().unwrap_err();
    assert_eq!(err.position().map(|p| p.offset), Some(8));

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].1.contains("')'"), "{:?}", messages[0].1);
}

#[test]
fn test_illegal_token_reported_once() {
    let (callback, messages) = test_support::recorder();
    let options = ParserOptions::all_extensions().with_error_callback(callback);
    let err = Parser::with_options("a b 5min", options).parse().unwrap_err();
    assert!(err.is_syntax());
    assert_eq!(messages.lock().unwrap().len(), 1);
}

#[test]
fn test_strict_whitespace() {
    assert!(parse_strict("a = b AND c OR d").is_ok());
    assert!(parse_strict("a b").is_ok());
    assert!(parse_strict("f(a,b)").is_ok());
    assert!(parse_strict("x IN [1,2]").is_ok());

    assert!(parse_strict("a  b").is_err());
    assert!(parse_strict("a  AND b").is_err());
    assert!(parse_strict("a AND  b").is_err());
    assert!(parse_strict("a OR  b").is_err());
    assert!(parse_strict("NOT(a)").is_err());
    assert!(parse_strict("f(a, b)").is_err());
    assert!(parse_strict("x IN [1, 2]").is_err());
    assert!(parse_strict("m = {a: 1}").is_err());
}

#[test]
fn test_lenient_whitespace() {
    let options = ParserOptions::all_extensions();
    let tree = Parser::with_options("a  AND   b OR\tc  f( a , b )", options)
        .parse()
        .unwrap();
    assert_eq!(tree.to_string(), "a AND b OR c f(a,b)");
}

#[test]
fn test_release_and_reuse() {
    let mut tree = parse("a = 1 AND b = 2");
    let root = tree.root().unwrap();
    tree.release();
    tree.release();
    assert!(tree.is_empty());
    assert!(tree.get(root).is_none());
    assert_eq!(tree.node_count(), 0);

    let reused = Parser::new("c").reuse(tree).parse().unwrap();
    assert_eq!(reused.to_string(), "c");
    assert!(reused.get(root).is_none());
}
