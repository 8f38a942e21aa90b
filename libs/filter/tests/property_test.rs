//! Property-based tests using QuickCheck

use aip_filter::{format_duration, parse_duration, Lexer, Quoting, TokenKind};
use chrono::TimeDelta;
use quickcheck::{Arbitrary, Gen, QuickCheck, TestResult};

mod test_support;

const FIELDS: &[&str] = &["a", "title", "i32", "labels.env", "author.name", "x.y.z"];
const VALUES: &[&str] = &[
    "b",
    "\"two words\"",
    "'single'",
    "\"esc\\\"aped\"",
    "42",
    "-3",
    "1.5",
    "2.5e3",
    "0x1F",
    "017",
    "2024-01-01T00:00:00Z",
    "1h30m",
    "true",
    "null",
];
const COMPARATORS: &[&str] = &["=", "!=", "<", "<=", ">", ">=", ":"];
const SPACES: &[&str] = &[" ", "  ", "\t", "\n "];

/// A syntactically valid filter built from a small grammar.
#[derive(Debug, Clone)]
struct Filter(String);

fn pick<'a>(g: &mut Gen, items: &[&'a str]) -> &'a str {
    g.choose(items).copied().unwrap_or(items[0])
}

fn restriction(g: &mut Gen) -> String {
    match usize::arbitrary(g) % 5 {
        0 => pick(g, FIELDS).to_string(),
        1 => format!("f({}, {})", pick(g, FIELDS), pick(g, VALUES)),
        2 => format!("{} IN [{}, {}]", pick(g, FIELDS), pick(g, VALUES), pick(g, VALUES)),
        _ => {
            let comparator = pick(g, COMPARATORS);
            let space = if comparator == ":" { "" } else { " " };
            format!("{}{space}{comparator}{space}{}", pick(g, FIELDS), pick(g, VALUES))
        }
    }
}

fn term(g: &mut Gen, depth: usize) -> String {
    let simple = if depth > 0 && bool::arbitrary(g) {
        format!("({})", expression(g, depth - 1))
    } else {
        restriction(g)
    };
    match usize::arbitrary(g) % 4 {
        0 => format!("NOT{}{simple}", pick(g, SPACES)),
        1 => format!("-{simple}"),
        _ => simple,
    }
}

fn expression(g: &mut Gen, depth: usize) -> String {
    let mut out = term(g, depth);
    for _ in 0..usize::arbitrary(g) % 3 {
        let joiner = match usize::arbitrary(g) % 3 {
            0 => format!("{}AND{}", pick(g, SPACES), pick(g, SPACES)),
            1 => format!("{}OR{}", pick(g, SPACES), pick(g, SPACES)),
            _ => pick(g, SPACES).to_string(),
        };
        out.push_str(&joiner);
        out.push_str(&term(g, depth));
    }
    out
}

impl Arbitrary for Filter {
    fn arbitrary(g: &mut Gen) -> Self {
        Filter(expression(g, 2))
    }
}

/// Property: the lexer never loses or invents input
#[test]
fn prop_tokens_cover_input() {
    fn prop(input: String) -> TestResult {
        let tokens = Lexer::new(&input).tokenize();
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        let contiguous = tokens.windows(2).all(|w| w[0].end() == w[1].pos.offset);
        let ends = tokens
            .last()
            .is_some_and(|t| t.kind == TokenKind::Eof && t.pos.offset == input.len());
        TestResult::from_bool(joined == input && contiguous && ends)
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(String) -> TestResult);
}

/// Property: parsing arbitrary text returns, it never panics
#[test]
fn prop_parse_total() {
    fn prop(input: String) -> TestResult {
        let lenient = test_support::parse(&input);
        let strict = aip_filter::parse_with_options(
            &input,
            aip_filter::ParserOptions::all_extensions().strict(),
        );
        // Strict mode only rejects more.
        TestResult::from_bool(!(lenient.is_err() && strict.is_ok()))
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(String) -> TestResult);
}

/// Property: generated filters parse, and rendering is a fixed point
#[test]
fn prop_render_round_trip() {
    fn prop(filter: Filter) -> TestResult {
        let Ok(tree) = test_support::parse(&filter.0) else {
            return TestResult::error(format!("generated filter failed to parse: {}", filter.0));
        };
        let rendered = tree.to_string();
        let Ok(again) = test_support::parse(&rendered) else {
            return TestResult::error(format!("rendered filter failed to parse: {rendered}"));
        };
        TestResult::from_bool(again.to_string() == rendered)
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(Filter) -> TestResult);
}

/// Property: leaves come out in source order
#[test]
fn prop_leaves_in_source_order() {
    fn prop(filter: Filter) -> TestResult {
        let Ok(tree) = test_support::parse(&filter.0) else {
            return TestResult::discard();
        };
        let leaves = tree.leaves();
        let ordered = leaves
            .windows(2)
            .all(|w| w[0].end() <= w[1].pos().offset);
        let inside = leaves.iter().all(|leaf| leaf.end() <= filter.0.len());
        TestResult::from_bool(ordered && inside && !tree.unquoted().is_empty())
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Filter) -> TestResult);
}

/// Property: resolution of any parsed filter returns without panicking, and the
/// reported complexity matches the expression
#[test]
fn prop_resolve_total() {
    fn prop(filter: Filter) -> TestResult {
        let Ok(tree) = test_support::parse(&filter.0) else {
            return TestResult::discard();
        };
        let resolver = aip_filter::Resolver::new(test_support::record());
        match resolver.resolve(&tree) {
            Ok(resolved) => TestResult::from_bool(
                resolved.expr.as_ref().map_or(0, |e| e.complexity()) == resolved.complexity,
            ),
            Err(e) => TestResult::from_bool(e.position().is_some()),
        }
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Filter) -> TestResult);
}

/// Property: quoted and unquoted renderings agree outside string literals
#[test]
fn prop_unquoted_rendering_without_strings() {
    fn prop(filter: Filter) -> TestResult {
        if filter.0.contains(['"', '\'']) {
            return TestResult::discard();
        }
        let Ok(tree) = test_support::parse(&filter.0) else {
            return TestResult::discard();
        };
        TestResult::from_bool(tree.render(Quoting::Unquoted) == tree.render(Quoting::Quoted))
    }

    QuickCheck::new()
        .tests(100)
        .quickcheck(prop as fn(Filter) -> TestResult);
}

/// Property: formatted durations parse back to the same value
#[test]
fn prop_duration_format_round_trip() {
    fn prop(seconds: i32, nanos: u32) -> TestResult {
        let Some(duration) = TimeDelta::new(seconds as i64, nanos % 1_000_000_000) else {
            return TestResult::discard();
        };
        let text = format_duration(&duration);
        TestResult::from_bool(parse_duration(&text) == Some(duration))
    }

    QuickCheck::new()
        .tests(200)
        .quickcheck(prop as fn(i32, u32) -> TestResult);
}
