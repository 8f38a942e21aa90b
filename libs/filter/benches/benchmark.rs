//! Criterion benchmarks for lexing, parsing and resolving filters

use aip_filter::{Lexer, Parser, ParserOptions, Resolver, SyntaxTree};
use aip_schema::{FieldKind, FieldSpec, MessageSpec, Schema};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;

const SIMPLE: &str = "title = \"Dune\"";
const TYPICAL: &str =
    "author.name = \"Frank Herbert\" AND (rating >= 4.5 OR NOT archived) AND create_time > 2024-01-01T00:00:00Z";
const LARGE_IN: &str = "rating IN [1, 1.5, 2, 2.5, 3, 3.5, 4, 4.5, 5]";

fn create_schema() -> Schema {
    let book = MessageSpec::new("library.Book")
        .field(FieldSpec::new("title", FieldKind::String))
        .field(FieldSpec::new("rating", FieldKind::Double))
        .field(FieldSpec::new("archived", FieldKind::Bool))
        .field(FieldSpec::message("author", "library.Author"))
        .field(FieldSpec::message("create_time", "google.protobuf.Timestamp"));
    let author = MessageSpec::new("library.Author").field(FieldSpec::new("name", FieldKind::String));
    Schema::builder()
        .message(book)
        .message(author)
        .build()
        .unwrap_or_else(|e| panic!("failed to build benchmark schema: {}", e))
}

fn custom_criterion() -> Criterion {
    Criterion::default()
        .sample_size(20) // Reduced from default 100
        .warm_up_time(Duration::from_millis(100)) // Reduced warmup
        .measurement_time(Duration::from_secs(1)) // Reduced measurement time
        .nresamples(1000) // Reduced from default 100000
        .noise_threshold(0.05) // Slightly higher threshold for faster convergence
}

fn parse(input: &str) -> SyntaxTree {
    Parser::with_options(input, ParserOptions::all_extensions())
        .parse()
        .unwrap()
}

fn bench_lexer(c: &mut Criterion) {
    c.bench_function("lex_typical", |b| {
        b.iter(|| Lexer::new(black_box(TYPICAL)).tokenize())
    });
}

fn bench_parser(c: &mut Criterion) {
    c.bench_function("parse_simple", |b| b.iter(|| parse(black_box(SIMPLE))));
    c.bench_function("parse_typical", |b| b.iter(|| parse(black_box(TYPICAL))));
    c.bench_function("parse_large_in", |b| b.iter(|| parse(black_box(LARGE_IN))));

    c.bench_function("parse_typical_reuse", |b| {
        let mut tree = Some(parse(TYPICAL));
        b.iter(|| {
            let reused = Parser::with_options(black_box(TYPICAL), ParserOptions::all_extensions())
                .reuse(tree.take().unwrap_or_default())
                .parse()
                .unwrap();
            tree = Some(reused);
        })
    });
}

fn bench_resolver(c: &mut Criterion) {
    let schema = create_schema();
    let resolver = Resolver::new(schema.message("library.Book").unwrap());
    let simple = parse(SIMPLE);
    let typical = parse(TYPICAL);
    let large_in = parse(LARGE_IN);

    c.bench_function("resolve_simple", |b| {
        b.iter(|| resolver.resolve(black_box(&simple)).unwrap())
    });
    c.bench_function("resolve_typical", |b| {
        b.iter(|| resolver.resolve(black_box(&typical)).unwrap())
    });
    c.bench_function("resolve_large_in", |b| {
        b.iter(|| resolver.resolve(black_box(&large_in)).unwrap())
    });
}

fn bench_end_to_end(c: &mut Criterion) {
    let schema = create_schema();
    let resolver = Resolver::new(schema.message("library.Book").unwrap());

    c.bench_function("parse_and_resolve_typical", |b| {
        b.iter(|| {
            let tree = parse(black_box(TYPICAL));
            resolver.resolve(&tree).unwrap()
        })
    });
}

criterion_group! {
    name = benches;
    config = custom_criterion();
    targets = bench_lexer, bench_parser, bench_resolver, bench_end_to_end
}
criterion_main!(benches);
