#![allow(dead_code)]

use std::sync::{Arc, Mutex, OnceLock};

use aip_filter::{
    ErrorCallback, ParserOptions, Position, ResolvedFilter, Resolver, ResolverOptions, Result,
    SyntaxTree,
};
use aip_schema::{EnumSpec, FieldKind, FieldSpec, MessageDescriptor, MessageSpec, Schema};

static SCHEMA: OnceLock<Schema> = OnceLock::new();

/// `test.Record` covers every field shape the resolver distinguishes.
pub fn schema() -> &'static Schema {
    SCHEMA.get_or_init(|| {
        let mut record = MessageSpec::new("test.Record");
        for name in ["a", "b", "c", "d", "e", "f", "g", "h", "title"] {
            record = record.field(FieldSpec::new(name, FieldKind::String));
        }
        let record = record
            .field(FieldSpec::new("i32", FieldKind::Int32))
            .field(FieldSpec::new("i64", FieldKind::Int64))
            .field(FieldSpec::new("u32", FieldKind::Uint32))
            .field(FieldSpec::new("u64", FieldKind::Uint64))
            .field(FieldSpec::new("float", FieldKind::Float))
            .field(FieldSpec::new("double", FieldKind::Double))
            .field(FieldSpec::new("archived", FieldKind::Bool))
            .field(FieldSpec::new("maybe", FieldKind::Bool).nullable())
            .field(FieldSpec::new("payload", FieldKind::Bytes))
            .field(FieldSpec::enumeration("status", "test.Status"))
            .field(FieldSpec::message("create_time", "google.protobuf.Timestamp").nullable())
            .field(FieldSpec::message("ttl", "google.protobuf.Duration"))
            .field(FieldSpec::map(
                "labels",
                FieldSpec::new("key", FieldKind::String),
                FieldSpec::new("value", FieldKind::String),
            ))
            .field(FieldSpec::map(
                "counts",
                FieldSpec::new("key", FieldKind::Int32),
                FieldSpec::new("value", FieldKind::Int64),
            ))
            .field(FieldSpec::map(
                "profiles",
                FieldSpec::new("key", FieldKind::String),
                FieldSpec::message("value", "test.Author"),
            ))
            .field(FieldSpec::message("author", "test.Author"))
            .field(FieldSpec::message("authors", "test.Author").repeated())
            .field(FieldSpec::new("tags", FieldKind::String).repeated())
            .field(FieldSpec::message("metadata", "google.protobuf.Struct"))
            .field(FieldSpec::message("extra", "google.protobuf.Value"))
            .field(FieldSpec::new("expensive", FieldKind::String).complexity(10));

        let author = MessageSpec::new("test.Author")
            .field(FieldSpec::new("name", FieldKind::String))
            .field(FieldSpec::new("email", FieldKind::String))
            .field(FieldSpec::new("rating", FieldKind::Double).complexity(2));

        let status = EnumSpec::new("test.Status")
            .value("STATUS_UNSPECIFIED", 0)
            .value("ACTIVE", 1)
            .value("ARCHIVED", 2);

        Schema::builder()
            .message(record)
            .message(author)
            .enumeration(status)
            .build()
            .expect("test schema must build")
    })
}

pub fn record() -> Arc<dyn MessageDescriptor> {
    schema().message("test.Record").expect("test.Record is registered")
}

pub fn parse(input: &str) -> Result<SyntaxTree> {
    aip_filter::parse_with_options(input, ParserOptions::all_extensions())
}

pub fn resolve(input: &str) -> Result<ResolvedFilter> {
    resolve_with(input, ResolverOptions::default())
}

pub fn resolve_with(input: &str, options: ResolverOptions) -> Result<ResolvedFilter> {
    let tree = parse(input)?;
    Resolver::new(record()).with_options(options).resolve(&tree)
}

/// Callback that records every reported message.
pub fn recorder() -> (ErrorCallback, Arc<Mutex<Vec<(Position, String)>>>) {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();
    let callback: ErrorCallback = Arc::new(move |pos, message: &str| {
        sink.lock().unwrap().push((pos, message.to_string()));
    });
    (callback, messages)
}
