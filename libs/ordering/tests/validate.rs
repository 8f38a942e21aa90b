//! Validation of sort clauses against a schema

use std::sync::Arc;

use aip_ordering::{Direction, Error, OrderBy};
use aip_schema::{FieldKind, FieldSpec, MessageDescriptor, MessageSpec, Schema};

fn book() -> Arc<dyn MessageDescriptor> {
    let schema = Schema::builder()
        .message(
            MessageSpec::new("library.Book")
                .field(FieldSpec::new("title", FieldKind::String))
                .field(FieldSpec::new("rating", FieldKind::Double))
                .field(FieldSpec::message("author", "library.Author"))
                .field(FieldSpec::message("editors", "library.Author").repeated())
                .field(FieldSpec::map(
                    "labels",
                    FieldSpec::new("key", FieldKind::String),
                    FieldSpec::new("value", FieldKind::String),
                ))
                .field(FieldSpec::message("create_time", "google.protobuf.Timestamp")),
        )
        .message(
            MessageSpec::new("library.Author")
                .field(FieldSpec::new("name", FieldKind::String))
                .field(FieldSpec::message("mentor", "library.Author")),
        )
        .build()
        .unwrap();
    schema.message("library.Book").unwrap()
}

#[test]
fn test_valid_paths() {
    let book = book();
    for input in [
        "title",
        "rating desc, title",
        "author.name",
        "author.mentor.mentor.name desc",
        "create_time.seconds",
        "",
    ] {
        let order = OrderBy::parse(input).unwrap();
        assert!(order.validate(book.as_ref()).is_ok(), "{input:?}");
    }
}

#[test]
fn test_unknown_fields() {
    let book = book();
    let err = OrderBy::parse("title, pages desc")
        .unwrap()
        .validate(book.as_ref())
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnknownField {
            path: "pages".to_string(),
            message: "library.Book".to_string(),
        }
    );

    let err = OrderBy::parse("author.age")
        .unwrap()
        .validate(book.as_ref())
        .unwrap_err();
    assert_eq!(
        err,
        Error::UnknownField {
            path: "author.age".to_string(),
            message: "library.Author".to_string(),
        }
    );
}

#[test]
fn test_non_traversable_segments() {
    let book = book();
    for (input, segment) in [
        ("title.length", "title"),
        ("editors.name", "editors"),
        ("labels.env", "labels"),
    ] {
        let err = OrderBy::parse(input)
            .unwrap()
            .validate(book.as_ref())
            .unwrap_err();
        assert_eq!(
            err,
            Error::NotTraversable {
                path: input.to_string(),
                segment: segment.to_string(),
            }
        );
    }
}

#[test]
fn test_round_trip_and_serde() {
    let order: OrderBy = "author.name DESC ,rating".parse().unwrap();
    assert_eq!(order.to_string(), "author.name desc, rating");
    assert_eq!(OrderBy::parse(&order.to_string()).unwrap(), order);

    let json = serde_json::to_string(&order).unwrap();
    assert_eq!(
        json,
        r#"{"fields":[{"path":"author.name","direction":"desc"},{"path":"rating","direction":"asc"}]}"#
    );
    let back: OrderBy = serde_json::from_str(r#"{"fields":[{"path":"title"}]}"#).unwrap();
    assert_eq!(back.fields[0].direction, Direction::Asc);
}
