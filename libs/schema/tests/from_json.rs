//! Loading schemas from their JSON description

use aip_schema::{Cardinality, Error, FieldKind, Schema, WellKnownType};

const SHELF: &str = r#"{
  "enums": [
    { "full_name": "shop.Color", "values": [ { "name": "RED", "number": 1 }, { "name": "BLUE", "number": 2 } ] }
  ],
  "messages": [
    {
      "full_name": "shop.Item",
      "fields": [
        { "name": "sku", "kind": "string" },
        { "name": "price", "kind": "double", "complexity": 3 },
        { "name": "color", "kind": "enum", "type_name": "shop.Color" },
        { "name": "sizes", "kind": "int32", "cardinality": "repeated" },
        { "name": "restocked", "kind": "message", "type_name": "google.protobuf.Timestamp", "nullable": true },
        {
          "name": "attrs",
          "kind": "message",
          "cardinality": "map",
          "map_key": { "name": "key", "kind": "string" },
          "map_value": { "name": "value", "kind": "string" }
        }
      ]
    }
  ]
}"#;

#[test]
fn test_load_schema_from_json() {
    let schema = Schema::from_json(SHELF).unwrap();
    let item = schema.message("shop.Item").unwrap();

    let price = item.field("price").unwrap();
    assert_eq!(price.kind(), FieldKind::Double);
    assert_eq!(price.complexity(), Some(3));

    let sizes = item.field("sizes").unwrap();
    assert_eq!(sizes.cardinality(), Cardinality::Repeated);

    let color = item.field("color").unwrap();
    assert_eq!(color.enum_value("BLUE"), Some(2));

    let restocked = item.field("restocked").unwrap();
    assert!(restocked.is_nullable());
    assert_eq!(restocked.well_known(), Some(WellKnownType::Timestamp));

    let attrs = item.field("attrs").unwrap();
    assert!(attrs.is_map());
    assert_eq!(attrs.well_known(), None);
}

#[test]
fn test_invalid_json_is_reported() {
    let err = Schema::from_json("{ \"messages\": 3 }").unwrap_err();
    assert!(matches!(err, Error::JsonError(_)));
}

#[test]
fn test_missing_enum_type_name() {
    let json = r#"{ "messages": [ { "full_name": "a.A", "fields": [ { "name": "e", "kind": "enum" } ] } ] }"#;
    let err = Schema::from_json(json).unwrap_err();
    assert!(matches!(err, Error::MissingTypeName { .. }));
}
