//! Typed literal values produced by the resolver.

use aip_schema::{FieldDescriptor, WellKnownType};
use chrono::{DateTime, FixedOffset, TimeDelta};
use std::fmt;

use crate::expr::Expr;
use crate::temporal::format_duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Duration(TimeDelta),
    Enum(i32),
    Message(MessageValue),
}

/// A typed message literal (`pkg.Type{field: value}`).
#[derive(Debug, Clone, PartialEq)]
pub struct MessageValue {
    pub type_name: String,
    pub fields: Vec<(String, Expr)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Int64,
    Uint64,
    Float64,
    String,
    Bytes,
    Timestamp,
    Duration,
    Enum,
    Message,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int64(_) => ValueKind::Int64,
            Value::Uint64(_) => ValueKind::Uint64,
            Value::Float64(_) => ValueKind::Float64,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Duration(_) => ValueKind::Duration,
            Value::Enum(_) => ValueKind::Enum,
            Value::Message(_) => ValueKind::Message,
        }
    }

    /// Whether this value is a legal literal for `field` (element type for
    /// repeated fields, value type for dynamic well-known fields).
    pub fn conforms_to(&self, field: &dyn FieldDescriptor) -> bool {
        if matches!(self, Value::Null) {
            return field.is_nullable() || field.well_known() == Some(WellKnownType::Value);
        }
        match field.well_known() {
            Some(WellKnownType::Timestamp) => return matches!(self, Value::Timestamp(_)),
            Some(WellKnownType::Duration) => return matches!(self, Value::Duration(_)),
            Some(WellKnownType::Value) => {
                return matches!(self, Value::Bool(_) | Value::Float64(_) | Value::String(_))
            }
            Some(WellKnownType::Struct) => return false,
            None => {}
        }

        let kind = field.kind();
        match self {
            Value::Int64(_) => kind.is_signed_integer(),
            Value::Uint64(_) => kind.is_unsigned_integer(),
            Value::Float64(_) => kind.is_float(),
            Value::Bool(_) => kind == aip_schema::FieldKind::Bool,
            Value::String(_) => kind == aip_schema::FieldKind::String,
            Value::Bytes(_) => kind == aip_schema::FieldKind::Bytes,
            Value::Enum(_) => kind == aip_schema::FieldKind::Enum,
            Value::Message(message) => field
                .message()
                .is_some_and(|m| m.full_name() == message.type_name),
            Value::Timestamp(_) | Value::Duration(_) | Value::Null => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int64(n) => write!(f, "{n}"),
            Value::Uint64(n) => write!(f, "{n}"),
            Value::Float64(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Value::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Value::Timestamp(t) => f.write_str(&t.to_rfc3339()),
            Value::Duration(d) => f.write_str(&format_duration(d)),
            Value::Enum(n) => write!(f, "enum({n})"),
            Value::Message(message) => {
                write!(f, "{}{{", message.type_name)?;
                for (i, (name, value)) in message.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}
