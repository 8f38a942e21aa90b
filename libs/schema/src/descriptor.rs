//! Descriptor traits and the field kind model
//!
//! The resolver only ever talks to a schema through [`MessageDescriptor`] and
//! [`FieldDescriptor`]. Nested descriptors are handed out as `Arc<dyn ...>` so
//! implementations are free to resolve them lazily (and to describe recursive types).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Scalar/composite kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Enum,
    Message,
    /// Deprecated group encoding; treated like a message.
    Group,
}

impl FieldKind {
    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            FieldKind::Int32
                | FieldKind::Int64
                | FieldKind::Sint32
                | FieldKind::Sint64
                | FieldKind::Sfixed32
                | FieldKind::Sfixed64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            FieldKind::Uint32 | FieldKind::Uint64 | FieldKind::Fixed32 | FieldKind::Fixed64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, FieldKind::Double | FieldKind::Float)
    }

    pub fn is_numeric(self) -> bool {
        self.is_signed_integer() || self.is_unsigned_integer() || self.is_float()
    }

    pub fn is_message(self) -> bool {
        matches!(self, FieldKind::Message | FieldKind::Group)
    }

    /// Storage width in bits for numeric kinds, `None` otherwise.
    pub fn bit_width(self) -> Option<u32> {
        match self {
            FieldKind::Float
            | FieldKind::Int32
            | FieldKind::Uint32
            | FieldKind::Sint32
            | FieldKind::Fixed32
            | FieldKind::Sfixed32 => Some(32),
            FieldKind::Double
            | FieldKind::Int64
            | FieldKind::Uint64
            | FieldKind::Sint64
            | FieldKind::Fixed64
            | FieldKind::Sfixed64 => Some(64),
            _ => None,
        }
    }

    /// Whether values of this kind may be used as map keys.
    pub fn is_valid_map_key(self) -> bool {
        self.is_signed_integer()
            || self.is_unsigned_integer()
            || matches!(self, FieldKind::Bool | FieldKind::String)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::Sint32 => "sint32",
            FieldKind::Sint64 => "sint64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::Sfixed32 => "sfixed32",
            FieldKind::Sfixed64 => "sfixed64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Enum => "enum",
            FieldKind::Message => "message",
            FieldKind::Group => "group",
        };
        f.write_str(name)
    }
}

/// How many values a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
    Map,
}

/// Message types with dedicated literal syntax in filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    Timestamp,
    Duration,
    Struct,
    Value,
}

impl WellKnownType {
    pub const TIMESTAMP: &'static str = "google.protobuf.Timestamp";
    pub const DURATION: &'static str = "google.protobuf.Duration";
    pub const STRUCT: &'static str = "google.protobuf.Struct";
    pub const VALUE: &'static str = "google.protobuf.Value";

    pub fn from_full_name(full_name: &str) -> Option<Self> {
        match full_name {
            Self::TIMESTAMP => Some(WellKnownType::Timestamp),
            Self::DURATION => Some(WellKnownType::Duration),
            Self::STRUCT => Some(WellKnownType::Struct),
            Self::VALUE => Some(WellKnownType::Value),
            _ => None,
        }
    }

    pub fn full_name(self) -> &'static str {
        match self {
            WellKnownType::Timestamp => Self::TIMESTAMP,
            WellKnownType::Duration => Self::DURATION,
            WellKnownType::Struct => Self::STRUCT,
            WellKnownType::Value => Self::VALUE,
        }
    }
}

/// Describes one message (record) type.
pub trait MessageDescriptor: fmt::Debug + Send + Sync {
    /// Fully-qualified, dot separated type name (e.g. `library.v1.Book`).
    fn full_name(&self) -> &str;

    /// Look up a field by its declared name.
    fn field(&self, name: &str) -> Option<Arc<dyn FieldDescriptor>>;

    /// All fields in declaration order.
    fn fields(&self) -> Vec<Arc<dyn FieldDescriptor>>;

    fn well_known(&self) -> Option<WellKnownType> {
        WellKnownType::from_full_name(self.full_name())
    }
}

/// Describes one field of a message.
pub trait FieldDescriptor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn number(&self) -> u32;

    fn kind(&self) -> FieldKind;

    fn cardinality(&self) -> Cardinality;

    /// Whether `null` is an acceptable literal for this field.
    fn is_nullable(&self) -> bool;

    /// Message descriptor for message/group kinds.
    fn message(&self) -> Option<Arc<dyn MessageDescriptor>>;

    /// Key descriptor for map fields.
    fn map_key(&self) -> Option<Arc<dyn FieldDescriptor>>;

    /// Value descriptor for map fields.
    fn map_value(&self) -> Option<Arc<dyn FieldDescriptor>>;

    /// Enum number for a value name, for enum kinds.
    fn enum_value(&self, name: &str) -> Option<i32>;

    /// Cost weight of reading this field; `None` means the caller default.
    fn complexity(&self) -> Option<u32>;

    fn is_repeated(&self) -> bool {
        self.cardinality() == Cardinality::Repeated
    }

    fn is_map(&self) -> bool {
        self.cardinality() == Cardinality::Map
    }

    fn well_known(&self) -> Option<WellKnownType> {
        if !self.kind().is_message() || self.is_map() {
            return None;
        }
        self.message().and_then(|m| m.well_known())
    }
}
