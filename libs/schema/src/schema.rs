//! In-memory schema registry
//!
//! `Schema` owns a set of message and enum definitions and hands out descriptor
//! handles that implement [`MessageDescriptor`] / [`FieldDescriptor`]. Message
//! references are stored by name and resolved on demand, so recursive and
//! mutually recursive messages need no special treatment.

use crate::descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor, WellKnownType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Declarative definition of a whole schema (the JSON shape of [`Schema::from_json`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSpec {
    #[serde(default)]
    pub messages: Vec<MessageSpec>,
    #[serde(default)]
    pub enums: Vec<EnumSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSpec {
    pub full_name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

impl MessageSpec {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Field number; `0` means "assign from declaration order".
    #[serde(default)]
    pub number: u32,
    pub kind: FieldKind,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub nullable: bool,
    /// Referenced message or enum type for message/group/enum kinds.
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub complexity: Option<u32>,
    #[serde(default)]
    pub map_key: Option<Box<FieldSpec>>,
    #[serde(default)]
    pub map_value: Option<Box<FieldSpec>>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            number: 0,
            kind,
            cardinality: Cardinality::Singular,
            nullable: false,
            type_name: None,
            complexity: None,
            map_key: None,
            map_value: None,
        }
    }

    /// Message-typed field.
    pub fn message(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Message).type_name(type_name)
    }

    /// Enum-typed field.
    pub fn enumeration(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Enum).type_name(type_name)
    }

    /// Map field; key and value names are normalized to `key` / `value`.
    pub fn map(name: impl Into<String>, key: FieldSpec, value: FieldSpec) -> Self {
        let mut field = Self::new(name, FieldKind::Message);
        field.cardinality = Cardinality::Map;
        field.map_key = Some(Box::new(FieldSpec {
            name: "key".to_string(),
            number: 1,
            ..key
        }));
        field.map_value = Some(Box::new(FieldSpec {
            name: "value".to_string(),
            number: 2,
            ..value
        }));
        field
    }

    pub fn number(mut self, number: u32) -> Self {
        self.number = number;
        self
    }

    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn repeated(mut self) -> Self {
        self.cardinality = Cardinality::Repeated;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn complexity(mut self, complexity: u32) -> Self {
        self.complexity = Some(complexity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumSpec {
    pub full_name: String,
    #[serde(default)]
    pub values: Vec<EnumValueSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueSpec {
    pub name: String,
    pub number: i32,
}

impl EnumSpec {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push(EnumValueSpec {
            name: name.into(),
            number,
        });
        self
    }
}

/// Builder for [`Schema`]. Well-known types are registered up front.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    spec: SchemaSpec,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::from_spec(SchemaSpec::default())
    }

    pub fn from_spec(spec: SchemaSpec) -> Self {
        let mut builder = Self {
            spec: SchemaSpec::default(),
        };
        builder.spec.messages.extend(well_known_messages());
        builder.spec.messages.extend(spec.messages);
        builder.spec.enums.extend(spec.enums);
        builder
    }

    pub fn message(mut self, message: MessageSpec) -> Self {
        self.spec.messages.push(message);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumSpec) -> Self {
        self.spec.enums.push(enumeration);
        self
    }

    /// Validate every type reference and freeze the registry.
    pub fn build(self) -> Result<Schema> {
        let mut enums = HashMap::new();
        for e in self.spec.enums {
            let values: HashMap<String, i32> =
                e.values.into_iter().map(|v| (v.name, v.number)).collect();
            if enums.insert(e.full_name.clone(), values).is_some() {
                return Err(Error::DuplicateEnum(e.full_name));
            }
        }

        let mut messages = HashMap::new();
        for spec in self.spec.messages {
            let entry = MessageEntry::new(spec)?;
            let name = entry.full_name.clone();
            if messages.insert(name.clone(), Arc::new(entry)).is_some() {
                return Err(Error::DuplicateMessage(name));
            }
        }

        let registry = Registry { messages, enums };
        for entry in registry.messages.values() {
            for field in &entry.fields {
                registry.check_field(&entry.full_name, field)?;
            }
        }

        Ok(Schema {
            registry: Arc::new(registry),
        })
    }
}

fn well_known_messages() -> Vec<MessageSpec> {
    let seconds_nanos = |name: &str| {
        MessageSpec::new(name)
            .field(FieldSpec::new("seconds", FieldKind::Int64).number(1))
            .field(FieldSpec::new("nanos", FieldKind::Int32).number(2))
    };
    vec![
        seconds_nanos(WellKnownType::TIMESTAMP),
        seconds_nanos(WellKnownType::DURATION),
        MessageSpec::new(WellKnownType::VALUE),
        MessageSpec::new(WellKnownType::STRUCT).field(
            FieldSpec::map(
                "fields",
                FieldSpec::new("key", FieldKind::String),
                FieldSpec::message("value", WellKnownType::VALUE),
            )
            .number(1),
        ),
    ]
}

/// A frozen, cheaply cloneable schema registry.
#[derive(Clone)]
pub struct Schema {
    registry: Arc<Registry>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.registry.messages.keys().collect();
        names.sort();
        f.debug_struct("Schema").field("messages", &names).finish()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Load a schema from its JSON description (see [`SchemaSpec`]).
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: SchemaSpec = serde_json::from_str(json)?;
        SchemaBuilder::from_spec(spec).build()
    }

    /// Descriptor for a registered message type.
    pub fn message(&self, full_name: &str) -> Option<Arc<dyn MessageDescriptor>> {
        self.registry.message_handle(full_name)
    }

    pub fn contains_enum(&self, full_name: &str) -> bool {
        self.registry.enums.contains_key(full_name)
    }
}

#[derive(Debug)]
struct Registry {
    messages: HashMap<String, Arc<MessageEntry>>,
    enums: HashMap<String, HashMap<String, i32>>,
}

impl Registry {
    fn message_handle(self: &Arc<Self>, full_name: &str) -> Option<Arc<dyn MessageDescriptor>> {
        let entry = self.messages.get(full_name)?.clone();
        Some(Arc::new(MessageHandle {
            registry: Arc::clone(self),
            entry,
        }))
    }

    fn check_field(&self, message: &str, field: &FieldSpec) -> Result<()> {
        if field.cardinality == Cardinality::Map {
            let invalid = |reason| Error::InvalidMapField {
                message: message.to_string(),
                field: field.name.clone(),
                reason,
            };
            let key = field.map_key.as_deref().ok_or_else(|| invalid("missing key"))?;
            let value = field
                .map_value
                .as_deref()
                .ok_or_else(|| invalid("missing value"))?;
            if !key.kind.is_valid_map_key() {
                return Err(invalid("key kind cannot be used as a map key"));
            }
            if key.cardinality != Cardinality::Singular || value.cardinality != Cardinality::Singular
            {
                return Err(invalid("map key and value must be singular"));
            }
            self.check_field(message, value)?;
            return Ok(());
        }

        if !field.kind.is_message() && field.kind != FieldKind::Enum {
            return Ok(());
        }

        let type_name = field
            .type_name
            .as_deref()
            .ok_or_else(|| Error::MissingTypeName {
                message: message.to_string(),
                field: field.name.clone(),
            })?;
        let exists = if field.kind == FieldKind::Enum {
            self.enums.contains_key(type_name)
        } else {
            self.messages.contains_key(type_name)
        };
        if !exists {
            return Err(Error::UnknownType {
                message: message.to_string(),
                field: field.name.clone(),
                type_name: type_name.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
struct MessageEntry {
    full_name: String,
    fields: Vec<FieldSpec>,
    by_name: HashMap<String, usize>,
}

impl MessageEntry {
    fn new(spec: MessageSpec) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(spec.fields.len());
        let mut fields = spec.fields;
        for (index, field) in fields.iter_mut().enumerate() {
            if field.number == 0 {
                field.number = index as u32 + 1;
            }
            if by_name.insert(field.name.clone(), index).is_some() {
                return Err(Error::DuplicateField {
                    message: spec.full_name,
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self {
            full_name: spec.full_name,
            fields,
            by_name,
        })
    }
}

struct MessageHandle {
    registry: Arc<Registry>,
    entry: Arc<MessageEntry>,
}

impl fmt::Debug for MessageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("full_name", &self.entry.full_name)
            .finish()
    }
}

impl MessageDescriptor for MessageHandle {
    fn full_name(&self) -> &str {
        &self.entry.full_name
    }

    fn field(&self, name: &str) -> Option<Arc<dyn FieldDescriptor>> {
        let index = *self.entry.by_name.get(name)?;
        Some(self.field_handle(self.entry.fields[index].clone()))
    }

    fn fields(&self) -> Vec<Arc<dyn FieldDescriptor>> {
        self.entry
            .fields
            .iter()
            .map(|f| self.field_handle(f.clone()))
            .collect()
    }
}

impl MessageHandle {
    fn field_handle(&self, spec: FieldSpec) -> Arc<dyn FieldDescriptor> {
        Arc::new(FieldHandle {
            registry: Arc::clone(&self.registry),
            spec,
        })
    }
}

struct FieldHandle {
    registry: Arc<Registry>,
    spec: FieldSpec,
}

impl fmt::Debug for FieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.spec.name)
            .field("kind", &self.spec.kind)
            .field("cardinality", &self.spec.cardinality)
            .finish()
    }
}

impl FieldHandle {
    fn nested(&self, spec: &FieldSpec) -> Arc<dyn FieldDescriptor> {
        Arc::new(FieldHandle {
            registry: Arc::clone(&self.registry),
            spec: spec.clone(),
        })
    }
}

impl FieldDescriptor for FieldHandle {
    fn name(&self) -> &str {
        &self.spec.name
    }

    fn number(&self) -> u32 {
        self.spec.number
    }

    fn kind(&self) -> FieldKind {
        self.spec.kind
    }

    fn cardinality(&self) -> Cardinality {
        self.spec.cardinality
    }

    fn is_nullable(&self) -> bool {
        self.spec.nullable
    }

    fn message(&self) -> Option<Arc<dyn MessageDescriptor>> {
        if !self.spec.kind.is_message() || self.spec.cardinality == Cardinality::Map {
            return None;
        }
        self.registry
            .message_handle(self.spec.type_name.as_deref()?)
    }

    fn map_key(&self) -> Option<Arc<dyn FieldDescriptor>> {
        self.spec.map_key.as_deref().map(|s| self.nested(s))
    }

    fn map_value(&self) -> Option<Arc<dyn FieldDescriptor>> {
        self.spec.map_value.as_deref().map(|s| self.nested(s))
    }

    fn enum_value(&self, name: &str) -> Option<i32> {
        if self.spec.kind != FieldKind::Enum {
            return None;
        }
        let values = self.registry.enums.get(self.spec.type_name.as_deref()?)?;
        values.get(name).copied()
    }

    fn complexity(&self) -> Option<u32> {
        self.spec.complexity
    }
}
