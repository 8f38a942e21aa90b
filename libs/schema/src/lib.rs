//! Schema descriptors for filter resolution
//!
//! Provides a trait-based interface describing one record type (a "message") and its
//! fields, which the filter resolver consults while binding a parsed filter:
//!
//! - [`MessageDescriptor`] / [`FieldDescriptor`]: the capability set the resolver needs
//!   (kind, cardinality, nullability, nested descriptors, enum lookup, complexity)
//! - [`Schema`]: an in-memory registry implementing both traits, built with
//!   [`SchemaBuilder`] or loaded from JSON
//!
//! Any other schema system can be plugged in by implementing the two traits.

pub mod descriptor;
pub mod error;
pub mod schema;

pub use descriptor::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor, WellKnownType};
pub use error::{Error, Result};
pub use schema::{EnumSpec, FieldSpec, MessageSpec, Schema, SchemaBuilder, SchemaSpec};
