//! Conversion of value nodes to typed values, one routine per field type.

use aip_schema::{FieldDescriptor, FieldKind, WellKnownType};
use base64::Engine as _;
use chrono::{DateTime, TimeDelta};
use std::collections::HashSet;
use std::sync::Arc;

use super::{ValueMode, Walk};
use crate::arena::Idx;
use crate::ast::*;
use crate::error::{Error, Result};
use crate::expr::{Expr, MapEntry};
use crate::temporal::{parse_duration, parse_timestamp};
use crate::token::TokenKind;
use crate::value::{MessageValue, Value};

impl<'r> Walk<'r> {
    pub(crate) fn arg_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        arg: Arg,
        mode: ValueMode,
    ) -> Result<Expr> {
        match arg {
            Arg::Composite(id) => {
                let composite = self.node(id)?;
                self.value_group(field, composite.expression, mode)
            }
            Arg::Comparable(comparable) => self.comparable_value(field, comparable, mode),
        }
    }

    /// `a = (x OR y) z` compares against a logical group of values.
    fn value_group(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        id: Idx<Expression>,
        mode: ValueMode,
    ) -> Result<Expr> {
        let expression = self.node(id)?;
        self.enter(expression.span.start)?;
        let mut sequences = Vec::with_capacity(expression.sequences.len());
        for &seq in &expression.sequences {
            let mut factors = Vec::new();
            for &factor in &self.node(seq)?.factors {
                let mut terms = Vec::new();
                for &term_id in &self.node(factor)?.terms {
                    let term = self.node(term_id)?;
                    let value = match term.simple {
                        Simple::Composite(c) => {
                            self.value_group(field, self.node(c)?.expression, mode)?
                        }
                        Simple::Restriction(r) => {
                            let restriction = self.node(r)?;
                            if let Some(comparison) = &restriction.comparison {
                                return Err(self.invalid(
                                    comparison.pos,
                                    "comparisons are not allowed inside a value group",
                                ));
                            }
                            self.comparable_value(field, restriction.comparable, mode)?
                        }
                    };
                    terms.push(match term.unary {
                        Some(_) => Expr::not(value),
                        None => value,
                    });
                }
                factors.push(Expr::or(terms));
            }
            sequences.push(Expr::and(factors));
        }
        self.leave();
        Ok(Expr::and(sequences))
    }

    pub(crate) fn comparable_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let pos = self.comparable_pos(comparable)?;
        self.enter(pos)?;
        let result = self.dispatch(field, comparable, mode);
        self.leave();
        result
    }

    fn dispatch(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        match comparable {
            Comparable::Array(id) => {
                let array = self.node(id)?;
                if field.is_map() {
                    return Err(self.invalid(
                        array.span.start,
                        &format!("array literal is not valid for map field '{}'", field.name()),
                    ));
                }
                let mut elements = Vec::with_capacity(array.elements.len());
                for &element in &array.elements {
                    elements.push(self.comparable_value(field, element, mode)?);
                }
                return Ok(Expr::Array(elements));
            }
            Comparable::Function(id) => {
                let expr = self.function(id, Some(field), mode)?;
                if expr.is_indirect() && !mode.allow_indirect {
                    let pos = self.node(id)?.span.start;
                    return Err(self.invalid(pos, "field does not allow indirect value"));
                }
                return Ok(expr);
            }
            Comparable::Member(_) | Comparable::Struct(_) => {}
        }

        if field.is_map() {
            return self.map_value(field, comparable, mode);
        }
        match field.well_known() {
            Some(WellKnownType::Timestamp) => return self.timestamp_value(field, comparable, mode),
            Some(WellKnownType::Duration) => return self.duration_value(field, comparable, mode),
            Some(WellKnownType::Struct) => return self.struct_value(field, comparable, mode),
            Some(WellKnownType::Value) => return self.dynamic_value(comparable, mode),
            None => {}
        }

        match field.kind() {
            kind if kind.is_numeric() => self.numeric_value(field, comparable, mode),
            FieldKind::Bool => self.bool_value(field, comparable, mode),
            FieldKind::String => self.string_value(field, comparable, mode),
            FieldKind::Bytes => self.bytes_value(field, comparable, mode),
            FieldKind::Enum => self.enum_value(field, comparable, mode),
            _ => self.message_value(field, comparable, mode),
        }
    }

    // ============================================
    // Shared helpers
    // ============================================

    /// The member behind a scalar value position; struct literals are rejected.
    fn scalar_member(
        &self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
    ) -> Result<&'r Member> {
        match comparable {
            Comparable::Member(id) => self.node(id),
            _ => {
                let pos = self.comparable_pos(comparable)?;
                Err(self.invalid(
                    pos,
                    &format!("expected a {} value for field '{}'", field.kind(), field.name()),
                ))
            }
        }
    }

    fn no_fields(&self, member: &Member) -> Result<()> {
        match member.fields.first() {
            Some(extra) => Err(self.invalid(
                extra.pos(),
                &format!("unexpected '.{}' after value", extra.raw()),
            )),
            None => Ok(()),
        }
    }

    /// `null` literal, when the field or position accepts it.
    fn null_value(
        &self,
        field: &Arc<dyn FieldDescriptor>,
        member: &Member,
        mode: ValueMode,
    ) -> Result<Option<Expr>> {
        if member.value.kind() != TokenKind::Null {
            return Ok(None);
        }
        self.no_fields(member)?;
        if field.is_nullable() || mode.optional {
            Ok(Some(Expr::Value(Value::Null)))
        } else {
            Err(self.invalid(
                member.value.pos(),
                &format!("field '{}' is not nullable", field.name()),
            ))
        }
    }

    /// A bare identifier standing for another field.
    fn indirect(&mut self, member: &Member, mode: ValueMode) -> Result<Expr> {
        if !mode.allow_indirect {
            return Err(self.invalid(member.value.pos(), "field does not allow indirect value"));
        }
        let path: Vec<&Leaf> = member.path().collect();
        let (selector, _) = self.select(self.root(), &path)?;
        Ok(Expr::Field(selector))
    }

    /// Whether an identifier names a root field and indirection is allowed.
    fn names_field(&self, member: &Member, mode: ValueMode) -> bool {
        mode.allow_indirect
            && member.value.is_identifier()
            && self.root().field(&member.value.unquoted()).is_some()
    }

    fn mismatch(&self, field: &Arc<dyn FieldDescriptor>, leaf: &Leaf) -> Error {
        self.invalid(
            leaf.pos(),
            &format!(
                "{} '{}' is not a valid {} value for field '{}'",
                leaf.kind().describe(),
                leaf.raw(),
                field.kind(),
                field.name()
            ),
        )
    }

    // ============================================
    // Scalars
    // ============================================

    fn numeric_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        let leaf = &member.value;
        if leaf.kind().is_number() {
            self.no_fields(member)?;
            let value = if field.kind().is_float() {
                self.float_literal(field, leaf)?
            } else {
                self.integer_literal(field, leaf)?
            };
            return Ok(Expr::Value(value));
        }
        if leaf.is_identifier() {
            return self.indirect(member, mode);
        }
        Err(self.mismatch(field, leaf))
    }

    pub(super) fn integer_literal(
        &self,
        field: &Arc<dyn FieldDescriptor>,
        leaf: &Leaf,
    ) -> Result<Value> {
        if !leaf.kind().is_integer() {
            return Err(self.mismatch(field, leaf));
        }
        let out_of_range = || {
            self.invalid(
                leaf.pos(),
                &format!("{} is out of range for {}", leaf.raw(), field.kind()),
            )
        };
        let value = parse_integer(leaf).ok_or_else(out_of_range)?;
        let kind = field.kind();
        let wide = kind.bit_width() == Some(64);
        if kind.is_signed_integer() {
            let (min, max) = if wide {
                (i64::MIN as i128, i64::MAX as i128)
            } else {
                (i32::MIN as i128, i32::MAX as i128)
            };
            if value < min || value > max {
                return Err(out_of_range());
            }
            Ok(Value::Int64(value as i64))
        } else if kind.is_unsigned_integer() {
            let max = if wide {
                u64::MAX as i128
            } else {
                u32::MAX as i128
            };
            if value < 0 || value > max {
                return Err(out_of_range());
            }
            Ok(Value::Uint64(value as u64))
        } else {
            Err(self.mismatch(field, leaf))
        }
    }

    fn float_literal(&self, field: &Arc<dyn FieldDescriptor>, leaf: &Leaf) -> Result<Value> {
        let value = match leaf.kind() {
            TokenKind::Int | TokenKind::Numeric => leaf.raw().parse::<f64>().ok(),
            TokenKind::Hex | TokenKind::Oct => parse_integer(leaf).map(|n| n as f64),
            _ => None,
        };
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return Err(self.mismatch(field, leaf));
        };
        if field.kind() == FieldKind::Float && value.abs() > f32::MAX as f64 {
            return Err(self.invalid(
                leaf.pos(),
                &format!("{} is out of range for float", leaf.raw()),
            ));
        }
        Ok(Value::Float64(value))
    }

    fn bool_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        let leaf = &member.value;
        match leaf.kind() {
            TokenKind::Bool => {
                self.no_fields(member)?;
                Ok(Expr::Value(Value::Bool(leaf.raw() == "true")))
            }
            _ if leaf.is_identifier() => self.indirect(member, mode),
            _ => Err(self.mismatch(field, leaf)),
        }
    }

    fn string_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        if self.names_field(member, mode) {
            return self.indirect(member, mode);
        }
        self.no_fields(member)?;
        Ok(Expr::Value(Value::String(
            member.value.unquoted().into_owned(),
        )))
    }

    fn bytes_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        if self.names_field(member, mode) {
            return self.indirect(member, mode);
        }
        self.no_fields(member)?;
        let leaf = &member.value;
        let bytes = match leaf {
            Leaf::String(literal) => Some(literal.value().into_owned().into_bytes()),
            Leaf::Text(text) if text.kind == TokenKind::Hex => text
                .text
                .get(2..)
                .and_then(|digits| hex::decode(digits).ok()),
            Leaf::Text(text) if text.kind == TokenKind::Text => {
                base64::engine::general_purpose::STANDARD
                    .decode(&text.text)
                    .ok()
            }
            _ => None,
        };
        match bytes {
            Some(bytes) => Ok(Expr::Value(Value::Bytes(bytes))),
            None => Err(self.mismatch(field, leaf)),
        }
    }

    fn enum_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        let leaf = &member.value;
        if matches!(leaf, Leaf::String(_)) || leaf.is_identifier() {
            if let Some(number) = field.enum_value(&leaf.unquoted()) {
                self.no_fields(member)?;
                return Ok(Expr::Value(Value::Enum(number)));
            }
            if self.names_field(member, mode) {
                return self.indirect(member, mode);
            }
            return Err(self.invalid(
                leaf.pos(),
                &format!(
                    "unknown value '{}' for enum field '{}'",
                    leaf.unquoted(),
                    field.name()
                ),
            ));
        }
        Err(self.mismatch(field, leaf))
    }

    // ============================================
    // Well-known types
    // ============================================

    fn timestamp_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        if let Comparable::Struct(id) = comparable {
            let (seconds, nanos) = self.seconds_nanos(field, id, WellKnownType::Timestamp)?;
            let timestamp = u32::try_from(nanos)
                .ok()
                .and_then(|nanos| DateTime::from_timestamp(seconds, nanos));
            return match timestamp {
                Some(t) => Ok(Expr::Value(Value::Timestamp(t.fixed_offset()))),
                None => {
                    let pos = self.node(id)?.span.start;
                    Err(self.invalid(pos, "timestamp out of range"))
                }
            };
        }

        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        let leaf = &member.value;
        match leaf.kind() {
            TokenKind::Timestamp | TokenKind::String => {
                self.no_fields(member)?;
                match parse_timestamp(&leaf.unquoted()) {
                    Some(t) => Ok(Expr::Value(Value::Timestamp(t))),
                    None => Err(self.invalid(
                        leaf.pos(),
                        &format!("'{}' is not an RFC 3339 timestamp", leaf.unquoted()),
                    )),
                }
            }
            _ if leaf.is_identifier() => self.indirect(member, mode),
            _ => Err(self.mismatch(field, leaf)),
        }
    }

    fn duration_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        if let Comparable::Struct(id) = comparable {
            let (seconds, nanos) = self.seconds_nanos(field, id, WellKnownType::Duration)?;
            let duration = TimeDelta::try_seconds(seconds)
                .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)));
            return match duration {
                Some(d) => Ok(Expr::Value(Value::Duration(d))),
                None => {
                    let pos = self.node(id)?.span.start;
                    Err(self.invalid(pos, "duration out of range"))
                }
            };
        }

        let member = self.scalar_member(field, comparable)?;
        if let Some(null) = self.null_value(field, member, mode)? {
            return Ok(null);
        }
        let leaf = &member.value;
        match leaf.kind() {
            TokenKind::Duration | TokenKind::String => {
                self.no_fields(member)?;
                match parse_duration(&leaf.unquoted()) {
                    Some(d) => Ok(Expr::Value(Value::Duration(d))),
                    None => Err(self.invalid(
                        leaf.pos(),
                        &format!("'{}' is not a duration", leaf.unquoted()),
                    )),
                }
            }
            _ if leaf.is_identifier() => self.indirect(member, mode),
            _ => Err(self.mismatch(field, leaf)),
        }
    }

    /// `{seconds: 1, nanos: 5}` (optionally named with the well-known type).
    fn seconds_nanos(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        id: Idx<Struct>,
        wkt: WellKnownType,
    ) -> Result<(i64, i64)> {
        let literal = self.node(id)?;
        self.check_struct_name(literal, wkt.full_name(), true)?;
        let message = field
            .message()
            .ok_or(Error::Internal("well-known field without message descriptor"))?;

        let mut seconds = None;
        let mut nanos = None;
        for entry in &literal.fields {
            let name = entry.name.unquoted();
            let slot = match name.as_ref() {
                "seconds" => &mut seconds,
                "nanos" => &mut nanos,
                other => {
                    return Err(self.invalid(
                        entry.name.pos(),
                        &format!("unknown field '{other}' in {}", wkt.full_name()),
                    ))
                }
            };
            if slot.is_some() {
                return Err(self.invalid(
                    entry.name.pos(),
                    &format!("duplicate field '{name}'"),
                ));
            }
            let sub = message
                .field(&name)
                .ok_or(Error::Internal("well-known message is missing a field"))?;
            match self.comparable_value(&sub, entry.value, ValueMode::DIRECT)? {
                Expr::Value(Value::Int64(n)) => *slot = Some(n),
                _ => {
                    return Err(self.invalid(
                        entry.name.pos(),
                        &format!("field '{name}' requires an integer"),
                    ))
                }
            }
        }
        Ok((seconds.unwrap_or(0), nanos.unwrap_or(0)))
    }

    /// Struct literal type names must match `expected` exactly.
    fn check_struct_name(&self, literal: &Struct, expected: &str, optional: bool) -> Result<()> {
        if literal.name.is_empty() {
            if optional {
                return Ok(());
            }
            return Err(self.invalid(
                literal.span.start,
                &format!("struct literal requires the type name {expected}"),
            ));
        }
        let name = join_path(&literal.name, Quoting::Unquoted);
        if name != expected {
            return Err(self.invalid(
                literal.span.start,
                &format!("expected {expected}, found {name}"),
            ));
        }
        Ok(())
    }

    /// `google.protobuf.Struct`: a string keyed map of dynamic values.
    fn struct_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        match comparable {
            Comparable::Struct(id) => {
                let literal = self.node(id)?;
                self.check_struct_name(literal, WellKnownType::STRUCT, true)?;
                self.dynamic_map(literal, mode)
            }
            _ => {
                let member = self.scalar_member(field, comparable)?;
                if let Some(null) = self.null_value(field, member, mode)? {
                    return Ok(null);
                }
                if member.value.is_identifier() {
                    return self.indirect(member, mode);
                }
                Err(self.mismatch(field, &member.value))
            }
        }
    }

    fn dynamic_map(&mut self, literal: &Struct, mode: ValueMode) -> Result<Expr> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(literal.fields.len());
        for entry in &literal.fields {
            let key = entry.name.unquoted().into_owned();
            if !seen.insert(key.clone()) {
                return Err(self.invalid(entry.name.pos(), &format!("duplicate key '{key}'")));
            }
            let value = self.dynamic_value(entry.value, mode)?;
            entries.push(MapEntry {
                key: Expr::Value(Value::String(key)),
                value,
            });
        }
        Ok(Expr::Map(entries))
    }

    /// `google.protobuf.Value`: null, bool, number, string, list or struct.
    fn dynamic_value(&mut self, comparable: Comparable, mode: ValueMode) -> Result<Expr> {
        let pos = self.comparable_pos(comparable)?;
        self.enter(pos)?;
        let result = match comparable {
            Comparable::Member(id) => {
                let member = self.node(id)?;
                self.no_fields(member).map(|()| {
                    let leaf = &member.value;
                    Expr::Value(match leaf.kind() {
                        TokenKind::Null => Value::Null,
                        TokenKind::Bool => Value::Bool(leaf.raw() == "true"),
                        kind if kind.is_number() => {
                            let number = match kind {
                                TokenKind::Hex | TokenKind::Oct => {
                                    parse_integer(leaf).map(|n| n as f64)
                                }
                                _ => leaf.raw().parse::<f64>().ok(),
                            };
                            match number {
                                Some(n) => Value::Float64(n),
                                None => Value::String(leaf.raw().to_string()),
                            }
                        }
                        _ => Value::String(leaf.unquoted().into_owned()),
                    })
                })
            }
            Comparable::Struct(id) => {
                let literal = self.node(id)?;
                match self.check_struct_name(literal, WellKnownType::STRUCT, true) {
                    Ok(()) => self.dynamic_map(literal, mode),
                    Err(e) => Err(e),
                }
            }
            Comparable::Array(id) => {
                let array = self.node(id)?;
                let mut elements = Vec::with_capacity(array.elements.len());
                let mut failed = None;
                for &element in &array.elements {
                    match self.dynamic_value(element, mode) {
                        Ok(value) => elements.push(value),
                        Err(e) => {
                            failed = Some(e);
                            break;
                        }
                    }
                }
                match failed {
                    Some(e) => Err(e),
                    None => Ok(Expr::Array(elements)),
                }
            }
            Comparable::Function(id) => match self.function(id, None, mode) {
                Ok(expr) if expr.is_indirect() && !mode.allow_indirect => {
                    Err(self.invalid(pos, "field does not allow indirect value"))
                }
                other => other,
            },
        };
        self.leave();
        result
    }

    // ============================================
    // Messages and maps
    // ============================================

    fn message_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let Comparable::Struct(id) = comparable else {
            let member = self.scalar_member(field, comparable)?;
            if let Some(null) = self.null_value(field, member, mode)? {
                return Ok(null);
            }
            if member.value.is_identifier() {
                return self.indirect(member, mode);
            }
            return Err(self.mismatch(field, &member.value));
        };

        let message = field
            .message()
            .ok_or(Error::Internal("message field without message descriptor"))?;
        let literal = self.node(id)?;
        self.check_struct_name(literal, message.full_name(), false)?;

        let mut seen = HashSet::new();
        let mut fields = Vec::with_capacity(literal.fields.len());
        for entry in &literal.fields {
            let name = entry.name.unquoted().into_owned();
            let Some(sub) = message.field(&name) else {
                return Err(self.invalid(
                    entry.name.pos(),
                    &format!("unknown field '{name}' in {}", message.full_name()),
                ));
            };
            if !seen.insert(name.clone()) {
                return Err(self.invalid(entry.name.pos(), &format!("duplicate field '{name}'")));
            }
            let value = self.comparable_value(
                &sub,
                entry.value,
                ValueMode {
                    optional: false,
                    ..mode
                },
            )?;
            fields.push((name, value));
        }

        Ok(Expr::Value(Value::Message(MessageValue {
            type_name: message.full_name().to_string(),
            fields,
        })))
    }

    fn map_value(
        &mut self,
        field: &Arc<dyn FieldDescriptor>,
        comparable: Comparable,
        mode: ValueMode,
    ) -> Result<Expr> {
        let Comparable::Struct(id) = comparable else {
            let member = self.scalar_member(field, comparable)?;
            if let Some(null) = self.null_value(field, member, mode)? {
                return Ok(null);
            }
            if member.value.is_identifier() {
                return self.indirect(member, mode);
            }
            return Err(self.mismatch(field, &member.value));
        };

        let literal = self.node(id)?;
        if !literal.name.is_empty() {
            return Err(self.invalid(
                literal.span.start,
                &format!("map literal for field '{}' cannot have a type name", field.name()),
            ));
        }
        let key_field = field
            .map_key()
            .ok_or(Error::Internal("map field without key descriptor"))?;
        let value_field = field
            .map_value()
            .ok_or(Error::Internal("map field without value descriptor"))?;

        let mut keys: Vec<Value> = Vec::with_capacity(literal.fields.len());
        let mut entries = Vec::with_capacity(literal.fields.len());
        for entry in &literal.fields {
            let key = self.map_key(&key_field, &entry.name)?;
            if keys.contains(&key) {
                return Err(self.invalid(
                    entry.name.pos(),
                    &format!("duplicate key '{}'", entry.name.unquoted()),
                ));
            }
            keys.push(key.clone());
            let value = self.comparable_value(&value_field, entry.value, mode)?;
            entries.push(MapEntry {
                key: Expr::Value(key),
                value,
            });
        }
        Ok(Expr::Map(entries))
    }

    /// Map key from a single leaf (`labels.env`, `{env: ...}`).
    pub(super) fn map_key(&self, key_field: &Arc<dyn FieldDescriptor>, leaf: &Leaf) -> Result<Value> {
        let kind = key_field.kind();
        match kind {
            FieldKind::String => Ok(Value::String(leaf.unquoted().into_owned())),
            FieldKind::Bool if leaf.kind() == TokenKind::Bool => {
                Ok(Value::Bool(leaf.raw() == "true"))
            }
            _ if kind.is_signed_integer() || kind.is_unsigned_integer() => {
                self.integer_literal(key_field, leaf)
            }
            _ => Err(self.mismatch(key_field, leaf)),
        }
    }
}

/// Integer value of an `Int`, `Hex` or `Oct` leaf, sign included.
fn parse_integer(leaf: &Leaf) -> Option<i128> {
    let text = leaf.raw();
    let (negative, body) = match text.strip_prefix('-') {
        Some(body) => (true, body),
        None => (false, text),
    };
    let (radix, digits) = match leaf.kind() {
        TokenKind::Int => (10, body),
        TokenKind::Hex => (16, body.get(2..)?),
        TokenKind::Oct => match body.get(..2) {
            Some("0o" | "0O") => (8, body.get(2..)?),
            _ => (8, body),
        },
        _ => return None,
    };
    let value = i128::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}
