//! Typed filter expressions
//!
//! The resolver turns a [`SyntaxTree`](crate::SyntaxTree) into an [`Expr`]: every
//! field reference is bound to its schema field, every literal is converted to the
//! field's type, and the AND/OR structure is flattened (single element groups
//! collapse to the element itself).

use aip_schema::{FieldDescriptor, FieldKind};
use std::fmt;
use std::sync::Arc;

use crate::ast::Comparator;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Compare(Compare),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    Field(FieldSelector),
    Function(FunctionCall),
    Value(Value),
    Array(Vec<Expr>),
    Map(Vec<MapEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
    pub left: Box<Expr>,
    pub comparator: Comparator,
    pub right: Box<Expr>,
}

/// Reference to a schema field, possibly traversing into nested messages or map entries.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelector {
    pub name: String,
    pub number: u32,
    pub kind: FieldKind,
    pub complexity: u32,
    pub traversal: Option<Box<Traversal>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Traversal {
    /// Field of the selected message (or of each element of a repeated message).
    Field(FieldSelector),
    /// Entry of the selected map.
    MapKey {
        key: Value,
        value_kind: FieldKind,
        next: Option<Box<Traversal>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub package: String,
    pub name: String,
    pub args: Vec<Expr>,
    pub complexity: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

/// Fields without a declared weight count as one unit.
pub const DEFAULT_FIELD_COMPLEXITY: u32 = 1;

impl FieldSelector {
    pub fn new(field: &Arc<dyn FieldDescriptor>) -> Self {
        Self {
            name: field.name().to_string(),
            number: field.number(),
            kind: field.kind(),
            complexity: field.complexity().unwrap_or(DEFAULT_FIELD_COMPLEXITY),
            traversal: None,
        }
    }

    /// Kind of the field at the end of the traversal.
    pub fn leaf_kind(&self) -> FieldKind {
        match self.traversal.as_deref() {
            None => self.kind,
            Some(traversal) => traversal.leaf_kind().unwrap_or(self.kind),
        }
    }

    /// Dotted path, map keys written as their literal value.
    pub fn path(&self) -> String {
        self.to_string()
    }

    fn total_complexity(&self) -> u64 {
        self.complexity as u64
            + self
                .traversal
                .as_deref()
                .map_or(0, Traversal::complexity)
    }
}

impl Traversal {
    fn leaf_kind(&self) -> Option<FieldKind> {
        match self {
            Traversal::Field(selector) => Some(selector.leaf_kind()),
            Traversal::MapKey {
                value_kind, next, ..
            } => match next.as_deref() {
                Some(next) => next.leaf_kind(),
                None => Some(*value_kind),
            },
        }
    }

    fn complexity(&self) -> u64 {
        match self {
            Traversal::Field(selector) => selector.total_complexity(),
            Traversal::MapKey { next, .. } => next.as_deref().map_or(0, Traversal::complexity),
        }
    }
}

impl Expr {
    /// Conjunction, collapsing a single operand to itself.
    pub fn and(mut operands: Vec<Expr>) -> Expr {
        if operands.len() == 1 {
            if let Some(only) = operands.pop() {
                return only;
            }
        }
        Expr::And(operands)
    }

    /// Disjunction, collapsing a single operand to itself.
    pub fn or(mut operands: Vec<Expr>) -> Expr {
        if operands.len() == 1 {
            if let Some(only) = operands.pop() {
                return only;
            }
        }
        Expr::Or(operands)
    }

    pub fn not(operand: Expr) -> Expr {
        Expr::Not(Box::new(operand))
    }

    pub fn compare(left: Expr, comparator: Comparator, right: Expr) -> Expr {
        Expr::Compare(Compare {
            left: Box::new(left),
            comparator,
            right: Box::new(right),
        })
    }

    /// True when evaluating the expression reads record data (a field or a
    /// function call) rather than only literals. A comparison is indirect when its
    /// right side is.
    pub fn is_indirect(&self) -> bool {
        match self {
            Expr::Field(_) | Expr::Function(_) => true,
            Expr::Value(Value::Message(message)) => {
                message.fields.iter().any(|(_, value)| value.is_indirect())
            }
            Expr::Value(_) => false,
            Expr::Compare(compare) => compare.right.is_indirect(),
            Expr::Not(inner) => inner.is_indirect(),
            Expr::And(items) | Expr::Or(items) | Expr::Array(items) => {
                items.iter().any(Expr::is_indirect)
            }
            Expr::Map(entries) => entries
                .iter()
                .any(|entry| entry.key.is_indirect() || entry.value.is_indirect()),
        }
    }

    /// Summed cost of every field read and function call in the expression.
    pub fn complexity(&self) -> u64 {
        match self {
            Expr::Field(selector) => selector.total_complexity(),
            Expr::Function(call) => {
                call.complexity as u64 + call.args.iter().map(Expr::complexity).sum::<u64>()
            }
            Expr::Value(Value::Message(message)) => {
                message.fields.iter().map(|(_, value)| value.complexity()).sum()
            }
            Expr::Value(_) => 0,
            Expr::Compare(compare) => compare.left.complexity() + compare.right.complexity(),
            Expr::Not(inner) => inner.complexity(),
            Expr::And(items) | Expr::Or(items) | Expr::Array(items) => {
                items.iter().map(Expr::complexity).sum()
            }
            Expr::Map(entries) => entries
                .iter()
                .map(|entry| entry.key.complexity() + entry.value.complexity())
                .sum(),
        }
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        let mut next = self.traversal.as_deref();
        while let Some(traversal) = next {
            match traversal {
                Traversal::Field(selector) => {
                    write!(f, ".{}", selector.name)?;
                    next = selector.traversal.as_deref();
                }
                Traversal::MapKey { key, next: after, .. } => {
                    write!(f, "[{key}]")?;
                    next = after.as_deref();
                }
            }
        }
        Ok(())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr], separator: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Compare(compare) => {
                write!(f, "{} {} {}", compare.left, compare.comparator, compare.right)
            }
            Expr::And(items) => {
                f.write_str("(")?;
                write_joined(f, items, " AND ")?;
                f.write_str(")")
            }
            Expr::Or(items) => {
                f.write_str("(")?;
                write_joined(f, items, " OR ")?;
                f.write_str(")")
            }
            Expr::Not(inner) => write!(f, "NOT {inner}"),
            Expr::Field(selector) => write!(f, "{selector}"),
            Expr::Function(call) => {
                if !call.package.is_empty() {
                    write!(f, "{}.", call.package)?;
                }
                write!(f, "{}(", call.name)?;
                write_joined(f, &call.args, ", ")?;
                f.write_str(")")
            }
            Expr::Value(value) => write!(f, "{value}"),
            Expr::Array(items) => {
                f.write_str("[")?;
                write_joined(f, items, ", ")?;
                f.write_str("]")
            }
            Expr::Map(entries) => {
                f.write_str("{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Result of resolving a syntax tree. An empty filter has no expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedFilter {
    pub expr: Option<Expr>,
    pub complexity: u64,
}

impl ResolvedFilter {
    pub fn is_empty(&self) -> bool {
        self.expr.is_none()
    }

    /// Drop the expression. Calling it again is a no-op.
    pub fn release(&mut self) {
        self.expr = None;
        self.complexity = 0;
    }
}
