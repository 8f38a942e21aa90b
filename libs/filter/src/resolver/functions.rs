//! Function signatures known to the resolver.

use aip_schema::{Cardinality, FieldDescriptor, FieldKind, MessageDescriptor};
use std::sync::Arc;

/// Declared shape of a filter function such as `regex(name, "^a")`.
///
/// Parameters and result are described as fields so they can be taken straight
/// from a schema; [`ScalarField`] covers plain scalar types.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub package: String,
    pub name: String,
    pub parameters: Vec<Arc<dyn FieldDescriptor>>,
    /// The last parameter may repeat.
    pub variadic: bool,
    pub result: Option<Arc<dyn FieldDescriptor>>,
    pub complexity: u32,
}

impl FunctionSignature {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            parameters: Vec::new(),
            variadic: false,
            result: None,
            complexity: 1,
        }
    }

    pub fn param(self, kind: FieldKind) -> Self {
        let name = format!("arg{}", self.parameters.len());
        self.param_field(Arc::new(ScalarField::new(name, kind)))
    }

    pub fn param_field(mut self, field: Arc<dyn FieldDescriptor>) -> Self {
        self.parameters.push(field);
        self
    }

    pub fn repeat_last(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn returns(self, kind: FieldKind) -> Self {
        self.returns_field(Arc::new(ScalarField::new("result", kind)))
    }

    pub fn returns_field(mut self, field: Arc<dyn FieldDescriptor>) -> Self {
        self.result = Some(field);
        self
    }

    pub fn with_complexity(mut self, complexity: u32) -> Self {
        self.complexity = complexity;
        self
    }

    /// `package.name`, or just `name` without a package.
    pub fn qualified_name(&self) -> String {
        if self.package.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.package, self.name)
        }
    }

    pub fn accepts_arity(&self, count: usize) -> bool {
        if self.variadic && !self.parameters.is_empty() {
            count >= self.parameters.len() - 1
        } else {
            count == self.parameters.len()
        }
    }

    pub fn parameter(&self, index: usize) -> Option<&Arc<dyn FieldDescriptor>> {
        match self.parameters.get(index) {
            Some(param) => Some(param),
            None if self.variadic => self.parameters.last(),
            None => None,
        }
    }
}

/// Stand-alone singular scalar field descriptor.
#[derive(Debug, Clone)]
pub struct ScalarField {
    name: String,
    kind: FieldKind,
    nullable: bool,
}

impl ScalarField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

impl FieldDescriptor for ScalarField {
    fn name(&self) -> &str {
        &self.name
    }

    fn number(&self) -> u32 {
        0
    }

    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn cardinality(&self) -> Cardinality {
        Cardinality::Singular
    }

    fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn message(&self) -> Option<Arc<dyn MessageDescriptor>> {
        None
    }

    fn map_key(&self) -> Option<Arc<dyn FieldDescriptor>> {
        None
    }

    fn map_value(&self) -> Option<Arc<dyn FieldDescriptor>> {
        None
    }

    fn enum_value(&self, _name: &str) -> Option<i32> {
        None
    }

    fn complexity(&self) -> Option<u32> {
        None
    }
}

/// Whether a value of field `from` can stand where `to` is expected.
pub(crate) fn kinds_compatible(from: &dyn FieldDescriptor, to: &dyn FieldDescriptor) -> bool {
    let (a, b) = (from.kind(), to.kind());
    if a.is_message() && b.is_message() {
        return match (from.message(), to.message()) {
            (Some(x), Some(y)) => x.full_name() == y.full_name(),
            _ => false,
        };
    }
    a == b
        || (a.is_signed_integer() && b.is_signed_integer())
        || (a.is_unsigned_integer() && b.is_unsigned_integer())
        || (a.is_float() && b.is_float())
}
