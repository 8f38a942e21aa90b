//! Schema-aware resolution of syntax trees
//!
//! The resolver walks a [`SyntaxTree`] against a root [`MessageDescriptor`]:
//! - left sides of comparisons become [`FieldSelector`]s (or function calls)
//! - right sides are converted to the type of the selected field
//! - bare restrictions become field selectors when they name a root field and
//!   free text search values otherwise
//! - composites inside a comparison (`a = (x OR y)`) become value groups
//!
//! Errors are reported through the callback with a message and returned as
//! [`Error::InvalidValue`] carrying only the position.

mod functions;
mod hooks;
mod values;

pub use functions::{FunctionSignature, ScalarField};
pub use hooks::{FieldHook, FieldHookContext, FunctionHook, FunctionHookContext};

use aip_schema::{FieldDescriptor, MessageDescriptor};
use std::sync::Arc;

use crate::arena::Idx;
use crate::ast::*;
use crate::error::{report, Error, Result};
use crate::expr::{Expr, FieldSelector, FunctionCall, ResolvedFilter, Traversal};
use crate::options::ResolverOptions;
use crate::token::Position;
use crate::value::Value;

/// Converts syntax trees into typed expressions for one root message type.
///
/// A resolver is immutable and can be shared between threads.
pub struct Resolver {
    root: Arc<dyn MessageDescriptor>,
    options: ResolverOptions,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("root", &self.root.full_name())
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver {
    pub fn new(root: Arc<dyn MessageDescriptor>) -> Self {
        Self {
            root,
            options: ResolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Arc<dyn MessageDescriptor> {
        &self.root
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve a whole tree. An empty tree resolves to an empty filter.
    pub fn resolve(&self, tree: &SyntaxTree) -> Result<ResolvedFilter> {
        let Some(root) = tree.root() else {
            return Ok(ResolvedFilter::default());
        };
        let mut walk = Walk::new(self, tree);
        let expr = walk.expression(root)?;
        let complexity = expr.complexity();
        tracing::trace!(
            complexity,
            message = self.root.full_name(),
            "resolved filter"
        );
        Ok(ResolvedFilter {
            expr: Some(expr),
            complexity,
        })
    }

    /// Convert one argument node to a value of `field`'s type.
    ///
    /// `is_optional` additionally accepts `null`. The complexity of the produced
    /// expression is added to `complexity`.
    pub fn try_parse_value(
        &self,
        tree: &SyntaxTree,
        field: Option<&Arc<dyn FieldDescriptor>>,
        arg: Option<Arg>,
        allow_indirect: bool,
        is_optional: bool,
        complexity: &mut u64,
    ) -> Result<Expr> {
        let field = field.ok_or(Error::Internal("missing field descriptor"))?;
        let arg = arg.ok_or(Error::Internal("missing value node"))?;
        let mut walk = Walk::new(self, tree);
        let expr = walk.arg_value(
            field,
            arg,
            ValueMode {
                allow_indirect,
                optional: is_optional,
            },
        )?;
        *complexity += expr.complexity();
        Ok(expr)
    }
}

/// How a value position may be filled.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueMode {
    pub allow_indirect: bool,
    pub optional: bool,
}

impl ValueMode {
    /// Literal only: no field references, no null.
    pub(crate) const DIRECT: ValueMode = ValueMode {
        allow_indirect: false,
        optional: false,
    };
}

/// State of a single resolution.
pub(crate) struct Walk<'r> {
    resolver: &'r Resolver,
    tree: &'r SyntaxTree,
    depth: usize,
}

impl<'r> Walk<'r> {
    fn new(resolver: &'r Resolver, tree: &'r SyntaxTree) -> Self {
        Self {
            resolver,
            tree,
            depth: 0,
        }
    }

    fn options(&self) -> &'r ResolverOptions {
        &self.resolver.options
    }

    fn root(&self) -> Arc<dyn MessageDescriptor> {
        self.resolver.root.clone()
    }

    fn node<T: Node>(&self, id: Idx<T>) -> Result<&'r T> {
        self.tree.get(id).ok_or(Error::InvalidSyntaxTree)
    }

    fn invalid(&self, pos: Position, message: &str) -> Error {
        tracing::debug!(offset = pos.offset, message, "filter value error");
        report(self.options().error_callback.as_ref(), pos, message);
        Error::InvalidValue { pos }
    }

    fn enter(&mut self, pos: Position) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options().max_depth {
            return Err(self.invalid(
                pos,
                &format!("filter too deeply nested (max depth: {})", self.options().max_depth),
            ));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn comparable_pos(&self, comparable: Comparable) -> Result<Position> {
        Ok(match comparable {
            Comparable::Member(id) => self.node(id)?.span.start,
            Comparable::Function(id) => self.node(id)?.span.start,
            Comparable::Struct(id) => self.node(id)?.span.start,
            Comparable::Array(id) => self.node(id)?.span.start,
        })
    }

    // ============================================
    // Logical structure
    // ============================================

    fn expression(&mut self, id: Idx<Expression>) -> Result<Expr> {
        let expression = self.node(id)?;
        self.enter(expression.span.start)?;
        let mut sequences = Vec::with_capacity(expression.sequences.len());
        for &seq in &expression.sequences {
            sequences.push(self.sequence(seq)?);
        }
        self.leave();
        Ok(Expr::and(sequences))
    }

    fn sequence(&mut self, id: Idx<Sequence>) -> Result<Expr> {
        let sequence = self.node(id)?;
        let mut factors = Vec::with_capacity(sequence.factors.len());
        for &factor in &sequence.factors {
            factors.push(self.factor(factor)?);
        }
        Ok(Expr::and(factors))
    }

    fn factor(&mut self, id: Idx<Factor>) -> Result<Expr> {
        let factor = self.node(id)?;
        let mut terms = Vec::with_capacity(factor.terms.len());
        for &term in &factor.terms {
            terms.push(self.term(term)?);
        }
        Ok(Expr::or(terms))
    }

    fn term(&mut self, id: Idx<Term>) -> Result<Expr> {
        let term = self.node(id)?;
        let inner = match term.simple {
            Simple::Composite(c) => self.expression(self.node(c)?.expression)?,
            Simple::Restriction(r) => self.restriction(r)?,
        };
        // `-x` is shorthand for `NOT x`.
        Ok(match term.unary {
            Some(UnaryOp::Not | UnaryOp::Minus) => Expr::not(inner),
            None => inner,
        })
    }

    fn restriction(&mut self, id: Idx<Restriction>) -> Result<Expr> {
        let restriction = self.node(id)?;
        let Some(comparison) = &restriction.comparison else {
            return self.global(restriction.comparable);
        };

        let (left, target) = self.left_side(restriction.comparable)?;

        if let (Comparable::Member(member), Expr::Field(selector)) = (restriction.comparable, &left) {
            let path = member_path(self.node(member)?);
            if let Some(hook) = self.options().field_hooks.get(&path) {
                let context = FieldHookContext {
                    resolver: self.resolver,
                    tree: self.tree,
                    restriction,
                    comparison,
                    field: &target,
                    selector,
                    allow_indirect: self.options().allow_indirect,
                };
                if let Some(expr) = hook(&context)? {
                    tracing::trace!(field = %path, "field hook resolved restriction");
                    return Ok(expr);
                }
            }
        }

        let mode = ValueMode {
            allow_indirect: self.options().allow_indirect,
            optional: false,
        };
        let right = match comparison.comparator {
            Comparator::Has if target.is_map() => {
                let key = target
                    .map_key()
                    .ok_or(Error::Internal("map field without key descriptor"))?;
                self.arg_value(&key, comparison.arg, mode)?
            }
            Comparator::In => {
                let right = self.arg_value(&target, comparison.arg, mode)?;
                let accepted = match &right {
                    Expr::Array(_) | Expr::Function(_) => true,
                    Expr::Field(_) => self.names_repeated_field(comparison.arg)?,
                    _ => false,
                };
                if !accepted {
                    return Err(self.invalid(
                        comparison.pos,
                        "IN requires an array or a repeated field",
                    ));
                }
                right
            }
            _ => self.arg_value(&target, comparison.arg, mode)?,
        };

        Ok(Expr::compare(left, comparison.comparator, right))
    }

    /// A restriction without comparator: a field reference or a search value.
    fn global(&mut self, comparable: Comparable) -> Result<Expr> {
        match comparable {
            Comparable::Member(id) => {
                let member = self.node(id)?;
                if member.value.is_identifier()
                    && self.root().field(&member.value.unquoted()).is_some()
                {
                    let path: Vec<&Leaf> = member.path().collect();
                    let (selector, _) = self.select(self.root(), &path)?;
                    return Ok(Expr::Field(selector));
                }
                Ok(Expr::Value(Value::String(member_path(member))))
            }
            Comparable::Function(id) => self.function(
                id,
                None,
                ValueMode {
                    allow_indirect: true,
                    optional: false,
                },
            ),
            Comparable::Struct(_) | Comparable::Array(_) => {
                let pos = self.comparable_pos(comparable)?;
                Err(self.invalid(pos, "a literal cannot stand alone as a restriction"))
            }
        }
    }

    fn left_side(&mut self, comparable: Comparable) -> Result<(Expr, Arc<dyn FieldDescriptor>)> {
        match comparable {
            Comparable::Member(id) => {
                let member = self.node(id)?;
                let path: Vec<&Leaf> = member.path().collect();
                let (selector, field) = self.select(self.root(), &path)?;
                Ok((Expr::Field(selector), field))
            }
            Comparable::Function(id) => {
                let function = self.node(id)?;
                let name = join_path(&function.name, Quoting::Unquoted);
                let result = self
                    .options()
                    .function(&name)
                    .and_then(|signature| signature.result.clone());
                let Some(result) = result else {
                    return Err(self.invalid(
                        function.span.start,
                        &format!("function '{name}' has no declared result type"),
                    ));
                };
                let expr = self.function(
                    id,
                    None,
                    ValueMode {
                        allow_indirect: true,
                        optional: false,
                    },
                )?;
                Ok((expr, result))
            }
            Comparable::Struct(_) | Comparable::Array(_) => {
                let pos = self.comparable_pos(comparable)?;
                Err(self.invalid(
                    pos,
                    "left side of a comparison must be a field or a function",
                ))
            }
        }
    }

    // ============================================
    // Fields
    // ============================================

    /// Bind a dotted path to schema fields, starting at `message`.
    ///
    /// Each segment counts against `max_depth`: recursive messages allow
    /// arbitrarily long paths.
    fn select(
        &mut self,
        message: Arc<dyn MessageDescriptor>,
        path: &[&Leaf],
    ) -> Result<(FieldSelector, Arc<dyn FieldDescriptor>)> {
        let (leaf, rest) = path
            .split_first()
            .ok_or(Error::Internal("empty field path"))?;
        self.enter(leaf.pos())?;
        let result = self.select_segment(message, leaf, rest);
        self.leave();
        result
    }

    fn select_segment(
        &mut self,
        message: Arc<dyn MessageDescriptor>,
        leaf: &Leaf,
        rest: &[&Leaf],
    ) -> Result<(FieldSelector, Arc<dyn FieldDescriptor>)> {
        if !leaf.is_identifier() {
            return Err(self.invalid(
                leaf.pos(),
                &format!("'{}' is not a field name", leaf.raw()),
            ));
        }
        let name = leaf.unquoted();
        let Some(field) = message.field(&name) else {
            return Err(self.invalid(
                leaf.pos(),
                &format!("unknown field '{name}' in {}", message.full_name()),
            ));
        };

        let mut selector = FieldSelector::new(&field);
        let Some((next, remaining)) = rest.split_first() else {
            return Ok((selector, field));
        };

        if field.is_map() {
            let key_field = field
                .map_key()
                .ok_or(Error::Internal("map field without key descriptor"))?;
            let value_field = field
                .map_value()
                .ok_or(Error::Internal("map field without value descriptor"))?;
            let key = self.map_key(&key_field, next)?;
            let (after, leaf_field) = match remaining.first() {
                None => (None, value_field.clone()),
                Some(first) => {
                    let Some(value_message) = value_field.message() else {
                        return Err(self.invalid(
                            first.pos(),
                            &format!("map '{name}' has scalar values without fields"),
                        ));
                    };
                    let (sub, leaf_field) = self.select(value_message, remaining)?;
                    (Some(Box::new(Traversal::Field(sub))), leaf_field)
                }
            };
            selector.traversal = Some(Box::new(Traversal::MapKey {
                key,
                value_kind: value_field.kind(),
                next: after,
            }));
            return Ok((selector, leaf_field));
        }

        if let Some(sub_message) = field.message().filter(|_| field.kind().is_message()) {
            let (sub, leaf_field) = self.select(sub_message, rest)?;
            selector.traversal = Some(Box::new(Traversal::Field(sub)));
            return Ok((selector, leaf_field));
        }

        Err(self.invalid(
            next.pos(),
            &format!(
                "field '{name}' of type {} has no field '{}'",
                field.kind(),
                next.unquoted()
            ),
        ))
    }

    /// Whether `arg` is a member path ending on a repeated field.
    fn names_repeated_field(&mut self, arg: Arg) -> Result<bool> {
        let Arg::Comparable(Comparable::Member(id)) = arg else {
            return Ok(false);
        };
        let member = self.node(id)?;
        let path: Vec<&Leaf> = member.path().collect();
        let (_, field) = self.select(self.root(), &path)?;
        Ok(field.is_repeated())
    }

    // ============================================
    // Functions
    // ============================================

    fn function(
        &mut self,
        id: Idx<Function>,
        target: Option<&Arc<dyn FieldDescriptor>>,
        mode: ValueMode,
    ) -> Result<Expr> {
        let function = self.node(id)?;
        let pos = function.span.start;
        let name = join_path(&function.name, Quoting::Unquoted);

        if let Some(hook) = self.options().function_hooks.get(&name) {
            let context = FunctionHookContext {
                resolver: self.resolver,
                tree: self.tree,
                function,
                name: &name,
                target,
                allow_indirect: mode.allow_indirect,
            };
            if let Some(expr) = hook(&context)? {
                tracing::trace!(function = %name, "function hook resolved call");
                return Ok(expr);
            }
        }

        let Some(signature) = self.options().function(&name) else {
            return Err(self.invalid(pos, &format!("unknown function '{name}'")));
        };
        if !signature.accepts_arity(function.args.len()) {
            return Err(self.invalid(
                pos,
                &format!(
                    "function '{name}' takes {} argument(s), {} given",
                    signature.parameters.len(),
                    function.args.len()
                ),
            ));
        }

        let mut args = Vec::with_capacity(function.args.len());
        for (index, &arg) in function.args.iter().enumerate() {
            let param = signature
                .parameter(index)
                .ok_or(Error::Internal("missing parameter descriptor"))?;
            args.push(self.arg_value(
                param,
                arg,
                ValueMode {
                    optional: false,
                    ..mode
                },
            )?);
        }

        if let (Some(target), Some(result)) = (target, &signature.result) {
            if !functions::kinds_compatible(&**result, &**target) {
                return Err(self.invalid(
                    pos,
                    &format!(
                        "function '{name}' returns {}, field '{}' is {}",
                        result.kind(),
                        target.name(),
                        target.kind()
                    ),
                ));
            }
        }

        Ok(Expr::Function(FunctionCall {
            package: signature.package.clone(),
            name: signature.name.clone(),
            args,
            complexity: signature.complexity,
        }))
    }
}

/// Dotted, unquoted path of a member.
fn member_path(member: &Member) -> String {
    let mut path = member.value.unquoted().into_owned();
    for field in &member.fields {
        path.push('.');
        path.push_str(&field.unquoted());
    }
    path
}
