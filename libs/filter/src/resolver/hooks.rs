//! Resolution hooks
//!
//! Hooks let callers take over resolution of specific fields or functions, e.g. to
//! accept `create_time > "yesterday"` or to fold `now()` into a timestamp. A hook
//! returning `Ok(None)` falls back to the default resolution.

use aip_schema::FieldDescriptor;
use std::sync::Arc;

use crate::ast::{Comparison, Function, Quoting, Restriction, SyntaxTree};
use crate::error::Result;
use crate::expr::{Expr, FieldSelector};
use crate::resolver::Resolver;

/// Called for restrictions whose left side is the registered dotted field path.
pub type FieldHook = Arc<dyn Fn(&FieldHookContext<'_>) -> Result<Option<Expr>> + Send + Sync>;

/// Called for calls to the registered dotted function name.
pub type FunctionHook =
    Arc<dyn Fn(&FunctionHookContext<'_>) -> Result<Option<Expr>> + Send + Sync>;

pub struct FieldHookContext<'t> {
    pub resolver: &'t Resolver,
    pub tree: &'t SyntaxTree,
    pub restriction: &'t Restriction,
    pub comparison: &'t Comparison,
    /// Field at the end of the left side path.
    pub field: &'t Arc<dyn FieldDescriptor>,
    pub selector: &'t FieldSelector,
    pub allow_indirect: bool,
}

impl FieldHookContext<'_> {
    /// Right side as written, with string quotes removed.
    pub fn arg_text(&self) -> String {
        self.tree.render_arg(self.comparison.arg, Quoting::Unquoted)
    }

    /// Resolve the right side the default way.
    pub fn default_value(&self) -> Result<Expr> {
        let mut complexity = 0;
        self.resolver.try_parse_value(
            self.tree,
            Some(self.field),
            Some(self.comparison.arg),
            self.allow_indirect,
            false,
            &mut complexity,
        )
    }
}

pub struct FunctionHookContext<'t> {
    pub resolver: &'t Resolver,
    pub tree: &'t SyntaxTree,
    pub function: &'t Function,
    /// Dotted function name as written.
    pub name: &'t str,
    /// Field the call result is compared against, `None` on the left side or as a
    /// bare restriction.
    pub target: Option<&'t Arc<dyn FieldDescriptor>>,
    pub allow_indirect: bool,
}

impl FunctionHookContext<'_> {
    pub fn arg_count(&self) -> usize {
        self.function.args.len()
    }

    pub fn arg_text(&self, index: usize) -> Option<String> {
        self.function
            .args
            .get(index)
            .map(|&arg| self.tree.render_arg(arg, Quoting::Unquoted))
    }
}
