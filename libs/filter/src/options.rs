//! Parser and resolver configuration.
//!
//! Both option sets deserialize with serde (missing keys take their defaults), so
//! they can be embedded in a service's configuration file. Callbacks and hooks are
//! code-only and are attached with the builder methods.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ErrorCallback;
use crate::resolver::{FieldHook, FunctionHook, FunctionSignature};

/// Maximum nesting of composites, function arguments and literals.
pub const DEFAULT_MAX_DEPTH: usize = 200;

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Require exactly one whitespace character around `AND`/`OR`, after `NOT` and
    /// between factors, and forbid whitespace inside argument lists and literals.
    pub strict_whitespace: bool,
    /// Accept `name{field: value}` struct and `{key: value}` map literals.
    pub enable_structs: bool,
    /// Accept `[a, b]` array literals.
    pub enable_arrays: bool,
    /// Treat `IN` as a comparator.
    pub enable_in: bool,
    pub max_depth: usize,
    #[serde(skip)]
    pub error_callback: Option<ErrorCallback>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            strict_whitespace: false,
            enable_structs: false,
            enable_arrays: false,
            enable_in: false,
            max_depth: DEFAULT_MAX_DEPTH,
            error_callback: None,
        }
    }
}

impl ParserOptions {
    /// Lenient whitespace with every grammar extension enabled.
    pub fn all_extensions() -> Self {
        Self {
            enable_structs: true,
            enable_arrays: true,
            enable_in: true,
            ..Self::default()
        }
    }

    pub fn strict(mut self) -> Self {
        self.strict_whitespace = true;
        self
    }

    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.error_callback = Some(callback);
        self
    }
}

impl fmt::Debug for ParserOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserOptions")
            .field("strict_whitespace", &self.strict_whitespace)
            .field("enable_structs", &self.enable_structs)
            .field("enable_arrays", &self.enable_arrays)
            .field("enable_in", &self.enable_in)
            .field("max_depth", &self.max_depth)
            .field("error_callback", &self.error_callback.is_some())
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Let field references stand where a literal value is expected.
    pub allow_indirect: bool,
    pub max_depth: usize,
    #[serde(skip)]
    pub error_callback: Option<ErrorCallback>,
    #[serde(skip)]
    pub(crate) field_hooks: HashMap<String, FieldHook>,
    #[serde(skip)]
    pub(crate) function_hooks: HashMap<String, FunctionHook>,
    #[serde(skip)]
    pub(crate) functions: HashMap<String, Arc<FunctionSignature>>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            allow_indirect: false,
            max_depth: DEFAULT_MAX_DEPTH,
            error_callback: None,
            field_hooks: HashMap::new(),
            function_hooks: HashMap::new(),
            functions: HashMap::new(),
        }
    }
}

impl ResolverOptions {
    pub fn allow_indirect(mut self, allow: bool) -> Self {
        self.allow_indirect = allow;
        self
    }

    pub fn with_error_callback(mut self, callback: ErrorCallback) -> Self {
        self.error_callback = Some(callback);
        self
    }

    /// Intercept restrictions whose left side is the dotted field `path`.
    pub fn with_field_hook(mut self, path: impl Into<String>, hook: FieldHook) -> Self {
        self.field_hooks.insert(path.into(), hook);
        self
    }

    /// Intercept calls to the dotted function `name`.
    pub fn with_function_hook(mut self, name: impl Into<String>, hook: FunctionHook) -> Self {
        self.function_hooks.insert(name.into(), hook);
        self
    }

    /// Register a function signature under its qualified name.
    pub fn with_function(mut self, signature: FunctionSignature) -> Self {
        self.functions
            .insert(signature.qualified_name(), Arc::new(signature));
        self
    }

    pub fn function(&self, qualified_name: &str) -> Option<&Arc<FunctionSignature>> {
        self.functions.get(qualified_name)
    }
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut field_hooks: Vec<_> = self.field_hooks.keys().collect();
        field_hooks.sort();
        let mut function_hooks: Vec<_> = self.function_hooks.keys().collect();
        function_hooks.sort();
        let mut functions: Vec<_> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("ResolverOptions")
            .field("allow_indirect", &self.allow_indirect)
            .field("max_depth", &self.max_depth)
            .field("error_callback", &self.error_callback.is_some())
            .field("field_hooks", &field_hooks)
            .field("function_hooks", &function_hooks)
            .field("functions", &functions)
            .finish()
    }
}
