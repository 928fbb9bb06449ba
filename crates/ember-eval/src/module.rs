//! Module values.

use std::collections::BTreeSet;

use crate::{Context, EvalError, Value};

/// A named function namespace. Qualified calls only reach exported names.
pub struct Module {
    name: String,
    exports: BTreeSet<String>,
    context: Context,
}

impl Module {
    pub fn new(name: impl Into<String>, exports: BTreeSet<String>, context: Context) -> Self {
        Self {
            name: name.into(),
            exports,
            context,
        }
    }

    /// A module exporting every `name/arity` bound directly in `context`.
    pub fn exporting_all(name: impl Into<String>, context: Context) -> Self {
        let exports = context
            .local_names()
            .into_iter()
            .filter(|key| key.contains('/'))
            .collect();
        Self::new(name, exports, context)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn exports(&self) -> &BTreeSet<String> {
        &self.exports
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn is_exported(&self, key: &str) -> bool {
        self.exports.contains(key)
    }

    /// Resolve an exported `name/arity`. The function must be defined in
    /// the module itself.
    pub fn function(&self, name: &str, arity: usize) -> Result<Value, EvalError> {
        let key = format!("{}/{}", name, arity);
        let missing = || EvalError::UndefinedFunction(format!("{}:{}", self.name, key));
        if !self.is_exported(&key) {
            return Err(missing());
        }
        self.context
            .lookup_local(&key)
            .filter(|value| value.as_callable().is_some())
            .ok_or_else(missing)
    }
}
