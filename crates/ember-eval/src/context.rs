//! Evaluation context.
//!
//! A context is a chain of scopes. The root holds the function registry
//! (`name/arity` keys), native functions and loaded modules; every call
//! gets a fresh *frame* and every successful `case`/`receive` match a plain
//! child scope.

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::{EvalError, Value};

/// A scope in the chain, shared between processes.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Scope>,
}

struct Scope {
    bindings: DashMap<String, Value>,
    parent: Option<Context>,
    /// Marks the boundary of a function call for pattern variable lookup
    frame: bool,
    module: Option<Arc<ModuleInfo>>,
}

impl Context {
    /// Create a root context. The root counts as a frame.
    pub fn new() -> Self {
        Self::with_parent(None, true, None)
    }

    fn with_parent(parent: Option<Context>, frame: bool, module: Option<Arc<ModuleInfo>>) -> Self {
        Self {
            inner: Arc::new(Scope {
                bindings: DashMap::new(),
                parent,
                frame,
                module,
            }),
        }
    }

    /// Create a plain child scope.
    pub fn extend(&self) -> Context {
        Self::with_parent(Some(self.clone()), false, None)
    }

    /// Create a child scope marking a function call.
    pub fn frame(&self) -> Context {
        Self::with_parent(Some(self.clone()), true, None)
    }

    /// Create the scope a module's forms are evaluated in.
    pub fn module_scope(&self, info: Arc<ModuleInfo>) -> Context {
        Self::with_parent(Some(self.clone()), true, Some(info))
    }

    /// A frozen copy of the variables visible from here, for a `fun` to
    /// close over.
    ///
    /// Bindings are copied out of every scope up to the nearest module scope
    /// or root, inner bindings shadowing outer ones. That scope becomes the
    /// parent of the copy, so functions defined there stay reachable while
    /// later binds in the enclosing scopes do not show through.
    pub fn capture(&self) -> Context {
        let snapshot = DashMap::new();
        let mut scope = self;
        while scope.inner.module.is_none() {
            let Some(parent) = scope.inner.parent.as_ref() else {
                break;
            };
            for entry in scope.inner.bindings.iter() {
                if !snapshot.contains_key(entry.key()) {
                    snapshot.insert(entry.key().clone(), entry.value().clone());
                }
            }
            scope = parent;
        }
        Self {
            inner: Arc::new(Scope {
                bindings: snapshot,
                parent: Some(scope.clone()),
                frame: false,
                module: None,
            }),
        }
    }

    /// Look up a name in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        self.inner.bindings.get(name).map(|value| value.clone())
    }

    /// Copy every binding of this scope into `target`.
    pub fn merge_into(&self, target: &Context) {
        for entry in self.inner.bindings.iter() {
            target.define(entry.key(), entry.value().clone());
        }
    }

    /// Look up a name, walking out to the root.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.inner.bindings.get(name) {
                return Some(value.clone());
            }
            scope = scope.inner.parent.as_ref()?;
        }
    }

    /// Look up a name or fail with `UndefinedName`.
    pub fn get_value(&self, name: &str) -> Result<Value, EvalError> {
        self.lookup(name)
            .ok_or_else(|| EvalError::UndefinedName(name.to_string()))
    }

    /// Look up a name only as far out as the nearest frame, inclusive.
    pub fn lookup_in_frame(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.inner.bindings.get(name) {
                return Some(value.clone());
            }
            if scope.inner.frame {
                return None;
            }
            scope = scope.inner.parent.as_ref()?;
        }
    }

    /// Bind a name in this scope with single-assignment semantics: an
    /// equal value is accepted, a different one is a conflict.
    pub fn set_value(&self, name: &str, value: Value) -> Result<(), EvalError> {
        match self.inner.bindings.entry(name.to_string()) {
            Entry::Occupied(existing) => {
                if *existing.get() == value {
                    Ok(())
                } else {
                    Err(EvalError::ConflictingBinding(name.to_string()))
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Bind a name in this scope unconditionally.
    pub fn define(&self, name: &str, value: Value) {
        self.inner.bindings.insert(name.to_string(), value);
    }

    /// Names bound directly in this scope, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .bindings
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn is_frame(&self) -> bool {
        self.inner.frame
    }

    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// The outermost scope of the chain.
    pub fn root(&self) -> Context {
        let mut scope = self;
        while let Some(parent) = scope.inner.parent.as_ref() {
            scope = parent;
        }
        scope.clone()
    }

    /// Module information of the nearest enclosing module scope.
    pub fn module(&self) -> Option<Arc<ModuleInfo>> {
        let mut scope = self;
        loop {
            if let Some(info) = &scope.inner.module {
                return Some(info.clone());
            }
            scope = scope.inner.parent.as_ref()?;
        }
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

/// Attributes declared while a module's forms are evaluated.
#[derive(Debug, Default)]
pub struct ModuleInfo {
    name: OnceLock<String>,
    exports: RwLock<BTreeSet<String>>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.get().map(String::as_str)
    }

    /// Record `-module(name)`. Repeating the same name is allowed.
    pub fn set_name(&self, name: &str) -> Result<(), EvalError> {
        let current = self.name.get_or_init(|| name.to_string());
        if current == name {
            Ok(())
        } else {
            Err(EvalError::ModuleAttribute(format!(
                "module already declared as '{}', cannot redeclare as '{}'",
                current, name
            )))
        }
    }

    pub fn add_export(&self, key: String) {
        self.exports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    }

    pub fn is_exported(&self, key: &str) -> bool {
        self.exports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn exports(&self) -> BTreeSet<String> {
        self.exports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_parents() {
        let root = Context::new();
        root.define("add/2", Value::atom("f"));
        let child = root.frame().extend();
        assert_eq!(child.get_value("add/2").ok(), Some(Value::atom("f")));
        assert!(matches!(
            child.get_value("X"),
            Err(EvalError::UndefinedName(name)) if name == "X"
        ));
    }

    #[test]
    fn test_set_value_single_assignment() {
        let ctx = Context::new();
        assert!(ctx.set_value("X", Value::Int(1)).is_ok());
        assert!(ctx.set_value("X", Value::Int(1)).is_ok());
        assert!(matches!(
            ctx.set_value("X", Value::Int(2)),
            Err(EvalError::ConflictingBinding(_))
        ));
        ctx.define("X", Value::Int(2));
        assert_eq!(ctx.lookup("X"), Some(Value::Int(2)));
    }

    #[test]
    fn test_frame_bounds_lookup() {
        let root = Context::new();
        let caller = root.frame();
        caller.define("X", Value::Int(1));
        let callee = caller.frame();
        let clause = callee.extend();
        assert_eq!(clause.lookup_in_frame("X"), None);
        assert_eq!(clause.lookup("X"), Some(Value::Int(1)));

        callee.define("Y", Value::Int(2));
        assert_eq!(clause.lookup_in_frame("Y"), Some(Value::Int(2)));
    }

    #[test]
    fn test_capture_freezes_visible_variables() {
        let root = Context::new();
        root.define("f/0", Value::atom("f"));
        let shell = root.frame();
        shell.define("X", Value::Int(1));
        let clause = shell.extend();
        clause.define("Y", Value::Int(2));

        let captured = clause.capture();
        shell.define("Later", Value::Int(3));
        root.define("g/0", Value::atom("g"));

        assert_eq!(captured.lookup("X"), Some(Value::Int(1)));
        assert_eq!(captured.lookup("Y"), Some(Value::Int(2)));
        assert_eq!(captured.lookup("Later"), None);
        // Functions resolve through the root, including ones defined later.
        assert_eq!(captured.lookup("g/0"), Some(Value::atom("g")));
        assert!(captured.parent().is_some_and(|p| p.ptr_eq(&root)));
    }

    #[test]
    fn test_capture_stops_at_module_scope() {
        let root = Context::new();
        root.define("X", Value::Int(0));
        let module = root.module_scope(Arc::new(ModuleInfo::new()));
        let frame = module.frame();
        frame.define("X", Value::Int(1));

        let captured = frame.capture();
        assert_eq!(captured.lookup_local("X"), Some(Value::Int(1)));
        assert!(captured.parent().is_some_and(|p| p.ptr_eq(&module)));
    }

    #[test]
    fn test_merge_into_copies_local_bindings() {
        let target = Context::new();
        let scratch = target.extend();
        scratch.define("A", Value::Int(1));
        assert_eq!(target.lookup_local("A"), None);
        scratch.merge_into(&target);
        assert_eq!(target.lookup_local("A"), Some(Value::Int(1)));
    }

    #[test]
    fn test_module_name_is_set_once() {
        let info = ModuleInfo::new();
        assert!(info.set_name("m").is_ok());
        assert!(info.set_name("m").is_ok());
        assert!(info.set_name("n").is_err());
        assert_eq!(info.name(), Some("m"));
    }
}
