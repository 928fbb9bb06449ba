//! Runtime values.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::function::{Callable, Function, MultiFunction, NativeFunction};
use crate::module::Module;
use crate::process::ProcessHandle;
use crate::thunk::DelayedCall;
use crate::EvalError;

/// A runtime value.
///
/// Values are cheap to clone and may be shared between processes.
#[derive(Clone)]
pub enum Value {
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// `true` or `false`
    Bool(bool),
    /// String literal
    String(Arc<str>),
    /// Symbolic constant
    Atom(Arc<str>),
    /// An unresolved pattern variable, only produced in pattern mode
    Variable(Arc<str>),
    /// Fixed-arity tuple
    Tuple(Arc<[Value]>),
    /// The empty list
    Nil,
    /// A list cell; the tail may be any value for improper lists
    Cons(Arc<Cons>),
    /// A single-clause user function
    Function(Arc<Function>),
    /// A group of clauses sharing name and arity
    MultiFunction(Arc<MultiFunction>),
    /// Host-implemented function
    Native(Arc<NativeFunction>),
    /// A loaded module
    Module(Arc<Module>),
    /// Process identifier
    Pid(ProcessHandle),
    /// A call that has not been made yet
    Delayed(Arc<DelayedCall>),
}

/// A list cell.
pub struct Cons {
    pub head: Value,
    pub tail: Value,
}

impl Drop for Cons {
    // Long lists would otherwise drop recursively, one frame per cell.
    fn drop(&mut self) {
        let mut tail = std::mem::replace(&mut self.tail, Value::Nil);
        while let Value::Cons(cell) = tail {
            match Arc::try_unwrap(cell) {
                Ok(mut cons) => tail = std::mem::replace(&mut cons.tail, Value::Nil),
                Err(_) => break,
            }
        }
    }
}

impl Value {
    pub fn atom(name: &str) -> Value {
        Value::Atom(Arc::from(name))
    }

    pub fn string(text: &str) -> Value {
        Value::String(Arc::from(text))
    }

    pub fn tuple(items: Vec<Value>) -> Value {
        Value::Tuple(Arc::from(items))
    }

    pub fn ok() -> Value {
        Value::atom("ok")
    }

    pub fn cons(head: Value, tail: Value) -> Value {
        Value::Cons(Arc::new(Cons { head, tail }))
    }

    /// Build a proper list.
    pub fn list(items: Vec<Value>) -> Value {
        Value::list_with_tail(items, Value::Nil)
    }

    /// Build a list ending in `tail`, which is `Nil` for a proper list.
    pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
        items
            .into_iter()
            .rev()
            .fold(tail, |tail, head| Value::cons(head, tail))
    }

    /// Elements of a proper list, or `None` for anything else.
    pub fn list_items(&self) -> Option<Vec<Value>> {
        let mut items = Vec::new();
        let mut current = self;
        loop {
            match current {
                Value::Nil => return Some(items),
                Value::Cons(cell) => {
                    items.push(cell.head.clone());
                    current = &cell.tail;
                }
                _ => return None,
            }
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Value::Variable(_))
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Value::Atom(name) => Some(name),
            _ => None,
        }
    }

    /// Numeric view of ints and floats.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The call contract of any callable value.
    pub fn as_callable(&self) -> Option<&dyn Callable> {
        match self {
            Value::Function(f) => Some(f.as_ref()),
            Value::MultiFunction(f) => Some(f.as_ref()),
            Value::Native(f) => Some(f.as_ref()),
            _ => None,
        }
    }

    /// Short name of the value's kind, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::String(_) => "string",
            Value::Atom(_) => "atom",
            Value::Variable(_) => "variable",
            Value::Tuple(_) => "tuple",
            Value::Nil | Value::Cons(_) => "list",
            Value::Function(_) | Value::MultiFunction(_) | Value::Native(_) => "function",
            Value::Module(_) => "module",
            Value::Pid(_) => "pid",
            Value::Delayed(_) => "delayed call",
        }
    }

    /// Force a pending call, repeatedly, until a plain value remains.
    pub fn force(self) -> Result<Value, EvalError> {
        match self {
            Value::Delayed(call) => call.force(),
            value => Ok(value),
        }
    }

    /// Force pending calls anywhere inside tuples and lists.
    pub fn force_deep(self) -> Result<Value, EvalError> {
        match self.force()? {
            Value::Tuple(items) => {
                let items = items
                    .iter()
                    .cloned()
                    .map(Value::force_deep)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::tuple(items))
            }
            Value::Cons(cell) => {
                let head = cell.head.clone().force_deep()?;
                let tail = cell.tail.clone().force_deep()?;
                Ok(Value::cons(head, tail))
            }
            value => Ok(value),
        }
    }

    /// `==`: like structural equality, except that integers and floats
    /// compare by numeric value.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Cons(_), Value::Cons(_)) => {
                let (mut a, mut b) = (self, other);
                loop {
                    match (a, b) {
                        (Value::Cons(x), Value::Cons(y)) => {
                            if !x.head.loose_eq(&y.head) {
                                return false;
                            }
                            a = &x.tail;
                            b = &y.tail;
                        }
                        _ => return a.loose_eq(b),
                    }
                }
            }
            _ => self == other,
        }
    }

    /// Ordering for `<`, `=<`, `>` and `>=`. Defined for numbers, atoms and
    /// strings.
    pub fn compare(&self, other: &Value) -> Result<Ordering, EvalError> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Atom(a), Value::Atom(b)) | (Value::String(a), Value::String(b)) => {
                Ok(a.cmp(b))
            }
            _ => match (self.as_number(), other.as_number()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(|| {
                    EvalError::TypeError(format!("cannot order {} and {}", self, other))
                }),
                _ => Err(EvalError::TypeError(format!(
                    "cannot compare {} with {}",
                    self.type_name(),
                    other.type_name()
                ))),
            },
        }
    }
}

/// Exact structural equality: `1 == 1.0` is false here.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Atom(a), Value::Atom(b)) => a == b,
            (Value::Variable(a), Value::Variable(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Cons(_), Value::Cons(_)) => {
                let (mut a, mut b) = (self, other);
                loop {
                    match (a, b) {
                        (Value::Cons(x), Value::Cons(y)) => {
                            if Arc::ptr_eq(x, y) {
                                return true;
                            }
                            if x.head != y.head {
                                return false;
                            }
                            a = &x.tail;
                            b = &y.tail;
                        }
                        _ => return a == b,
                    }
                }
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::MultiFunction(a), Value::MultiFunction(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Arc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Arc::ptr_eq(a, b),
            (Value::Pid(a), Value::Pid(b)) => a == b,
            (Value::Delayed(a), Value::Delayed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Atom(name) => write_atom(f, name),
            Value::Variable(name) => write!(f, "{}", name),
            Value::Tuple(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Nil => write!(f, "[]"),
            Value::Cons(cell) => {
                write!(f, "[{}", cell.head)?;
                let mut tail = &cell.tail;
                loop {
                    match tail {
                        Value::Nil => break,
                        Value::Cons(next) => {
                            write!(f, ",{}", next.head)?;
                            tail = &next.tail;
                        }
                        other => {
                            write!(f, "|{}", other)?;
                            break;
                        }
                    }
                }
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "#Fun<{}/{}>", func.name(), func.arity()),
            Value::MultiFunction(func) => write!(f, "#Fun<{}/{}>", func.name(), func.arity()),
            Value::Native(func) => write!(f, "#Fun<{}/{}>", func.name(), func.arity()),
            Value::Module(module) => write!(f, "#Module<{}>", module.name()),
            Value::Pid(pid) => write!(f, "{}", pid),
            Value::Delayed(call) => write!(f, "#Delayed<{}>", call),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Atoms that would not read back as bare atoms are quoted.
fn write_atom(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    let mut chars = name.chars();
    let bare = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_alphanumeric() || c == '_' || c == '@');
    if bare {
        write!(f, "{}", name)
    } else {
        write!(f, "'{}'", name.replace('\'', "\\'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_terms() {
        let value = Value::tuple(vec![
            Value::atom("ok"),
            Value::list(vec![Value::Int(1), Value::Float(2.0)]),
            Value::list_with_tail(vec![Value::Int(1)], Value::Int(2)),
            Value::atom("Hello world"),
            Value::string("hi"),
        ]);
        assert_eq!(value.to_string(), "{ok,[1,2.0],[1|2],'Hello world',\"hi\"}");
    }

    #[test]
    fn test_exact_and_loose_equality() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert!(Value::Int(1).loose_eq(&Value::Float(1.0)));
        assert!(
            Value::list(vec![Value::Int(2)]).loose_eq(&Value::list(vec![Value::Float(2.0)]))
        );
    }

    #[test]
    fn test_long_list_drops_without_overflow() {
        let list = Value::list((0..200_000).map(Value::Int).collect());
        assert_eq!(list.list_items().map(|items| items.len()), Some(200_000));
        drop(list);
    }

    #[test]
    fn test_compare_mixed_numbers() {
        assert_eq!(Value::Int(1).compare(&Value::Float(1.5)).ok(), Some(Ordering::Less));
        assert!(Value::atom("a").compare(&Value::Int(1)).is_err());
    }
}
