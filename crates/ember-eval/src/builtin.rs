//! Built-in functions, bound in every root context.

use crate::function::NativeFunction;
use crate::{Context, EvalError, Value};

/// Get all built-in functions.
pub fn builtins() -> Vec<NativeFunction> {
    vec![
        // === Processes ===
        NativeFunction::new("spawn", 1, |evaluator, ctx, mut args| {
            let entry = args.remove(0);
            let process = evaluator.node().spawn(entry, ctx.clone())?;
            Ok(Value::Pid(process))
        }),
        NativeFunction::new("self", 0, |evaluator, _, _| {
            Ok(Value::Pid(evaluator.process().clone()))
        }),

        // === Lists ===
        NativeFunction::new("hd", 1, |_, _, args| match &args[0] {
            Value::Cons(cell) => Ok(cell.head.clone()),
            other => Err(bad_argument("hd", other)),
        }),
        NativeFunction::new("tl", 1, |_, _, args| match &args[0] {
            Value::Cons(cell) => Ok(cell.tail.clone()),
            other => Err(bad_argument("tl", other)),
        }),
        NativeFunction::new("length", 1, |_, _, args| {
            let items = args[0]
                .list_items()
                .ok_or_else(|| bad_argument("length", &args[0]))?;
            Ok(Value::Int(items.len() as i64))
        }),

        // === Tuples ===
        NativeFunction::new("element", 2, |_, _, args| {
            let (Some(index), Value::Tuple(items)) = (args[0].as_int(), &args[1]) else {
                return Err(bad_argument("element", &args[1]));
            };
            usize::try_from(index)
                .ok()
                .filter(|&i| i >= 1)
                .and_then(|i| items.get(i - 1))
                .cloned()
                .ok_or_else(|| bad_argument("element", &args[0]))
        }),
        NativeFunction::new("tuple_size", 1, |_, _, args| match &args[0] {
            Value::Tuple(items) => Ok(Value::Int(items.len() as i64)),
            other => Err(bad_argument("tuple_size", other)),
        }),

        // === Type tests ===
        type_test("is_atom", |v| matches!(v, Value::Atom(_))),
        type_test("is_integer", |v| matches!(v, Value::Int(_))),
        type_test("is_float", |v| matches!(v, Value::Float(_))),
        type_test("is_number", |v| v.as_number().is_some()),
        type_test("is_boolean", |v| matches!(v, Value::Bool(_))),
        type_test("is_list", |v| matches!(v, Value::Nil | Value::Cons(_))),
        type_test("is_tuple", |v| matches!(v, Value::Tuple(_))),
        type_test("is_pid", |v| matches!(v, Value::Pid(_))),
        type_test("is_function", |v| v.as_callable().is_some()),
    ]
}

/// Bind every built-in under its `name/arity` key.
pub fn install(ctx: &Context) {
    for builtin in builtins() {
        ctx.define(&builtin.key(), builtin.into_value());
    }
}

fn type_test(name: &'static str, test: fn(&Value) -> bool) -> NativeFunction {
    NativeFunction::new(name, 1, move |_, _, args| Ok(Value::Bool(test(&args[0]))))
}

fn bad_argument(name: &str, value: &Value) -> EvalError {
    EvalError::TypeError(format!("bad argument to {}: {}", name, value))
}
