//! The `lists` module.

use ember_eval::{EvalError, NativeFunction, Value};

/// Longest list `lists:seq/2` will build.
pub const MAX_SEQ_LENGTH: u64 = 1 << 24;

pub fn builtins() -> Vec<NativeFunction> {
    vec![
        // Shape
        NativeFunction::new("reverse", 1, |_, _, args| {
            let mut items = proper_list("reverse", &args[0])?;
            items.reverse();
            Ok(Value::list(items))
        }),
        NativeFunction::new("append", 2, |_, _, args| {
            let items = proper_list("append", &args[0])?;
            Ok(Value::list_with_tail(items, args[1].clone()))
        }),
        NativeFunction::new("seq", 2, |_, _, args| {
            let (Some(from), Some(to)) = (args[0].as_int(), args[1].as_int()) else {
                return Err(bad_argument("seq", &args[0]));
            };
            if to >= from && to.abs_diff(from) >= MAX_SEQ_LENGTH {
                return Err(EvalError::BadArith(format!(
                    "lists:seq({}, {}) is longer than {} elements",
                    from, to, MAX_SEQ_LENGTH
                )));
            }
            Ok(Value::list((from..=to).map(Value::Int).collect()))
        }),

        // Higher order
        NativeFunction::new("map", 2, |evaluator, ctx, args| {
            let items = proper_list("map", &args[1])?;
            let mapped = items
                .into_iter()
                .map(|item| evaluator.call(&args[0], ctx, vec![item]))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::list(mapped))
        }),
        NativeFunction::new("filter", 2, |evaluator, ctx, args| {
            let mut kept = Vec::new();
            for item in proper_list("filter", &args[1])? {
                match evaluator.call(&args[0], ctx, vec![item.clone()])? {
                    Value::Bool(true) => kept.push(item),
                    Value::Bool(false) => {}
                    other => return Err(bad_argument("filter", &other)),
                }
            }
            Ok(Value::list(kept))
        }),
        NativeFunction::new("foldl", 3, |evaluator, ctx, args| {
            proper_list("foldl", &args[2])?
                .into_iter()
                .try_fold(args[1].clone(), |acc, item| {
                    evaluator.call(&args[0], ctx, vec![item, acc])
                })
        }),

        // Queries
        NativeFunction::new("member", 2, |_, _, args| {
            let items = proper_list("member", &args[1])?;
            Ok(Value::Bool(items.contains(&args[0])))
        }),
        NativeFunction::new("nth", 2, |_, _, args| {
            let items = proper_list("nth", &args[1])?;
            args[0]
                .as_int()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|&n| n >= 1)
                .and_then(|n| items.get(n - 1).cloned())
                .ok_or_else(|| bad_argument("nth", &args[0]))
        }),
        NativeFunction::new("last", 1, |_, _, args| {
            proper_list("last", &args[0])?
                .pop()
                .ok_or_else(|| bad_argument("last", &args[0]))
        }),
        NativeFunction::new("sum", 1, |_, _, args| {
            proper_list("sum", &args[0])?
                .iter()
                .try_fold(Value::Int(0), |acc, item| add(&acc, item))
        }),
    ]
}

fn proper_list(name: &str, value: &Value) -> Result<Vec<Value>, EvalError> {
    value.list_items().ok_or_else(|| bad_argument(name, value))
}

fn add(acc: &Value, item: &Value) -> Result<Value, EvalError> {
    match (acc, item) {
        (Value::Int(a), Value::Int(b)) => a
            .checked_add(*b)
            .map(Value::Int)
            .ok_or_else(|| EvalError::BadArith(format!("integer overflow in {} + {}", a, b))),
        _ => match (acc.as_number(), item.as_number()) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(EvalError::BadArith(format!("{} + {}", acc, item))),
        },
    }
}

fn bad_argument(name: &str, value: &Value) -> EvalError {
    EvalError::TypeError(format!("bad argument to lists:{}: {}", name, value))
}
