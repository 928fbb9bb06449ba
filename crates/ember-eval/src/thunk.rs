//! Deferred calls.
//!
//! A `DelayedCall` is produced for calls in tail position, and for calls
//! that appear inside patterns. Forcing runs the call in a loop, so a chain
//! of tail calls never grows the host stack.

use std::fmt;
use std::sync::OnceLock;

use crate::{Context, EvalError, Evaluator, Value};

/// A call whose callee and arguments are already evaluated but which has
/// not been applied yet.
pub struct DelayedCall {
    evaluator: Evaluator,
    callee: Value,
    args: Vec<Value>,
    context: Context,
    /// Set for calls built in a pattern, whose arguments may still hold
    /// delayed calls
    deferred_args: bool,
    result: OnceLock<Value>,
}

impl DelayedCall {
    pub fn new(evaluator: Evaluator, callee: Value, args: Vec<Value>, context: Context) -> Self {
        Self {
            evaluator,
            callee,
            args,
            context,
            deferred_args: false,
            result: OnceLock::new(),
        }
    }

    /// A call whose arguments are forced, all the way down, when the call
    /// itself is.
    pub fn deferred(evaluator: Evaluator, callee: Value, args: Vec<Value>, context: Context) -> Self {
        Self {
            deferred_args: true,
            ..Self::new(evaluator, callee, args, context)
        }
    }

    pub fn is_forced(&self) -> bool {
        self.result.get().is_some()
    }

    /// Apply the call, and every call it returns in tail position, until a
    /// plain value remains. The first successful result is cached.
    pub fn force(&self) -> Result<Value, EvalError> {
        if let Some(value) = self.result.get() {
            return Ok(value.clone());
        }

        let mut value = self.step()?;
        while let Value::Delayed(next) = value {
            value = match next.result.get() {
                Some(done) => done.clone(),
                None => next.step()?,
            };
        }

        Ok(self.result.get_or_init(|| value).clone())
    }

    /// Apply once; the result may itself be delayed.
    fn step(&self) -> Result<Value, EvalError> {
        let args = if self.deferred_args {
            self.args
                .iter()
                .cloned()
                .map(Value::force_deep)
                .collect::<Result<Vec<_>, _>>()?
        } else {
            self.args.clone()
        };
        self.evaluator.apply_value(&self.callee, &self.context, args)
    }
}

impl fmt::Display for DelayedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}
