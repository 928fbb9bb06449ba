//! Runtime failures.

use crate::Value;
use thiserror::Error;

/// Evaluation errors.
///
/// `ClauseMismatch` and match failures are recovered from by clause trial
/// and receive; everything else ends the process that raised it.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    #[error("variable '{0}' is unbound")]
    UndefinedName(String),

    #[error("undefined function {0}")]
    UndefinedFunction(String),

    #[error("arguments do not match the clause of {0}")]
    ClauseMismatch(String),

    #[error("no function clause matching {}({})", .name, join(.args))]
    FunctionClause { name: String, args: Vec<Value> },

    #[error("head mismatch")]
    HeadMismatch,

    #[error("variable '{0}' is already bound to a different value")]
    ConflictingBinding(String),

    #[error("no match of right hand side value {0}")]
    Badmatch(Value),

    #[error("no case clause matching {0}")]
    CaseClause(Value),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("bad argument in arithmetic expression: {0}")]
    BadArith(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("{name} called with {given} arguments, expects {expected}")]
    BadArity {
        name: String,
        expected: usize,
        given: usize,
    },

    #[error("bad function {0}")]
    BadFunction(Value),

    #[error("system limit: expressions nested deeper than {0} levels")]
    SystemLimit(usize),

    #[error("illegal pattern: {0}")]
    IllegalPattern(String),

    #[error("{0}")]
    ModuleAttribute(String),

    #[error("{0}")]
    Load(String),

    #[error("failed to spawn process: {0}")]
    Spawn(String),

    #[error("output error: {0}")]
    Output(String),
}

fn join(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
