//! Structural matching of pattern values against subject values.

use ember_syntax::Expr;

use crate::{Context, EvalError, Evaluator, Value};

/// Match `pattern` against `subject`, binding variables into `ctx`.
///
/// A failed match returns `Ok(false)` and may leave partial bindings
/// behind; callers match into a scratch scope they can throw away. Errors
/// only come from forcing a delayed call.
pub fn match_value(pattern: &Value, subject: &Value, ctx: &Context) -> Result<bool, EvalError> {
    let mut pattern = pattern.clone().force()?;
    let mut subject = subject.clone().force()?;

    // Lists are walked cell by cell so long tails do not recurse.
    loop {
        match (&pattern, &subject) {
            (Value::Variable(name), _) => return Ok(bind(name, &subject, ctx)),
            (Value::Tuple(patterns), Value::Tuple(subjects)) => {
                if patterns.len() != subjects.len() {
                    return Ok(false);
                }
                for (p, s) in patterns.iter().zip(subjects.iter()) {
                    if !match_value(p, s, ctx)? {
                        return Ok(false);
                    }
                }
                return Ok(true);
            }
            (Value::Cons(p), Value::Cons(s)) => {
                if !match_value(&p.head, &s.head, ctx)? {
                    return Ok(false);
                }
                let next_pattern = p.tail.clone().force()?;
                let next_subject = s.tail.clone().force()?;
                pattern = next_pattern;
                subject = next_subject;
            }
            _ => return Ok(pattern == subject),
        }
    }
}

/// Match into a fresh child of `parent`, returned only on success.
pub fn try_match(
    pattern: &Value,
    subject: &Value,
    parent: &Context,
) -> Result<Option<Context>, EvalError> {
    let ctx = parent.extend();
    if match_value(pattern, subject, &ctx)? {
        Ok(Some(ctx))
    } else {
        Ok(None)
    }
}

fn bind(name: &str, subject: &Value, ctx: &Context) -> bool {
    if name == "_" {
        return true;
    }
    match ctx.lookup_in_frame(name) {
        Some(existing) => existing == *subject,
        None => {
            ctx.define(name, subject.clone());
            true
        }
    }
}

/// A pattern paired with the body to run when it matches, as used by
/// `receive` and `case`.
pub struct MatchBody<'a> {
    pub pattern: Value,
    pub body: &'a Expr,
}

impl<'a> MatchBody<'a> {
    pub fn new(pattern: Value, body: &'a Expr) -> Self {
        Self { pattern, body }
    }

    /// Try the pattern against `subject` in a fresh child of `parent`.
    pub fn make_context(
        &self,
        subject: &Value,
        parent: &Context,
    ) -> Result<Option<Context>, EvalError> {
        try_match(&self.pattern, subject, parent)
    }

    /// Run the body in a context produced by `make_context`.
    pub fn evaluate(
        &self,
        evaluator: &Evaluator,
        ctx: &Context,
        tail: bool,
    ) -> Result<Value, EvalError> {
        evaluator.eval_clause_body(self.body, ctx, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Value {
        Value::Variable(name.into())
    }

    #[test]
    fn test_atom_matching() {
        let ctx = Context::new();
        assert!(match_value(&Value::atom("a"), &Value::atom("a"), &ctx).unwrap());
        assert!(!match_value(&Value::atom("a"), &Value::atom("b"), &ctx).unwrap());
        assert!(ctx.local_names().is_empty());
    }

    #[test]
    fn test_variable_binds_subject() {
        let ctx = Context::new();
        assert!(match_value(&var("X"), &Value::Int(123), &ctx).unwrap());
        assert_eq!(ctx.get_value("X").ok(), Some(Value::Int(123)));
    }

    #[test]
    fn test_tuple_matching() {
        let root = Context::new();
        let pattern = Value::tuple(vec![Value::atom("a"), var("X")]);
        let subject = Value::tuple(vec![Value::atom("a"), Value::Int(1)]);
        let bound = try_match(&pattern, &subject, &root).unwrap().unwrap();
        assert_eq!(bound.get_value("X").ok(), Some(Value::Int(1)));

        let other = Value::tuple(vec![Value::atom("b"), Value::Int(1)]);
        let pattern = Value::tuple(vec![Value::atom("a"), Value::Int(1)]);
        assert!(try_match(&pattern, &other, &root).unwrap().is_none());
        assert!(root.local_names().is_empty());
    }

    #[test]
    fn test_repeated_variable_must_agree() {
        let ctx = Context::new();
        let pattern = Value::tuple(vec![var("X"), var("X")]);
        let same = Value::tuple(vec![Value::Int(1), Value::Int(1)]);
        let different = Value::tuple(vec![Value::Int(1), Value::Int(2)]);
        assert!(try_match(&pattern, &same, &ctx).unwrap().is_some());
        assert!(try_match(&pattern, &different, &ctx).unwrap().is_none());
    }

    #[test]
    fn test_open_tail_captures_rest() {
        let ctx = Context::new();
        let pattern = Value::list_with_tail(vec![var("H")], var("T"));
        let subject = Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(match_value(&pattern, &subject, &ctx).unwrap());
        assert_eq!(ctx.lookup("H"), Some(Value::Int(1)));
        assert_eq!(
            ctx.lookup("T"),
            Some(Value::list(vec![Value::Int(2), Value::Int(3)]))
        );
    }

    #[test]
    fn test_underscore_never_binds_and_int_is_not_float() {
        let ctx = Context::new();
        assert!(match_value(&var("_"), &Value::Int(1), &ctx).unwrap());
        assert!(ctx.lookup("_").is_none());
        assert!(!match_value(&Value::Int(1), &Value::Float(1.0), &ctx).unwrap());
        assert!(!match_value(&Value::Nil, &Value::tuple(vec![]), &ctx).unwrap());
    }
}
