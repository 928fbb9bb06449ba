//! Callable values and clause dispatch.

use std::fmt;
use std::sync::Arc;

use ember_syntax::{Expr, FunctionDef};

use crate::matcher::match_value;
use crate::{Context, EvalError, Evaluator, Value};

/// The call contract shared by every callable value.
pub trait Callable: Send + Sync {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// Apply to already forced arguments. The result may be a delayed tail
    /// call; callers that need a value force it.
    fn apply(
        &self,
        evaluator: &Evaluator,
        ctx: &Context,
        args: Vec<Value>,
    ) -> Result<Value, EvalError>;

    fn check_arity(&self, args: &[Value]) -> Result<(), EvalError> {
        if args.len() == self.arity() {
            Ok(())
        } else {
            Err(EvalError::BadArity {
                name: format!("{}/{}", self.name(), self.arity()),
                expected: self.arity(),
                given: args.len(),
            })
        }
    }
}

/// A single function clause closed over its defining context.
pub struct Function {
    name: String,
    /// Parameter patterns, evaluated once in pattern mode
    params: Vec<Value>,
    body: Arc<Expr>,
    context: Context,
}

impl Function {
    pub fn new(name: String, params: Vec<Value>, body: Arc<Expr>, context: Context) -> Self {
        Self {
            name,
            params,
            body,
            context,
        }
    }

    /// Build a function from a parsed clause, evaluating its parameters as
    /// patterns in `context`.
    pub fn from_def(
        evaluator: &Evaluator,
        def: &FunctionDef,
        context: &Context,
    ) -> Result<Self, EvalError> {
        let params = evaluator.patterns(&def.params, context)?;
        Ok(Self::new(
            def.name.clone(),
            params,
            def.body.clone(),
            context.clone(),
        ))
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Match the arguments into a fresh frame of the defining context.
    /// `None` means the clause does not apply.
    pub fn try_bind(&self, args: &[Value]) -> Result<Option<Context>, EvalError> {
        self.check_arity(args)?;
        let frame = self.context.frame();
        for (param, arg) in self.params.iter().zip(args) {
            if !match_value(param, arg, &frame)? {
                return Ok(None);
            }
        }
        Ok(Some(frame))
    }

    fn run(&self, evaluator: &Evaluator, frame: &Context) -> Result<Value, EvalError> {
        evaluator.eval_body(&self.body, frame)
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    fn apply(
        &self,
        evaluator: &Evaluator,
        _ctx: &Context,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        match self.try_bind(&args)? {
            Some(frame) => self.run(evaluator, &frame),
            None => Err(EvalError::ClauseMismatch(format!(
                "{}/{}",
                self.name,
                self.params.len()
            ))),
        }
    }
}

/// Clauses sharing one name and arity, tried in order.
pub struct MultiFunction {
    name: String,
    arity: usize,
    clauses: Vec<Function>,
}

impl MultiFunction {
    /// Group clauses; any disagreement on name or arity is a `HeadMismatch`.
    pub fn new(clauses: Vec<Function>) -> Result<Self, EvalError> {
        let first = clauses.first().ok_or(EvalError::HeadMismatch)?;
        let (name, arity) = (first.name.clone(), first.arity());
        if clauses
            .iter()
            .any(|clause| clause.name != name || clause.arity() != arity)
        {
            return Err(EvalError::HeadMismatch);
        }
        Ok(Self {
            name,
            arity,
            clauses,
        })
    }

    pub fn clauses(&self) -> &[Function] {
        &self.clauses
    }
}

impl Callable for MultiFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn apply(
        &self,
        evaluator: &Evaluator,
        _ctx: &Context,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        self.check_arity(&args)?;
        for clause in &self.clauses {
            if let Some(frame) = clause.try_bind(&args)? {
                return clause.run(evaluator, &frame);
            }
        }
        Err(EvalError::FunctionClause {
            name: self.name.clone(),
            args,
        })
    }
}

type NativeFn = dyn Fn(&Evaluator, &Context, Vec<Value>) -> Result<Value, EvalError> + Send + Sync;

/// A host-implemented function.
pub struct NativeFunction {
    name: String,
    arity: usize,
    func: Arc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, arity: usize, func: F) -> Self
    where
        F: Fn(&Evaluator, &Context, Vec<Value>) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            arity,
            func: Arc::new(func),
        }
    }

    /// Registry key, `name/arity`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.name, self.arity)
    }

    pub fn into_value(self) -> Value {
        Value::Native(Arc::new(self))
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn apply(
        &self,
        evaluator: &Evaluator,
        ctx: &Context,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        self.check_arity(&args)?;
        (self.func)(evaluator, ctx, args)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native {}/{}>", self.name, self.arity)
    }
}

/// Build a function value from the clauses of a `fun` literal, or of a
/// multi-clause form.
pub(crate) fn group(mut clauses: Vec<Function>) -> Result<Value, EvalError> {
    if clauses.len() == 1 {
        if let Some(single) = clauses.pop() {
            return Ok(Value::Function(Arc::new(single)));
        }
    }
    MultiFunction::new(clauses).map(|multi| Value::MultiFunction(Arc::new(multi)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_STACK_SIZE, Node};

    fn body(source: &str) -> Arc<Expr> {
        Arc::new(ember_parser::parse_expr(source).0.expect("body"))
    }

    fn clause(name: &str, params: Vec<Value>, ctx: &Context) -> Function {
        Function::new(name.to_string(), params, body("ok"), ctx.clone())
    }

    #[test]
    fn test_try_bind_uses_a_fresh_frame_of_the_definition() {
        let root = Context::new();
        let f = clause(
            "f",
            vec![Value::Variable("X".into()), Value::atom("a")],
            &root,
        );

        let frame = f
            .try_bind(&[Value::Int(1), Value::atom("a")])
            .unwrap()
            .expect("clause applies");
        assert!(frame.is_frame());
        assert!(frame.parent().is_some_and(|p| p.ptr_eq(&root)));
        assert_eq!(frame.lookup_local("X"), Some(Value::Int(1)));
        assert!(root.lookup("X").is_none());

        assert!(f.try_bind(&[Value::Int(1), Value::atom("b")]).unwrap().is_none());
        assert!(matches!(
            f.try_bind(&[Value::Int(1)]),
            Err(EvalError::BadArity { expected: 2, given: 1, .. })
        ));
    }

    #[test]
    fn test_clauses_are_tried_in_order() {
        let node = Node::new(DEFAULT_STACK_SIZE);
        let evaluator = Evaluator::new(node.clone(), node.host_process());
        let root = Context::new();
        let zero = Function::new("g".into(), vec![Value::Int(0)], body("zero"), root.clone());
        let any = Function::new(
            "g".into(),
            vec![Value::Variable("_".into())],
            body("other"),
            root.clone(),
        );
        let g = Value::MultiFunction(Arc::new(MultiFunction::new(vec![zero, any]).unwrap()));

        assert_eq!(
            evaluator.call(&g, &root, vec![Value::Int(0)]).unwrap(),
            Value::atom("zero")
        );
        assert_eq!(
            evaluator.call(&g, &root, vec![Value::Int(5)]).unwrap(),
            Value::atom("other")
        );
    }
}
