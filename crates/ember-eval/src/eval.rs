//! Expression and form evaluation.
//!
//! One walker serves two purposes. In value mode it computes; in pattern
//! mode it builds the pattern skeleton handed to the matcher, where
//! variables stay unresolved and calls become unforced thunks.

use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicUsize};

use ember_syntax::{BinOp, Expr, ExprKind, Form, FormKind, UnaryOp};

use crate::context::ModuleInfo;
use crate::function::{Callable, Function, MultiFunction, NativeFunction, group};
use crate::matcher::{MatchBody, match_value};
use crate::module::Module;
use crate::node::Node;
use crate::process::ProcessHandle;
use crate::thunk::DelayedCall;
use crate::{Context, EvalError, Value};

/// Name given to anonymous functions.
pub const ANONYMOUS: &str = "-fun-";

/// Evaluation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Compute a value.
    Value,
    /// Build a pattern skeleton.
    Pattern,
}

/// Stack reserved for one level of expression nesting.
const STACK_PER_LEVEL: usize = 8 * 1024;

/// Evaluates on behalf of one process.
#[derive(Clone)]
pub struct Evaluator {
    node: Node,
    process: ProcessHandle,
    /// Current expression nesting, shared by clones
    depth: Arc<AtomicUsize>,
    max_depth: usize,
}

impl Evaluator {
    /// An evaluator whose nesting limit fits the node's process stack size.
    pub fn new(node: Node, process: ProcessHandle) -> Self {
        let max_depth = (node.stack_size() / STACK_PER_LEVEL).max(1);
        Self {
            node,
            process,
            depth: Arc::new(AtomicUsize::new(0)),
            max_depth,
        }
    }

    /// Override the nesting limit.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The process this evaluator runs for, as returned by `self()`.
    pub fn process(&self) -> &ProcessHandle {
        &self.process
    }

    /// Evaluate an expression. In value mode the result is fully forced.
    pub fn evaluate(&self, expr: &Expr, ctx: &Context, mode: Mode) -> Result<Value, EvalError> {
        let value = self.eval_expr(expr, ctx, mode, false)?;
        match mode {
            Mode::Value => value.force(),
            Mode::Pattern => Ok(value),
        }
    }

    /// Evaluate a function body. A call in tail position comes back as a
    /// delayed call for the caller to force.
    pub fn eval_body(&self, body: &Expr, ctx: &Context) -> Result<Value, EvalError> {
        self.eval_expr(body, ctx, Mode::Value, true)
    }

    pub(crate) fn eval_clause_body(
        &self,
        body: &Expr,
        ctx: &Context,
        tail: bool,
    ) -> Result<Value, EvalError> {
        self.eval_expr(body, ctx, Mode::Value, tail)
    }

    /// Evaluate parameter expressions as patterns.
    pub fn patterns(&self, exprs: &[Expr], ctx: &Context) -> Result<Vec<Value>, EvalError> {
        exprs
            .iter()
            .map(|expr| self.evaluate(expr, ctx, Mode::Pattern))
            .collect()
    }

    /// Apply a callable value without forcing the result.
    pub fn apply_value(
        &self,
        callee: &Value,
        ctx: &Context,
        args: Vec<Value>,
    ) -> Result<Value, EvalError> {
        let callable = callee
            .as_callable()
            .ok_or_else(|| EvalError::BadFunction(callee.clone()))?;
        callable.apply(self, ctx, args)
    }

    /// Apply a callable value and force the result.
    pub fn call(&self, callee: &Value, ctx: &Context, args: Vec<Value>) -> Result<Value, EvalError> {
        self.apply_value(callee, ctx, args)?.force()
    }

    /// Evaluate a top-level form against `ctx`: define a function under its
    /// `name/arity` key, or record a module attribute.
    pub fn eval_form(&self, form: &Form, ctx: &Context) -> Result<Value, EvalError> {
        match &form.kind {
            FormKind::Module(name) => {
                module_info(ctx, "-module")?.set_name(name)?;
                Ok(Value::atom(name))
            }
            FormKind::Export(names) => {
                let info = module_info(ctx, "-export")?;
                for name in names {
                    info.add_export(name.to_string());
                }
                Ok(Value::ok())
            }
            FormKind::Function(def) => {
                let function = Function::from_def(self, def, ctx)?;
                let value = Value::Function(Arc::new(function));
                ctx.define(&def.key(), value.clone());
                Ok(value)
            }
            FormKind::MultiFunction(defs) => {
                let clauses = defs
                    .iter()
                    .map(|def| Function::from_def(self, def, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                let multi = MultiFunction::new(clauses)?;
                let key = format!("{}/{}", multi.name(), multi.arity());
                let value = Value::MultiFunction(Arc::new(multi));
                ctx.define(&key, value.clone());
                Ok(value)
            }
        }
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        ctx: &Context,
        mode: Mode,
        tail: bool,
    ) -> Result<Value, EvalError> {
        let _depth = self.enter()?;
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(x) => Ok(Value::Float(*x)),
            ExprKind::String(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Atom(name) => Ok(Value::atom(name)),

            ExprKind::Var(name) => match mode {
                Mode::Pattern => Ok(Value::Variable(Arc::from(name.as_str()))),
                Mode::Value => ctx.get_value(name),
            },

            ExprKind::Tuple(items) => Ok(Value::tuple(self.eval_all(items, ctx, mode)?)),

            ExprKind::List { items, tail: rest } => {
                let items = self.eval_all(items, ctx, mode)?;
                let rest = match rest {
                    Some(rest) => self.eval_expr(rest, ctx, mode, false)?,
                    None => Value::Nil,
                };
                Ok(Value::list_with_tail(items, rest))
            }

            ExprKind::Call { func, args } => {
                if mode == Mode::Pattern {
                    ground_pattern(expr)?;
                }
                let args = self.eval_all(args, ctx, mode)?;
                let callee = self.resolve_local(func, args.len(), ctx)?;
                self.invoke(callee, ctx, args, mode, tail)
            }

            ExprKind::Remote { module, func, args } => {
                if mode == Mode::Pattern {
                    ground_pattern(expr)?;
                }
                let args = self.eval_all(args, ctx, mode)?;
                let callee = self.resolve_remote(module, func, args.len(), ctx)?;
                self.invoke(callee, ctx, args, mode, tail)
            }

            ExprKind::Binary { op, left, right } => {
                if mode == Mode::Pattern {
                    if !op.is_arithmetic() {
                        return Err(illegal(&format!("operator `{}`", op)));
                    }
                    ground_pattern(expr)?;
                }
                let left = self.eval_expr(left, ctx, mode, false)?;
                let right = self.eval_expr(right, ctx, mode, false)?;
                if is_delayed(&left) || is_delayed(&right) {
                    let op = *op;
                    let operator = NativeFunction::new(op.to_string(), 2, move |_, _, args| {
                        binary(op, &args[0], &args[1])
                    });
                    return Ok(self.defer(operator.into_value(), vec![left, right], ctx));
                }
                binary(*op, &left, &right)
            }

            ExprKind::Unary { op, operand } => {
                if mode == Mode::Pattern {
                    if *op != UnaryOp::Neg {
                        return Err(illegal(&format!("operator `{}`", op)));
                    }
                    ground_pattern(expr)?;
                }
                let operand = self.eval_expr(operand, ctx, mode, false)?;
                if is_delayed(&operand) {
                    let op = *op;
                    let operator = NativeFunction::new(op.to_string(), 1, move |_, _, args| {
                        unary(op, &args[0])
                    });
                    return Ok(self.defer(operator.into_value(), vec![operand], ctx));
                }
                unary(*op, &operand)
            }

            ExprKind::Match { pattern, value } => {
                value_only(mode, "a match expression")?;
                let subject = self.eval_expr(value, ctx, Mode::Value, false)?;
                let pattern = self.evaluate(pattern, ctx, Mode::Pattern)?;
                // Bindings only reach `ctx` once the whole pattern matched.
                let scratch = ctx.extend();
                if match_value(&pattern, &subject, &scratch)? {
                    scratch.merge_into(ctx);
                    Ok(subject)
                } else {
                    Err(EvalError::Badmatch(subject))
                }
            }

            ExprKind::Send { target, message } => {
                value_only(mode, "a send expression")?;
                let target = self.eval_expr(target, ctx, Mode::Value, false)?;
                let message = self.eval_expr(message, ctx, Mode::Value, false)?;
                match target {
                    Value::Pid(process) => {
                        process.send(message.clone());
                        Ok(message)
                    }
                    other => Err(EvalError::TypeError(format!(
                        "cannot send to {}, expected a pid",
                        other
                    ))),
                }
            }

            ExprKind::Block(exprs) => {
                value_only(mode, "a block")?;
                let Some((last, init)) = exprs.split_last() else {
                    return Ok(Value::Nil);
                };
                for expr in init {
                    self.eval_expr(expr, ctx, Mode::Value, false)?;
                }
                self.eval_expr(last, ctx, Mode::Value, tail)
            }

            ExprKind::Fun(clauses) => {
                value_only(mode, "a fun")?;
                let closure = ctx.capture();
                let functions = clauses
                    .iter()
                    .map(|clause| {
                        let params = self.patterns(&clause.params, ctx)?;
                        Ok(Function::new(
                            ANONYMOUS.to_string(),
                            params,
                            clause.body.clone(),
                            closure.clone(),
                        ))
                    })
                    .collect::<Result<Vec<_>, EvalError>>()?;
                group(functions)
            }

            ExprKind::FunRef {
                module,
                name,
                arity,
            } => {
                value_only(mode, "a function reference")?;
                match module {
                    Some(module) => self.module(module, ctx)?.function(name, *arity),
                    None => {
                        let key = format!("{}/{}", name, arity);
                        ctx.lookup(&key)
                            .ok_or(EvalError::UndefinedFunction(key))
                    }
                }
            }

            ExprKind::Receive(clauses) => {
                value_only(mode, "receive")?;
                // Force every pattern before the mailbox lock is taken.
                let bodies = clauses
                    .iter()
                    .map(|clause| {
                        let pattern = self
                            .evaluate(&clause.pattern, ctx, Mode::Pattern)?
                            .force_deep()?;
                        Ok(MatchBody::new(pattern, &clause.body))
                    })
                    .collect::<Result<Vec<_>, EvalError>>()?;
                let (index, bound) = self.process.receive(&bodies, ctx)?;
                bodies[index].evaluate(self, &bound, tail)
            }

            ExprKind::Case { subject, clauses } => {
                value_only(mode, "case")?;
                let subject = self.eval_expr(subject, ctx, Mode::Value, false)?;
                for clause in clauses {
                    let pattern = self.evaluate(&clause.pattern, ctx, Mode::Pattern)?;
                    let body = MatchBody::new(pattern, &clause.body);
                    if let Some(bound) = body.make_context(&subject, ctx)? {
                        return body.evaluate(self, &bound, tail);
                    }
                }
                Err(EvalError::CaseClause(subject))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr], ctx: &Context, mode: Mode) -> Result<Vec<Value>, EvalError> {
        exprs
            .iter()
            .map(|expr| self.eval_expr(expr, ctx, mode, false))
            .collect()
    }

    /// Call now, or hand back a delayed call in tail position and in
    /// patterns.
    fn invoke(
        &self,
        callee: Value,
        ctx: &Context,
        args: Vec<Value>,
        mode: Mode,
        tail: bool,
    ) -> Result<Value, EvalError> {
        if callee.as_callable().is_none() {
            return Err(EvalError::BadFunction(callee));
        }
        match (mode, tail) {
            (Mode::Pattern, _) => Ok(self.defer(callee, args, ctx)),
            (Mode::Value, true) => {
                let call = DelayedCall::new(self.clone(), callee, args, ctx.clone());
                Ok(Value::Delayed(Arc::new(call)))
            }
            (Mode::Value, false) => self.call(&callee, ctx, args),
        }
    }

    /// A pattern-side call. Its arguments may hold further delayed calls,
    /// which are forced along with it.
    fn defer(&self, callee: Value, args: Vec<Value>, ctx: &Context) -> Value {
        let call = DelayedCall::deferred(self.clone(), callee, args, ctx.clone());
        Value::Delayed(Arc::new(call))
    }

    fn enter(&self) -> Result<DepthGuard<'_>, EvalError> {
        let depth = self.depth.fetch_add(1, atomic::Ordering::Relaxed) + 1;
        let guard = DepthGuard(&self.depth);
        if depth > self.max_depth {
            return Err(EvalError::SystemLimit(self.max_depth));
        }
        Ok(guard)
    }

    /// A callee that evaluates to an atom names a `name/arity` in scope.
    fn resolve_local(&self, func: &Expr, arity: usize, ctx: &Context) -> Result<Value, EvalError> {
        match self.eval_expr(func, ctx, Mode::Value, false)? {
            Value::Atom(name) => {
                let key = format!("{}/{}", name, arity);
                ctx.lookup(&key)
                    .ok_or(EvalError::UndefinedFunction(key))
            }
            other => Ok(other),
        }
    }

    fn resolve_remote(
        &self,
        module: &Expr,
        func: &Expr,
        arity: usize,
        ctx: &Context,
    ) -> Result<Value, EvalError> {
        let module = match self.eval_expr(module, ctx, Mode::Value, false)? {
            Value::Atom(name) => self.module(&name, ctx)?,
            Value::Module(module) => module,
            other => return Err(EvalError::BadFunction(other)),
        };
        match self.eval_expr(func, ctx, Mode::Value, false)? {
            Value::Atom(name) => module.function(&name, arity),
            other => Err(EvalError::BadFunction(other)),
        }
    }

    fn module(&self, name: &str, ctx: &Context) -> Result<Arc<Module>, EvalError> {
        match ctx.lookup(name) {
            Some(Value::Module(module)) => Ok(module),
            _ => Err(EvalError::UndefinedFunction(format!(
                "{}: module is not loaded",
                name
            ))),
        }
    }
}

struct DepthGuard<'a>(&'a AtomicUsize);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, atomic::Ordering::Relaxed);
    }
}

fn is_delayed(value: &Value) -> bool {
    matches!(value, Value::Delayed(_))
}

fn module_info(ctx: &Context, attribute: &str) -> Result<Arc<ModuleInfo>, EvalError> {
    ctx.module().ok_or_else(|| {
        EvalError::ModuleAttribute(format!(
            "{} is only allowed while loading a module",
            attribute
        ))
    })
}

fn value_only(mode: Mode, what: &str) -> Result<(), EvalError> {
    match mode {
        Mode::Value => Ok(()),
        Mode::Pattern => Err(illegal(what)),
    }
}

fn illegal(what: &str) -> EvalError {
    EvalError::IllegalPattern(format!("{} is not allowed in a pattern", what))
}

/// Calls and arithmetic in a pattern are computed when it is matched, so
/// they may not mention pattern variables.
fn ground_pattern(expr: &Expr) -> Result<(), EvalError> {
    if expr.has_variable() {
        Err(EvalError::IllegalPattern(
            "calls and arithmetic in a pattern cannot use variables".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn bad_arith(op: BinOp, left: &Value, right: &Value) -> EvalError {
    EvalError::BadArith(format!("{} {} {}", left, op, right))
}

fn binary(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul => arith(op, left, right),
        BinOp::Div => match (left.as_number(), right.as_number()) {
            (Some(_), Some(b)) if b == 0.0 => Err(EvalError::DivisionByZero),
            (Some(a), Some(b)) => Ok(Value::Float(a / b)),
            _ => Err(bad_arith(op, left, right)),
        },
        BinOp::IntDiv | BinOp::Rem => match (left, right) {
            (Value::Int(_), Value::Int(0)) => Err(EvalError::DivisionByZero),
            (Value::Int(a), Value::Int(b)) => {
                let result = if op == BinOp::IntDiv {
                    a.checked_div(*b)
                } else {
                    a.checked_rem(*b)
                };
                result
                    .map(Value::Int)
                    .ok_or_else(|| bad_arith(op, left, right))
            }
            _ => Err(bad_arith(op, left, right)),
        },
        BinOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),
        BinOp::ExactEq => Ok(Value::Bool(left == right)),
        BinOp::ExactNe => Ok(Value::Bool(left != right)),
        BinOp::Lt => Ok(Value::Bool(left.compare(right)? == Ordering::Less)),
        BinOp::Le => Ok(Value::Bool(left.compare(right)? != Ordering::Greater)),
        BinOp::Gt => Ok(Value::Bool(left.compare(right)? == Ordering::Greater)),
        BinOp::Ge => Ok(Value::Bool(left.compare(right)? != Ordering::Less)),
    }
}

/// `+ - *`: integers stay integers, any float operand gives a float.
fn arith(op: BinOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let result = match op {
            BinOp::Add => a.checked_add(*b),
            BinOp::Sub => a.checked_sub(*b),
            _ => a.checked_mul(*b),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| EvalError::BadArith(format!("integer overflow in {} {} {}", a, op, b)));
    }

    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => Ok(Value::Float(match op {
            BinOp::Add => a + b,
            BinOp::Sub => a - b,
            _ => a * b,
        })),
        _ => Err(bad_arith(op, left, right)),
    }
}

fn unary(op: UnaryOp, operand: &Value) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::BadArith(format!("-{}", n))),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Neg, other) => Err(EvalError::BadArith(format!("-{}", other))),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Not, other) => Err(EvalError::TypeError(format!(
            "bad argument to not: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{DEFAULT_STACK_SIZE, Node};

    fn setup() -> (Evaluator, Context) {
        let node = Node::new(DEFAULT_STACK_SIZE);
        let process = node.host_process();
        (Evaluator::new(node, process), Context::new())
    }

    fn eval(evaluator: &Evaluator, ctx: &Context, source: &str) -> Result<Value, EvalError> {
        let (expr, diagnostics) = ember_parser::parse_expr(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        evaluator.evaluate(&expr.unwrap(), ctx, Mode::Value)
    }

    fn define(evaluator: &Evaluator, ctx: &Context, source: &str) -> Result<(), EvalError> {
        let (file, diagnostics) = ember_parser::parse(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        for form in &file.forms {
            evaluator.eval_form(form, ctx)?;
        }
        Ok(())
    }

    #[test]
    fn test_arithmetic_kinds() {
        let (e, ctx) = setup();
        assert_eq!(eval(&e, &ctx, "1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(eval(&e, &ctx, "1 + 2.5").unwrap(), Value::Float(3.5));
        assert_eq!(eval(&e, &ctx, "4 / 2").unwrap(), Value::Float(2.0));
        assert_eq!(eval(&e, &ctx, "7 div 2").unwrap(), Value::Int(3));
        assert_eq!(eval(&e, &ctx, "7 rem 2").unwrap(), Value::Int(1));
        assert!(matches!(eval(&e, &ctx, "1 div 0"), Err(EvalError::DivisionByZero)));
        assert!(matches!(eval(&e, &ctx, "1.0 div 2"), Err(EvalError::BadArith(_))));
    }

    #[test]
    fn test_comparisons() {
        let (e, ctx) = setup();
        assert_eq!(eval(&e, &ctx, "1 == 1.0").unwrap(), Value::Bool(true));
        assert_eq!(eval(&e, &ctx, "1 =:= 1.0").unwrap(), Value::Bool(false));
        assert_eq!(eval(&e, &ctx, "a < b").unwrap(), Value::Bool(true));
        assert_eq!(eval(&e, &ctx, "2 >= 2.0").unwrap(), Value::Bool(true));
        assert_eq!(eval(&e, &ctx, "not (1 /= 1)").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_pattern_mode_leaves_variables() {
        let (e, ctx) = setup();
        let (expr, _) = ember_parser::parse_expr("{a, X, [H | T]}");
        let skeleton = e.evaluate(&expr.unwrap(), &ctx, Mode::Pattern).unwrap();
        assert_eq!(skeleton.to_string(), "{a,X,[H|T]}");
    }

    #[test]
    fn test_pattern_call_with_variable_is_illegal() {
        let (e, ctx) = setup();
        define(&e, &ctx, "id(X) -> X.").unwrap();
        let (expr, _) = ember_parser::parse_expr("{id(X)}");
        let result = e.evaluate(&expr.unwrap(), &ctx, Mode::Pattern);
        assert!(matches!(result, Err(EvalError::IllegalPattern(_))));

        let (expr, _) = ember_parser::parse_expr("{id(1)}");
        let skeleton = e.evaluate(&expr.unwrap(), &ctx, Mode::Pattern).unwrap();
        assert!(matches!(&skeleton, Value::Tuple(items) if matches!(items[0], Value::Delayed(_))));
        assert_eq!(skeleton.force_deep().unwrap(), Value::tuple(vec![Value::Int(1)]));
    }

    #[test]
    fn test_match_binds_and_badmatch() {
        let (e, ctx) = setup();
        assert_eq!(eval(&e, &ctx, "{ok, X} = {ok, 5}").unwrap().to_string(), "{ok,5}");
        assert_eq!(ctx.lookup("X"), Some(Value::Int(5)));
        assert!(matches!(eval(&e, &ctx, "X = 6"), Err(EvalError::Badmatch(_))));
    }

    #[test]
    fn test_case_clause_order() {
        let (e, ctx) = setup();
        let source = "case {b, 2} of {a, N} -> N; {b, N} -> N * 10; _ -> none end";
        assert_eq!(eval(&e, &ctx, source).unwrap(), Value::Int(20));
        assert!(matches!(
            eval(&e, &ctx, "case c of a -> 1 end"),
            Err(EvalError::CaseClause(_))
        ));
    }

    #[test]
    fn test_fun_captures_context() {
        let (e, ctx) = setup();
        let source = "N = 10, F = fun (X) -> X + N end, F(5)";
        assert_eq!(eval(&e, &ctx, source).unwrap(), Value::Int(15));
    }

    #[test]
    fn test_multi_clause_fun_arity_mismatch() {
        let (e, ctx) = setup();
        let result = eval(&e, &ctx, "fun (0) -> zero; (A, B) -> two end");
        assert!(matches!(result, Err(EvalError::HeadMismatch)));
    }

    #[test]
    fn test_head_mismatch_on_form() {
        let (e, ctx) = setup();
        let result = define(&e, &ctx, "f(0) -> 1; g(1) -> 2.");
        assert!(matches!(result, Err(EvalError::HeadMismatch)));
        assert!(ctx.lookup("f/1").is_none());
    }

    #[test]
    fn test_module_attribute_outside_module() {
        let (e, ctx) = setup();
        let result = define(&e, &ctx, "-module(m).");
        assert!(matches!(result, Err(EvalError::ModuleAttribute(_))));
    }

    #[test]
    fn test_undefined_function() {
        let (e, ctx) = setup();
        assert!(matches!(
            eval(&e, &ctx, "nope(1)"),
            Err(EvalError::UndefinedFunction(key)) if key == "nope/1"
        ));
    }
}
