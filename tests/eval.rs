//! Integration tests for ember-eval crate.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ember_eval::{
    Context, DEFAULT_STACK_SIZE, EvalError, Evaluator, Function, Mode, MultiFunction,
    NativeFunction, Node, Value, builtin, match_value, try_match,
};
use ember_parser::{parse, parse_expr};

struct Session {
    evaluator: Evaluator,
    root: Context,
    /// Top-level variables, kept out of the function registry
    shell: Context,
}

impl Session {
    fn new() -> Self {
        let node = Node::new(DEFAULT_STACK_SIZE);
        let evaluator = Evaluator::new(node.clone(), node.host_process());
        let root = Context::new();
        builtin::install(&root);
        let shell = root.frame();
        Self {
            evaluator,
            root,
            shell,
        }
    }

    fn with_max_depth(max_depth: usize) -> Self {
        let mut session = Self::new();
        session.evaluator = session.evaluator.with_max_depth(max_depth);
        session
    }

    /// Define `name/0` as a native that counts its calls and returns 1.
    fn counter(&self, name: &str) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let native = NativeFunction::new(name, 0, move |_, _, _| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int(1))
        });
        self.root.define(&native.key(), native.into_value());
        calls
    }

    fn define(&self, source: &str) -> Result<Value, EvalError> {
        let (file, diagnostics) = parse(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        let mut last = Value::ok();
        for form in &file.forms {
            last = self.evaluator.eval_form(form, &self.root)?;
        }
        Ok(last)
    }

    fn eval(&self, source: &str) -> Result<Value, EvalError> {
        let (expr, diagnostics) = parse_expr(source);
        assert!(diagnostics.is_empty(), "{:?}", diagnostics);
        self.evaluator
            .evaluate(&expr.expect("expression"), &self.shell, Mode::Value)
    }

    fn pattern(&self, source: &str) -> Value {
        let (expr, _) = parse_expr(source);
        self.evaluator
            .evaluate(&expr.expect("pattern"), &self.root, Mode::Pattern)
            .unwrap()
    }
}

// ============================================================================
// Function dispatch
// ============================================================================

#[test]
fn test_clause_trial_order() {
    let s = Session::new();
    s.define("f(0) -> 1; f(1) -> 1; f(X) -> f(X - 1) + f(X - 2).")
        .unwrap();
    assert_eq!(s.eval("f(4)").unwrap(), Value::Int(5));
    assert_eq!(s.eval("f(10)").unwrap(), Value::Int(89));
}

#[test]
fn test_single_clause_call_frame() {
    let s = Session::new();
    // Report what the calling frame can see.
    let frame_names = NativeFunction::new("frame_names", 0, |_, ctx, _| {
        let add = ctx.lookup("add/2").expect("add/2 visible from the frame");
        Ok(Value::tuple(vec![
            ctx.get_value("X")?,
            ctx.get_value("Y")?,
            Value::Bool(add.as_callable().is_some()),
        ]))
    });
    s.root.define(&frame_names.key(), frame_names.into_value());

    s.define("add(X, Y) -> X + Y.").unwrap();
    assert_eq!(s.eval("add(1, 2)").unwrap(), Value::Int(3));

    s.define("add(X, Y) -> Seen = frame_names(), {Seen, X + Y}.").unwrap();
    assert_eq!(s.eval("add(1, 2)").unwrap().to_string(), "{{1,2,true},3}");
}

#[test]
fn test_call_frames_do_not_leak() {
    let s = Session::new();
    s.define("add(X, Y) -> X + Y.").unwrap();
    s.eval("add(1, 2)").unwrap();
    assert!(s.root.lookup("X").is_none());
    assert!(matches!(s.eval("X"), Err(EvalError::UndefinedName(_))));
}

#[test]
fn test_head_mismatch_wherever_it_is() {
    let s = Session::new();
    for source in [
        "f(0) -> 1; g(1) -> 1; f(X) -> X.",
        "f(0) -> 1; f(1) -> 1; f(X, Y) -> X.",
        "g(0) -> 1; f(1) -> 1; f(X) -> X.",
    ] {
        assert!(
            matches!(s.define(source), Err(EvalError::HeadMismatch)),
            "{}",
            source
        );
    }
    assert!(matches!(MultiFunction::new(Vec::new()), Err(EvalError::HeadMismatch)));
}

#[test]
fn test_head_mismatch_from_values() {
    let s = Session::new();
    let body = Arc::new(parse_expr("ok").0.unwrap());
    let one = Function::new("f".into(), vec![Value::Int(0)], body.clone(), s.root.clone());
    let two = Function::new(
        "f".into(),
        vec![Value::Int(0), Value::Int(1)],
        body,
        s.root.clone(),
    );
    assert!(matches!(MultiFunction::new(vec![one, two]), Err(EvalError::HeadMismatch)));
}

#[test]
fn test_no_matching_clause() {
    let s = Session::new();
    s.define("sign(0) -> zero; sign(1) -> one.").unwrap();
    let err = s.eval("sign(2)").unwrap_err();
    assert!(matches!(err, EvalError::FunctionClause { .. }));
    assert_eq!(err.to_string(), "no function clause matching sign(2)");

    s.define("only(a) -> ok.").unwrap();
    assert!(matches!(s.eval("only(b)"), Err(EvalError::ClauseMismatch(_))));
}

#[test]
fn test_bad_arity_and_bad_function() {
    let s = Session::new();
    assert!(matches!(
        s.eval("F = fun (X) -> X end, F(1, 2)"),
        Err(EvalError::BadArity { expected: 1, given: 2, .. })
    ));
    assert!(matches!(s.eval("N = 1, N(2)"), Err(EvalError::BadFunction(_))));
}

// ============================================================================
// Matching
// ============================================================================

#[test]
fn test_atom_matching() {
    let s = Session::new();
    let ctx = s.root.frame();
    assert!(match_value(&Value::atom("a"), &Value::atom("a"), &ctx).unwrap());
    assert!(!match_value(&Value::atom("a"), &Value::atom("b"), &ctx).unwrap());
    assert!(ctx.local_names().is_empty());
}

#[test]
fn test_variable_matching() {
    let s = Session::new();
    let bound = try_match(&s.pattern("X"), &Value::Int(123), &s.root)
        .unwrap()
        .expect("match");
    assert_eq!(bound.lookup("X"), Some(Value::Int(123)));
}

#[test]
fn test_tuple_matching() {
    let s = Session::new();
    let subject = Value::tuple(vec![Value::atom("a"), Value::Int(1)]);

    let bound = try_match(&s.pattern("{a, X}"), &subject, &s.root)
        .unwrap()
        .expect("match");
    assert_eq!(bound.lookup("X"), Some(Value::Int(1)));

    let ctx = s.root.frame();
    assert!(!match_value(&s.pattern("{b, 1}"), &subject, &ctx).unwrap());
    assert!(ctx.local_names().is_empty());
}

#[test]
fn test_repeated_variable_must_agree() {
    let s = Session::new();
    assert_eq!(s.eval("{X, X} = {1, 1}").unwrap().to_string(), "{1,1}");
    assert!(matches!(s.eval("{Y, Y} = {1, 2}"), Err(EvalError::Badmatch(_))));
}

#[test]
fn test_list_patterns() {
    let s = Session::new();
    s.define("sum([]) -> 0; sum([H | T]) -> H + sum(T).").unwrap();
    assert_eq!(s.eval("sum([1, 2, 3, 4])").unwrap(), Value::Int(10));
    assert_eq!(s.eval("[A, B | Rest] = [1, 2, 3], Rest").unwrap().to_string(), "[3]");
}

#[test]
fn test_wildcard_never_binds() {
    let s = Session::new();
    assert_eq!(s.eval("{_, _} = {1, 2}").unwrap().to_string(), "{1,2}");
    assert!(s.shell.lookup("_").is_none());
}

#[test]
fn test_call_in_pattern_is_forced_when_matched() {
    let s = Session::new();
    s.define("two() -> 2.").unwrap();
    assert_eq!(
        s.eval("case {ok, 2} of {ok, two()} -> yes; _ -> no end").unwrap(),
        Value::atom("yes")
    );
    assert!(matches!(
        s.eval("case 1 of two(X) -> yes end"),
        Err(EvalError::IllegalPattern(_))
    ));
}

#[test]
fn test_failed_match_binds_nothing() {
    let s = Session::new();
    assert!(matches!(s.eval("{Leak, 1} = {5, 2}"), Err(EvalError::Badmatch(_))));
    assert!(matches!(s.eval("Leak"), Err(EvalError::UndefinedName(name)) if name == "Leak"));
    assert_eq!(s.eval("{Leak, 1} = {6, 1}, Leak").unwrap(), Value::Int(6));
    assert!(matches!(s.eval("{A, B, A} = {1, 2, 3}"), Err(EvalError::Badmatch(_))));
    assert!(s.shell.lookup_local("A").is_none());
    assert!(s.shell.lookup_local("B").is_none());
}

#[test]
fn test_pattern_calls_run_only_when_matched() {
    let s = Session::new();
    let ticks = s.counter("tick");
    s.define("id(X) -> X.").unwrap();
    s.define("f(tick()) -> direct; f(id(tick())) -> nested.").unwrap();
    s.define("g(1 + id(tick())) -> two.").unwrap();
    assert_eq!(ticks.load(Ordering::SeqCst), 0);

    assert_eq!(s.eval("f(1)").unwrap(), Value::atom("direct"));
    assert_eq!(ticks.load(Ordering::SeqCst), 1);
    // A forced pattern call keeps its value.
    assert_eq!(s.eval("f(1)").unwrap(), Value::atom("direct"));
    assert_eq!(ticks.load(Ordering::SeqCst), 1);

    assert_eq!(s.eval("g(2)").unwrap(), Value::atom("two"));
    assert_eq!(ticks.load(Ordering::SeqCst), 2);
}

#[test]
fn test_illegal_patterns() {
    let s = Session::new();
    for source in ["{X = 1} = {1}", "(1 < 2) = true", "(P ! m) = m", "(-X) = 1"] {
        assert!(
            matches!(s.eval(source), Err(EvalError::IllegalPattern(_))),
            "{}",
            source
        );
    }
    assert_eq!(s.eval("3 = 1 + 2").unwrap(), Value::Int(3));
}

// ============================================================================
// Scoping and tail calls
// ============================================================================

#[test]
fn test_case_bindings_stay_inside() {
    let s = Session::new();
    s.define("pick(T) -> case T of {a, V} -> V; _ -> none end, V.")
        .unwrap();
    assert!(matches!(s.eval("pick({a, 1})"), Err(EvalError::UndefinedName(_))));
}

#[test]
fn test_fun_closes_over_bindings_at_creation() {
    let s = Session::new();
    assert_eq!(s.eval("A = 1, G = fun () -> A end, G()").unwrap(), Value::Int(1));
    assert!(matches!(
        s.eval("F = fun () -> Later end, Later = 3, F()"),
        Err(EvalError::UndefinedName(name)) if name == "Later"
    ));
}

#[test]
fn test_fun_inside_a_function_captures_its_frame() {
    let s = Session::new();
    s.define("adder(N) -> fun (X) -> X + N end.").unwrap();
    s.define("apply_to(F, X) -> N = 100, F(X).").unwrap();
    assert_eq!(s.eval("apply_to(adder(5), 1)").unwrap(), Value::Int(6));
}

#[test]
fn test_fun_sees_functions_defined_later() {
    let s = Session::new();
    s.eval("H = fun () -> late() end").unwrap();
    s.define("late() -> here.").unwrap();
    assert_eq!(s.eval("H()").unwrap(), Value::atom("here"));
}

#[test]
fn test_deep_recursion_hits_system_limit() {
    let s = Session::with_max_depth(200);
    s.define("deep(0) -> 0; deep(N) -> 1 + deep(N - 1).").unwrap();
    assert!(matches!(s.eval("deep(1000)"), Err(EvalError::SystemLimit(200))));
    // The nesting count unwinds with the error.
    assert_eq!(s.eval("deep(10)").unwrap(), Value::Int(10));
}

#[test]
fn test_tail_recursion_does_not_grow_the_stack() {
    let s = Session::new();
    s.define("loop(0, Acc) -> Acc; loop(N, Acc) -> loop(N - 1, Acc + 1).")
        .unwrap();
    assert_eq!(s.eval("loop(100000, 0)").unwrap(), Value::Int(100_000));
}

#[test]
fn test_mutual_tail_recursion() {
    let s = Session::new();
    s.define("even(0) -> true; even(N) -> odd(N - 1).").unwrap();
    s.define("odd(0) -> false; odd(N) -> even(N - 1).").unwrap();
    assert_eq!(s.eval("even(100001)").unwrap(), Value::Bool(false));
}

#[test]
fn test_long_lists_build_and_drop() {
    let s = Session::new();
    s.define("build(0, L) -> L; build(N, L) -> build(N - 1, [N | L]).")
        .unwrap();
    s.define("len([], N) -> N; len([_ | T], N) -> len(T, N + 1).")
        .unwrap();
    assert_eq!(s.eval("len(build(200000, []), 0)").unwrap(), Value::Int(200_000));
}

#[test]
fn test_integer_overflow_is_bad_arith() {
    let s = Session::new();
    assert!(matches!(
        s.eval("9223372036854775807 + 1"),
        Err(EvalError::BadArith(_))
    ));
}
