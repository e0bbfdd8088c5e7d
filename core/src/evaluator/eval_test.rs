//! Unit tests for the evaluator.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use super::*;
use crate::api::{Binding, CompiledScript, Engine, EngineOptions, ExecutionOptions};
use crate::parser::Span;
use crate::stdlib::register_stdlib;
use crate::test_utils::init_test_logging;
use crate::values::{Arity, Function, NativeFunction};

struct Runner {
    engine: Engine,
    options: ExecutionOptions,
}

impl Runner {
    fn new() -> Self {
        Self {
            engine: Engine::default(),
            options: ExecutionOptions::default(),
        }
    }

    fn with_options(options: ExecutionOptions) -> Self {
        Self {
            options,
            ..Self::new()
        }
    }

    fn compile(&self, input: &str) -> CompiledScript {
        self.engine.compile("test", input).expect("compilation failed")
    }

    fn run(&self, input: &str) -> Result<Value, EvaluationError> {
        self.run_with(input, &[])
    }

    fn run_with(&self, input: &str, arguments: &[(&str, Value)]) -> Result<Value, EvaluationError> {
        let binding = Binding::from_pairs(arguments.iter().cloned()).expect("invalid binding");
        evaluate(&self.compile(input), binding, &self.options)
    }

    fn fault(&self, input: &str) -> RuntimeFault {
        match self.run(input) {
            Err(EvaluationError::RuntimeFault { cause, .. }) => cause,
            other => panic!("expected a runtime fault, got {other:?}"),
        }
    }
}

#[test]
fn test_literals() {
    let runner = Runner::new();
    assert_eq!(runner.run("42"), Ok(Value::Int(42)));
    assert_eq!(runner.run("-1.5"), Ok(Value::Float(-1.5)));
    assert_eq!(runner.run("\"hi\\n\""), Ok(Value::from("hi\n")));
    assert_eq!(runner.run("nil"), Ok(Value::Nil));
    assert_eq!(runner.run("()"), Ok(Value::list([])));
    assert_eq!(
        runner.run("[1 (+ 1 1) \"three\"]"),
        Ok(Value::list([Value::Int(1), Value::Int(2), Value::from("three")]))
    );
}

#[test]
fn test_top_level_forms_run_in_order() {
    let runner = Runner::new();
    assert_eq!(runner.run("1 2 3"), Ok(Value::Int(3)));
    assert_eq!(runner.run("(do)"), Ok(Value::Nil));
}

#[test]
fn test_free_variables() {
    let runner = Runner::new();
    assert_eq!(
        runner.run_with("(+ 1 x)", &[("x", Value::Int(5))]),
        Ok(Value::Int(6))
    );
    // Extra entries are ignored.
    assert_eq!(
        runner.run_with("x", &[("x", Value::Int(1)), ("unused", Value::Nil)]),
        Ok(Value::Int(1))
    );
}

#[test]
fn test_unbound_symbol_reports_first_sorted_name() {
    let runner = Runner::new();
    let err = runner
        .run_with("(+ zeta alpha beta)", &[("beta", Value::Int(1))])
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::UnboundSymbol {
            script: "test".into(),
            name: "alpha".into(),
            span: Span(8..13),
        }
    );
    assert!(err.is_unbound_symbol());
}

#[test]
fn test_unbound_symbol_checked_before_running() {
    // The division would fault, but the missing binding wins.
    let runner = Runner::new();
    let err = runner.run("(do (/ 1 0) y)").unwrap_err();
    assert!(err.is_unbound_symbol());
}

#[test]
fn test_if() {
    let runner = Runner::new();
    assert_eq!(runner.run("(if true 1 2)"), Ok(Value::Int(1)));
    assert_eq!(runner.run("(if nil 1 2)"), Ok(Value::Int(2)));
    assert_eq!(runner.run("(if 0 1 2)"), Ok(Value::Int(1)));
    assert_eq!(runner.run("(if false 1)"), Ok(Value::Nil));
    // The untaken branch is never evaluated.
    assert_eq!(runner.run("(if true 1 (/ 1 0))"), Ok(Value::Int(1)));
}

#[test]
fn test_and_or_return_deciding_value() {
    let runner = Runner::new();
    assert_eq!(runner.run("(and)"), Ok(Value::Bool(true)));
    assert_eq!(runner.run("(or)"), Ok(Value::Nil));
    assert_eq!(runner.run("(and 1 2 3)"), Ok(Value::Int(3)));
    assert_eq!(runner.run("(and 1 nil (/ 1 0))"), Ok(Value::Nil));
    assert_eq!(runner.run("(or nil false 7 (/ 1 0))"), Ok(Value::Int(7)));
    assert_eq!(runner.run("(or nil false)"), Ok(Value::Bool(false)));
}

#[test]
fn test_let_is_sequential_and_shadows() {
    let runner = Runner::new();
    assert_eq!(runner.run("(let [a 1 b (+ a 1)] (* a b))"), Ok(Value::Int(2)));
    assert_eq!(
        runner.run_with("(let [x (* x 10)] x)", &[("x", Value::Int(4))]),
        Ok(Value::Int(40))
    );
    assert_eq!(runner.run("(let [a 1] (let [a 2] a))"), Ok(Value::Int(2)));
    assert_eq!(runner.run("(let [a 1] (let [b 2] b) a)"), Ok(Value::Int(1)));
}

#[test]
fn test_closures() {
    let runner = Runner::new();
    assert_eq!(runner.run("((fn [x y] (+ x y)) 2 3)"), Ok(Value::Int(5)));
    assert_eq!(
        runner.run("(let [add (fn [a] (fn [b] (+ a b)))] ((add 10) 5))"),
        Ok(Value::Int(15))
    );
    assert_eq!(runner.run("((fn []))"), Ok(Value::Nil));
}

#[test]
fn test_closure_captures_by_value() {
    let runner = Runner::new();
    assert_eq!(
        runner.run("(let [n 1 f (fn [] n)] (let [n 2] [(f) n]))"),
        Ok(Value::list([Value::Int(1), Value::Int(2)]))
    );
}

#[test]
fn test_closure_over_free_variable() {
    let runner = Runner::new();
    assert_eq!(
        runner.run_with("((fn [y] (+ x y)) 1)", &[("x", Value::Int(41))]),
        Ok(Value::Int(42))
    );
}

#[test]
fn test_closure_does_not_see_caller_locals() {
    let runner = Runner::new();
    // Inside the lambda `a` is a free variable, so the binding must supply it
    // even though the call site has a local `a`.
    let script = runner.compile("(let [f (fn [] a)] (let [a 1] (f)))");
    assert_eq!(script.free_variables().collect::<Vec<_>>(), vec!["a"]);
    let result = evaluate(
        &script,
        Binding::from_pairs([("a", 99)]).unwrap(),
        &ExecutionOptions::default(),
    );
    assert_eq!(result, Ok(Value::Int(99)));
}

#[test]
fn test_returned_closure_outlives_call() {
    let runner = Runner::new();
    let closure = runner
        .run_with("(fn [y] (* x y))", &[("x", Value::Int(3))])
        .unwrap();
    assert!(matches!(closure, Value::Function(_)));

    // Feed the closure into a second, independent evaluation. A bare free
    // variable cannot be called by name, so go through a local.
    let result = runner.run_with("(let [g f] (g 5))", &[("f", closure)]);
    assert_eq!(result, Ok(Value::Int(15)));
}

#[test]
fn test_call_faults() {
    let runner = Runner::new();
    assert_eq!(
        runner.fault("((fn [x] x) 1 2)"),
        RuntimeFault::ArityMismatch {
            function: "fn".into(),
            expected: Arity::Exact(1),
            found: 2,
        }
    );
    assert_eq!(
        runner.fault("(let [f 1] (f))"),
        RuntimeFault::NotCallable {
            found: "integer".into()
        }
    );
}

#[test]
fn test_fault_carries_span_and_script() {
    let runner = Runner::new();
    let err = runner.run("(+ 1\n   (/ 10 0))").unwrap_err();
    assert_eq!(err.script(), "test");
    assert_eq!(err.span(), &Span(8..16));
    assert_eq!(err.fault(), Some(&RuntimeFault::DivisionByZero));
}

#[test]
fn test_closure_from_binding_checks_arity() {
    let runner = Runner::new();
    let plus = runner.run("(fn [a b] (+ a b))").unwrap();
    let err = runner.run_with("(let [g f] (g 1))", &[("f", plus)]).unwrap_err();
    assert!(matches!(
        err.fault(),
        Some(RuntimeFault::ArityMismatch { found: 1, .. })
    ));
}

#[test]
fn test_host_function_error_propagates() {
    init_test_logging();
    let engine = Engine::new(EngineOptions::default(), |env| {
        register_stdlib(env)?;
        env.function("fail", Arity::Exact(0), "Always fails", |_| {
            Err(RuntimeFault::custom("host refused"))
        })?;
        Ok(())
    })
    .unwrap();
    let script = engine.compile("host", "(+ 1 (fail))").unwrap();
    let err = evaluate(&script, Binding::empty(), &ExecutionOptions::default()).unwrap_err();
    assert_eq!(err.fault(), Some(&RuntimeFault::custom("host refused")));
    assert_eq!(err.to_diagnostic().code.as_deref(), Some("R999"));
}

#[test]
fn test_stack_overflow() {
    let runner = Runner::with_options(ExecutionOptions {
        max_depth: 50,
        ..Default::default()
    });
    let fault = runner.fault(
        "(let [loop (fn [self n] (if (zero? n) 0 (+ 1 (self self (dec n)))))]
           (loop loop 1000))",
    );
    assert_eq!(
        fault,
        RuntimeFault::StackOverflow {
            depth: 50,
            max_depth: 50
        }
    );
    assert!(fault.is_resource_exceeded());
}

#[test]
fn test_deep_recursion_on_default_thread_faults() {
    // Default options on a default-sized spawned thread: the fault must be
    // reported before the native stack runs out, in debug and release alike.
    let result = std::thread::spawn(|| {
        let runner = Runner::new();
        runner.run_with(
            "(let [loop (fn [self n] (if (zero? n) 0 (+ 1 (self self (dec n)))))]
               (loop loop x))",
            &[("x", Value::Int(100_000))],
        )
    })
    .join()
    .expect("evaluation thread aborted");

    match result {
        Err(EvaluationError::RuntimeFault { cause, .. }) => {
            assert!(matches!(cause, RuntimeFault::StackOverflow { .. }), "{cause:?}");
        }
        other => panic!("expected a stack overflow, got {other:?}"),
    }
}

#[test]
fn test_scope_memory_follows_live_depth() {
    use bumpalo::Bump;

    use super::eval::{Evaluator, Frame};

    let runner = Runner::new();
    let script = runner.compile(
        "(let [fib (fn [self n] (if (< n 2) n (+ (self self (- n 1)) (self self (- n 2)))))]
           (fib fib x))",
    );

    // Bytes left in the top-level arena once fib(x) has run.
    let root_arena_bytes = |x: i64| {
        let binding = Binding::from_pairs([("x", x)]).unwrap();
        let arena = Bump::new();
        let mut frame = Frame::new(&arena);
        let value = Evaluator::new(&runner.options, script.name_ref(), &binding)
            .eval(script.body(), &mut frame)
            .unwrap();
        drop(frame);
        (value, arena.allocated_bytes())
    };

    let (small, small_bytes) = root_arena_bytes(3);
    let (large, large_bytes) = root_arena_bytes(18);
    assert_eq!(small, Value::Int(2));
    assert_eq!(large, Value::Int(2584));
    // Thousands more closure calls leave nothing behind at the top level.
    assert_eq!(large_bytes, small_bytes);
}

#[test]
fn test_recursion_within_limits() {
    let runner = Runner::new();
    assert_eq!(
        runner.run(
            "(let [sum (fn [self n] (if (zero? n) 0 (+ n (self self (dec n)))))]
               (sum sum 100))"
        ),
        Ok(Value::Int(5050))
    );
}

#[test]
fn test_step_limit() {
    let runner = Runner::with_options(ExecutionOptions {
        max_steps: Some(10),
        ..Default::default()
    });
    assert_eq!(runner.run("(+ 1 2)"), Ok(Value::Int(3)));
    assert_eq!(
        runner.fault("(+ 1 2 3 4 5 6 7 8 9 10 11)"),
        RuntimeFault::StepLimitExceeded { max_steps: 10 }
    );
}

#[test]
fn test_timeout() {
    let runner = Runner::with_options(ExecutionOptions {
        timeout: Some(Duration::ZERO),
        ..Default::default()
    });
    // Enough work to reach the first wall-clock check.
    let fault = runner.fault(
        "(let [spin (fn [self n] (if (zero? n) 0 (self self (dec n))))]
           (spin spin 100))",
    );
    assert!(matches!(fault, RuntimeFault::Timeout { .. }), "{fault:?}");
}

#[test]
fn test_limits_are_per_call() {
    let runner = Runner::with_options(ExecutionOptions {
        max_steps: Some(20),
        ..Default::default()
    });
    let script = runner.compile("(+ x 1)");
    for x in 0..100 {
        let binding = Binding::from_pairs([("x", x)]).unwrap();
        assert_eq!(evaluate(&script, binding, &runner.options), Ok(Value::Int(x + 1)));
    }
}

#[test]
fn test_binding_values_are_released() {
    let runner = Runner::new();
    let script = runner.compile("(let [g f h (fn [] g)] ((h)))");

    let host = Arc::new(NativeFunction::new("seven", Arity::Exact(0), "", |_| {
        Ok(Value::Int(7))
    }));
    let binding = Binding::from_pairs([("f", Value::Function(Function::Native(Arc::clone(&host))))])
        .unwrap();
    assert_eq!(Arc::strong_count(&host), 2);

    assert_eq!(
        evaluate(&script, binding, &ExecutionOptions::default()),
        Ok(Value::Int(7))
    );
    // The binding, the let scope and the closure capture are all gone.
    assert_eq!(Arc::strong_count(&host), 1);
}
