//! One compiled script, many threads.

use std::collections::BTreeSet;
use std::thread;

use kiln::{Binding, Engine, ExecutionOptions, Program, Value};
use once_cell::sync::Lazy;
use pretty_assertions::assert_eq;

static SCRIPT: Lazy<kiln::CompiledScript> = Lazy::new(|| {
    kiln::compile(
        "concurrent",
        "(let [step (fn [n] (+ n 1))
               acc (fn [self k total] (if (zero? k) total (self self (dec k) total)))]
           (acc acc 50 (step x)))",
    )
    .unwrap()
});

fn run(x: i64) -> Value {
    kiln::evaluate(&SCRIPT, Binding::from_pairs([("x", x)]).unwrap()).unwrap()
}

#[test]
fn concurrent_evaluations_match_sequential() {
    let sequential: Vec<Value> = (0..100).map(run).collect();

    let concurrent: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = (0..100).map(|x| scope.spawn(move || run(x))).collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(concurrent, sequential);

    let results: BTreeSet<i64> = concurrent.iter().filter_map(Value::as_int).collect();
    assert_eq!(results, (1..=100).collect::<BTreeSet<_>>());
}

#[test]
fn faults_in_one_thread_do_not_affect_others() {
    let script = kiln::compile("mixed", "(quot 100 x)").unwrap();

    let results: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..20_i64)
            .map(|x| {
                let script = &script;
                scope.spawn(move || {
                    kiln::evaluate(script, Binding::from_pairs([("x", x % 5)]).unwrap())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    for (x, result) in results.into_iter().enumerate() {
        match x % 5 {
            0 => assert!(result.is_err()),
            d => assert_eq!(result, Ok(Value::Int(100 / d as i64))),
        }
    }
}

#[test]
fn program_clones_share_one_script() {
    let engine = Engine::default();
    let program = Program::compile(&engine, "shared", "(str greeting \", \" who)").unwrap();
    let program_ref = &program;

    let outputs: Vec<Value> = thread::scope(|scope| {
        let handles: Vec<_> = ["ann", "bo", "cy"]
            .into_iter()
            .map(|who| {
                let program = program.clone();
                let original = program_ref;
                scope.spawn(move || {
                    assert!(program.script().ptr_eq(original.script()));
                    let binding = Binding::from_pairs([("greeting", "hi"), ("who", who)]).unwrap();
                    program.evaluate(binding).unwrap()
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(
        outputs,
        vec![Value::from("hi, ann"), Value::from("hi, bo"), Value::from("hi, cy")]
    );
}

#[test]
fn per_call_limits_are_independent() {
    let script = kiln::compile(
        "limits",
        "(let [spin (fn [self n] (if (zero? n) n (self self (dec n))))] (spin spin x))",
    )
    .unwrap();
    let tight = ExecutionOptions {
        max_steps: Some(200),
        ..Default::default()
    };

    let (small, large) = thread::scope(|scope| {
        let small = scope.spawn(|| eval_with(&script, 3, &tight));
        let large = scope.spawn(|| eval_with(&script, 10_000, &tight));
        (small.join().unwrap(), large.join().unwrap())
    });

    assert_eq!(small, Ok(Value::Int(0)));
    assert!(
        large
            .unwrap_err()
            .fault()
            .is_some_and(|fault| fault.is_resource_exceeded())
    );
}

fn eval_with(
    script: &kiln::CompiledScript,
    x: i64,
    options: &ExecutionOptions,
) -> Result<Value, kiln::EvaluationError> {
    Program::new(script.clone(), options.clone()).evaluate(Binding::from_pairs([("x", x)]).unwrap())
}
