//! Benchmarks for the Kiln evaluator.
//!
//! Run with: `cargo bench` in the core/ directory.
//!
//! Benchmark groups:
//! 1. eval_only: one compiled script, a fresh binding per iteration
//! 2. full_pipeline: compile + evaluate together (for comparison)
//! 3. closures: self-recursive closure calls

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kiln_core::api::{Binding, Engine, ExecutionOptions};
use kiln_core::evaluator::evaluate;

/// Generate `(+ x 1 1 ... 1)` with `n` ones.
fn generate_sum(n: usize) -> String {
    let mut expr = String::from("(+ x");
    for _ in 0..n {
        expr.push_str(" 1");
    }
    expr.push(')');
    expr
}

fn binding(x: i64) -> Binding {
    Binding::from_pairs([("x", x)]).expect("valid binding")
}

fn bench_eval_only(c: &mut Criterion) {
    let engine = Engine::default();
    let options = ExecutionOptions::default();
    let mut group = c.benchmark_group("eval_only");

    for size in [100, 200, 400, 800] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let script = engine
                .compile("bench", &generate_sum(size))
                .expect("Compilation failed");

            b.iter(|| {
                let value = evaluate(black_box(&script), binding(black_box(1)), &options)
                    .expect("Eval failed");
                black_box(value)
            });
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let engine = Engine::default();
    let options = ExecutionOptions::default();
    let mut group = c.benchmark_group("full_pipeline");

    for size in [100, 200, 400, 800] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let source = generate_sum(size);

            b.iter(|| {
                let script = engine
                    .compile("bench", black_box(&source))
                    .expect("Compilation failed");
                let value = evaluate(&script, binding(1), &options).expect("Eval failed");
                black_box(value)
            });
        });
    }

    group.finish();
}

fn bench_closures(c: &mut Criterion) {
    let engine = Engine::default();
    let options = ExecutionOptions::default();
    let script = engine
        .compile(
            "bench",
            "(let [sum (fn [self n] (if (zero? n) 0 (+ n (self self (dec n)))))] (sum sum x))",
        )
        .expect("Compilation failed");
    let mut group = c.benchmark_group("closures");

    // Recursion depth stays under the default limit.
    for n in [10, 50, 100] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let value =
                    evaluate(&script, binding(black_box(n)), &options).expect("Eval failed");
                black_box(value)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_eval_only, bench_full_pipeline, bench_closures);
criterion_main!(benches);
