//! Arithmetic and comparison.
//!
//! Constants: PI, E
//! Functions: + - * / quot rem mod inc dec abs min max = not= < > <= >=

use crate::api::{EnvironmentBuilder, EnvironmentError};
use crate::evaluator::RuntimeFault;
use crate::evaluator::operators::{
    ArithOp, CompareOp, eval_binary, eval_comparison, expect_int, expect_number, fold,
    values_equal,
};
use crate::values::{Arity, Value};

// ============================================================================
// Arithmetic
// ============================================================================

fn add(args: &[Value]) -> Result<Value, RuntimeFault> {
    if args.is_empty() {
        return Ok(Value::Int(0));
    }
    fold(ArithOp::Add, "+", args)
}

fn multiply(args: &[Value]) -> Result<Value, RuntimeFault> {
    if args.is_empty() {
        return Ok(Value::Int(1));
    }
    fold(ArithOp::Mul, "*", args)
}

/// With one argument, negates it.
fn subtract(args: &[Value]) -> Result<Value, RuntimeFault> {
    match args {
        [Value::Int(i)] => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RuntimeFault::overflow("-")),
        [single] => Ok(Value::Float(-expect_number("-", single)?)),
        _ => fold(ArithOp::Sub, "-", args),
    }
}

/// With one argument, returns its reciprocal.
fn divide(args: &[Value]) -> Result<Value, RuntimeFault> {
    match args {
        [single] => eval_binary(ArithOp::Div, "/", &Value::Int(1), single),
        _ => fold(ArithOp::Div, "/", args),
    }
}

fn int_pair(function: &str, args: &[Value]) -> Result<(i64, i64), RuntimeFault> {
    let dividend = expect_int(function, &args[0])?;
    let divisor = expect_int(function, &args[1])?;
    if divisor == 0 {
        return Err(RuntimeFault::DivisionByZero);
    }
    Ok((dividend, divisor))
}

fn quot(args: &[Value]) -> Result<Value, RuntimeFault> {
    let (a, b) = int_pair("quot", args)?;
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| RuntimeFault::overflow("quot"))
}

/// Remainder with the sign of the dividend.
fn rem(args: &[Value]) -> Result<Value, RuntimeFault> {
    let (a, b) = int_pair("rem", args)?;
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| RuntimeFault::overflow("rem"))
}

/// Modulus with the sign of the divisor.
fn modulo(args: &[Value]) -> Result<Value, RuntimeFault> {
    let (a, b) = int_pair("mod", args)?;
    let r = a.checked_rem(b).ok_or_else(|| RuntimeFault::overflow("mod"))?;
    if r != 0 && (r < 0) != (b < 0) {
        Ok(Value::Int(r + b))
    } else {
        Ok(Value::Int(r))
    }
}

fn inc(args: &[Value]) -> Result<Value, RuntimeFault> {
    eval_binary(ArithOp::Add, "inc", &args[0], &Value::Int(1))
}

fn dec(args: &[Value]) -> Result<Value, RuntimeFault> {
    eval_binary(ArithOp::Sub, "dec", &args[0], &Value::Int(1))
}

fn abs(args: &[Value]) -> Result<Value, RuntimeFault> {
    match &args[0] {
        Value::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| RuntimeFault::overflow("abs")),
        other => Ok(Value::Float(expect_number("abs", other)?.abs())),
    }
}

/// Picks the extreme argument without promoting it.
fn extreme(function: &str, keep: CompareOp, args: &[Value]) -> Result<Value, RuntimeFault> {
    let mut best = &args[0];
    expect_number(function, best)?;
    for candidate in &args[1..] {
        expect_number(function, candidate)?;
        if eval_comparison(keep, function, candidate, best)? {
            best = candidate;
        }
    }
    Ok(best.clone())
}

fn min(args: &[Value]) -> Result<Value, RuntimeFault> {
    extreme("min", CompareOp::Lt, args)
}

fn max(args: &[Value]) -> Result<Value, RuntimeFault> {
    extreme("max", CompareOp::Gt, args)
}

// ============================================================================
// Comparison
// ============================================================================

fn all_equal(args: &[Value]) -> bool {
    args.windows(2).all(|pair| values_equal(&pair[0], &pair[1]))
}

fn equal(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(all_equal(args)))
}

fn not_equal(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(!all_equal(args)))
}

/// True when every adjacent pair satisfies `op`.
fn chain(op: CompareOp, function: &str, args: &[Value]) -> Result<Value, RuntimeFault> {
    if let [single] = args
        && !matches!(single, Value::Int(_) | Value::Float(_) | Value::Str(_))
    {
        return Err(RuntimeFault::type_mismatch(
            function,
            "a number or string",
            single.type_name(),
        ));
    }
    for pair in args.windows(2) {
        if !eval_comparison(op, function, &pair[0], &pair[1])? {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), EnvironmentError> {
    env.category("Math");
    env.constant("PI", std::f64::consts::PI, "Ratio of a circle's circumference to its diameter")?;
    env.constant("E", std::f64::consts::E, "Euler's number, base of the natural logarithm")?;
    env.function("+", Arity::AtLeast(0), "Sum of the arguments; (+) is 0", add)?;
    env.function(
        "-",
        Arity::AtLeast(1),
        "Subtracts the rest from the first; negates a single argument",
        subtract,
    )?;
    env.function("*", Arity::AtLeast(0), "Product of the arguments; (*) is 1", multiply)?;
    env.function(
        "/",
        Arity::AtLeast(1),
        "Divides the first by the rest; integer division for integers",
        divide,
    )?;
    env.function("quot", Arity::Exact(2), "Integer quotient, truncated toward zero", quot)?;
    env.function("rem", Arity::Exact(2), "Integer remainder with the sign of the dividend", rem)?;
    env.function("mod", Arity::Exact(2), "Integer modulus with the sign of the divisor", modulo)?;
    env.function("inc", Arity::Exact(1), "Adds one", inc)?;
    env.function("dec", Arity::Exact(1), "Subtracts one", dec)?;
    env.function("abs", Arity::Exact(1), "Absolute value", abs)?;
    env.function("min", Arity::AtLeast(1), "Smallest of the arguments", min)?;
    env.function("max", Arity::AtLeast(1), "Largest of the arguments", max)?;

    env.category("Comparison");
    env.function(
        "=",
        Arity::AtLeast(1),
        "True if all arguments are equal; numbers compare by value",
        equal,
    )?;
    env.function("not=", Arity::AtLeast(1), "True if some arguments differ", not_equal)?;
    env.function(
        "<",
        Arity::AtLeast(1),
        "True if the arguments are strictly increasing",
        |args| chain(CompareOp::Lt, "<", args),
    )?;
    env.function(
        ">",
        Arity::AtLeast(1),
        "True if the arguments are strictly decreasing",
        |args| chain(CompareOp::Gt, ">", args),
    )?;
    env.function(
        "<=",
        Arity::AtLeast(1),
        "True if the arguments never decrease",
        |args| chain(CompareOp::Le, "<=", args),
    )?;
    env.function(
        ">=",
        Arity::AtLeast(1),
        "True if the arguments never increase",
        |args| chain(CompareOp::Ge, ">=", args),
    )?;
    Ok(())
}
