//! Logic and type predicates.

use crate::api::{EnvironmentBuilder, EnvironmentError};
use crate::evaluator::RuntimeFault;
use crate::evaluator::operators::expect_number;
use crate::values::{Arity, Value};

fn not(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(!args[0].is_truthy()))
}

fn is_nil(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(args[0].is_nil()))
}

fn is_zero(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(expect_number("zero?", &args[0])? == 0.0))
}

/// `nil`, `""` and `()` are empty.
fn is_empty(args: &[Value]) -> Result<Value, RuntimeFault> {
    match &args[0] {
        Value::Nil => Ok(Value::Bool(true)),
        Value::Str(s) => Ok(Value::Bool(s.is_empty())),
        Value::List(items) => Ok(Value::Bool(items.is_empty())),
        other => Err(RuntimeFault::type_mismatch(
            "empty?",
            "a string, list or nil",
            other.type_name(),
        )),
    }
}

fn is_number(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(matches!(args[0], Value::Int(_) | Value::Float(_))))
}

fn is_string(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), EnvironmentError> {
    env.category("Logic");
    env.function("not", Arity::Exact(1), "True if the argument is nil or false", not)?;
    env.function("nil?", Arity::Exact(1), "True if the argument is nil", is_nil)?;
    env.function("zero?", Arity::Exact(1), "True if the number is zero", is_zero)?;
    env.function(
        "empty?",
        Arity::Exact(1),
        "True for nil, the empty string and the empty list",
        is_empty,
    )?;
    env.function("number?", Arity::Exact(1), "True for integers and floats", is_number)?;
    env.function("string?", Arity::Exact(1), "True for strings", is_string)?;
    Ok(())
}
