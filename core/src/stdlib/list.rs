//! List functions.
//!
//! `nil` behaves as the empty list everywhere a list is read.

use ecow::EcoVec;

use crate::api::{EnvironmentBuilder, EnvironmentError};
use crate::evaluator::RuntimeFault;
use crate::evaluator::operators::expect_int;
use crate::values::{Arity, Value};

fn expect_list<'v>(function: &str, value: &'v Value) -> Result<&'v [Value], RuntimeFault> {
    match value {
        Value::Nil => Ok(&[]),
        Value::List(items) => Ok(items.as_slice()),
        other => Err(RuntimeFault::type_mismatch(
            function,
            "a list",
            other.type_name(),
        )),
    }
}

fn list(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::list(args.iter().cloned()))
}

/// Number of items in a list, or of characters in a string.
fn count(args: &[Value]) -> Result<Value, RuntimeFault> {
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        other => expect_list("count", other)?.len(),
    };
    i64::try_from(len)
        .map(Value::Int)
        .map_err(|_| RuntimeFault::overflow("count"))
}

fn first(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(expect_list("first", &args[0])?
        .first()
        .cloned()
        .unwrap_or_default())
}

fn rest(args: &[Value]) -> Result<Value, RuntimeFault> {
    let items = expect_list("rest", &args[0])?;
    Ok(Value::list(items.iter().skip(1).cloned()))
}

fn nth(args: &[Value]) -> Result<Value, RuntimeFault> {
    let items = expect_list("nth", &args[0])?;
    let index = expect_int("nth", &args[1])?;
    usize::try_from(index)
        .ok()
        .and_then(|i| items.get(i))
        .cloned()
        .ok_or(RuntimeFault::IndexOutOfBounds {
            index,
            len: items.len(),
        })
}

/// Append items to the end of a list.
fn conj(args: &[Value]) -> Result<Value, RuntimeFault> {
    let mut items: EcoVec<Value> = match &args[0] {
        Value::List(items) => items.clone(),
        other => expect_list("conj", other)?.iter().cloned().collect(),
    };
    items.extend(args[1..].iter().cloned());
    Ok(Value::List(items))
}

fn concat(args: &[Value]) -> Result<Value, RuntimeFault> {
    let mut items = EcoVec::new();
    for arg in args {
        items.extend(expect_list("concat", arg)?.iter().cloned());
    }
    Ok(Value::List(items))
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), EnvironmentError> {
    env.category("Lists");
    env.function("list", Arity::AtLeast(0), "A list of the arguments", list)?;
    env.function(
        "count",
        Arity::Exact(1),
        "Number of items in a list or characters in a string",
        count,
    )?;
    env.function("first", Arity::Exact(1), "First item of a list, or nil", first)?;
    env.function("rest", Arity::Exact(1), "All items but the first", rest)?;
    env.function("nth", Arity::Exact(2), "Item at a zero-based index", nth)?;
    env.function("conj", Arity::AtLeast(1), "Appends items to the end of a list", conj)?;
    env.function("concat", Arity::AtLeast(0), "Joins lists end to end", concat)?;
    Ok(())
}
