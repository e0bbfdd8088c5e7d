//! String functions.

use ecow::EcoString;

use crate::api::{EnvironmentBuilder, EnvironmentError};
use crate::evaluator::RuntimeFault;
use crate::values::{Arity, Value};

/// Concatenate the plain renderings of all arguments; `nil` renders as "".
fn concat_str(args: &[Value]) -> Result<Value, RuntimeFault> {
    let mut out = EcoString::new();
    for arg in args {
        match arg {
            Value::Str(s) => out.push_str(s),
            other => out.push_str(&other.to_plain_string()),
        }
    }
    Ok(Value::Str(out))
}

fn expect_str<'v>(function: &str, value: &'v Value) -> Result<&'v str, RuntimeFault> {
    value
        .as_str()
        .ok_or_else(|| RuntimeFault::type_mismatch(function, "a string", value.type_name()))
}

fn upper_case(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::from(expect_str("upper-case", &args[0])?.to_uppercase()))
}

fn lower_case(args: &[Value]) -> Result<Value, RuntimeFault> {
    Ok(Value::from(expect_str("lower-case", &args[0])?.to_lowercase()))
}

pub fn register(env: &mut EnvironmentBuilder) -> Result<(), EnvironmentError> {
    env.category("Strings");
    env.function(
        "str",
        Arity::AtLeast(0),
        "Concatenates its arguments as text; nil is the empty string",
        concat_str,
    )?;
    env.function("upper-case", Arity::Exact(1), "Converts a string to upper case", upper_case)?;
    env.function("lower-case", Arity::Exact(1), "Converts a string to lower case", lower_case)?;
    Ok(())
}
