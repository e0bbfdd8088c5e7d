//! Kiln Standard Library
//!
//! Built-ins are plain native functions registered in the global
//! environment, grouped into documentation categories:
//! - Math: arithmetic and the constants `PI` and `E`
//! - Comparison: `=`, `not=`, `<`, `>`, `<=`, `>=`
//! - Logic: `not` and type predicates
//! - Strings: `str`, `upper-case`, `lower-case`
//! - Lists: `list`, `count`, `first`, `rest`, `nth`, `conj`, `concat`
//!
//! Every built-in is pure and thread-safe, so the registered environment can
//! be shared by every engine in the process (see
//! [`crate::api::Environment::standard`]).

use crate::api::{EnvironmentBuilder, EnvironmentError};

pub mod list;
pub mod logic;
pub mod math;
pub mod string;


/// Register the whole standard library.
///
/// # Example
///
/// ```
/// use kiln_core::api::{Engine, EngineOptions};
/// use kiln_core::stdlib::register_stdlib;
/// use kiln_core::values::{Arity, Value};
///
/// let engine = Engine::new(EngineOptions::default(), |env| {
///     register_stdlib(env)?;
///     env.category("Host");
///     env.function("answer", Arity::Exact(0), "The answer", |_| Ok(Value::Int(42)))?;
///     Ok(())
/// })
/// .unwrap();
///
/// assert!(engine.compile("s", "(+ (answer) 1)").is_ok());
/// ```
pub fn register_stdlib(env: &mut EnvironmentBuilder) -> Result<(), EnvironmentError> {
    math::register(env)?;
    logic::register(env)?;
    string::register(env)?;
    list::register(env)?;
    Ok(())
}
