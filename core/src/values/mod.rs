pub mod function;
mod serialization;
mod value;

pub use function::{Arity, Closure, Function, NativeFn, NativeFunction};
pub use value::Value;
