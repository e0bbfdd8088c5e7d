//! Kiln core: compiler, evaluator and runtime values.
//!
//! A script is compiled once by an [`api::Engine`] into an immutable
//! [`api::CompiledScript`], then evaluated any number of times (from any
//! number of threads) against a fresh [`api::Binding`] per call.

pub mod analyzer;
pub mod api;
pub mod diagnostics;
pub mod evaluator;
pub mod parser;
pub mod scope_stack;
pub mod section;
pub mod stdlib;
pub mod values;
