//! Shared diagnostic helpers for parse, analysis and evaluation errors.

pub mod context;

pub use context::Context;
