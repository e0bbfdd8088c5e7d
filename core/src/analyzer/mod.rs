//! Turns parsed forms into the compiled tree evaluated at run time.

#[allow(clippy::module_inception)]
pub mod analyzer;
pub mod compiled_expr;
pub mod error;


pub use analyzer::{Analysis, SPECIAL_FORMS, analyze, is_special_form};
pub use compiled_expr::{FreeVariable, Lambda, Node, NodeKind};
pub use error::{AnalysisError, AnalysisErrorKind};
