use crate::api::{Diagnostic, Severity};
use crate::diagnostics::context::Context;
use crate::parser::Span;
use crate::values::Arity;

/// Compile-time error found while resolving a parsed script.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisError {
    pub kind: AnalysisErrorKind,
    pub span: Span,
    pub context: Vec<Context>,
}

/// Specific kinds of analysis errors
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisErrorKind {
    /// A special form used with the wrong shape, e.g. `(if)` or `(let x 1)`.
    MalformedSpecialForm { form: String, message: String },
    /// Call head is a symbol that is neither local nor global.
    UnknownFunction { name: String },
    /// Call head is a literal (or a global constant).
    NotCallable { found: String },
    /// Built-in called with the wrong number of arguments.
    ArityMismatch {
        name: String,
        expected: Arity,
        found: usize,
    },
    /// Same name bound twice in one `let` vector or parameter list.
    DuplicateBinding { name: String },
    /// Something other than a symbol in a binding position.
    InvalidBindingTarget { found: String },
}

impl AnalysisError {
    pub fn new(kind: AnalysisErrorKind, span: Span) -> Self {
        Self {
            kind,
            span,
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context.push(context);
        self
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            AnalysisErrorKind::MalformedSpecialForm { form, message } => (
                format!("Malformed `{}`: {}", form, message),
                "A001",
                special_form_usage(form).map(|usage| format!("Usage: {}", usage)),
            ),
            AnalysisErrorKind::UnknownFunction { name } => (
                format!("Unknown function '{}'", name),
                "A002",
                Some("Only locals and engine globals can be called by name".to_string()),
            ),
            AnalysisErrorKind::NotCallable { found } => (
                format!("{} is not callable", found),
                "A003",
                None,
            ),
            AnalysisErrorKind::ArityMismatch {
                name,
                expected,
                found,
            } => (
                format!(
                    "'{}' expects {} argument(s), got {}",
                    name, expected, found
                ),
                "A004",
                None,
            ),
            AnalysisErrorKind::DuplicateBinding { name } => (
                format!("Name '{}' is bound more than once", name),
                "A005",
                Some("Use a nested `let` to rebind a name".to_string()),
            ),
            AnalysisErrorKind::InvalidBindingTarget { found } => (
                format!("Expected a symbol to bind, found {}", found),
                "A006",
                None,
            ),
        };

        Diagnostic {
            severity: Severity::Error,
            message,
            span: self.span.clone(),
            related: self
                .context
                .iter()
                .map(|ctx| ctx.to_related_info())
                .collect(),
            help: help.into_iter().collect(),
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let diagnostic = self.to_diagnostic();
        write!(f, "{}: {}", diagnostic.severity, diagnostic.message)?;

        if let Some(ref code) = diagnostic.code {
            write!(f, " [{}]", code)?;
        }

        for help_msg in &diagnostic.help {
            write!(f, "\nhelp: {}", help_msg)?;
        }

        Ok(())
    }
}

impl std::error::Error for AnalysisError {}

fn special_form_usage(form: &str) -> Option<&'static str> {
    match form {
        "if" => Some("(if cond then) or (if cond then else)"),
        "let" => Some("(let [name value ...] body ...)"),
        "fn" => Some("(fn [param ...] body ...)"),
        "quote" => Some("(quote form)"),
        _ => None,
    }
}
