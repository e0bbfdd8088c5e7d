use ecow::EcoString;

use super::Span;

/// A parsed s-expression form with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormKind {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(EcoString),
    Symbol(EcoString),
    /// `( ... )`: an application or a special form.
    List(Vec<Form>),
    /// `[ ... ]`: a list literal (or a binding vector in `let`/`fn`).
    Vector(Vec<Form>),
}

impl Form {
    pub fn new(kind: FormKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn as_symbol(&self) -> Option<&EcoString> {
        match &self.kind {
            FormKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// Short description used in diagnostics ("symbol", "list", ...).
    pub fn describe(&self) -> &'static str {
        match self.kind {
            FormKind::Nil => "nil",
            FormKind::Bool(_) => "boolean",
            FormKind::Int(_) => "integer",
            FormKind::Float(_) => "float",
            FormKind::Str(_) => "string",
            FormKind::Symbol(_) => "symbol",
            FormKind::List(_) => "list",
            FormKind::Vector(_) => "vector",
        }
    }
}

/// The top-level forms of a script, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub forms: Vec<Form>,
    pub span: Span,
}
