use crate::api::RelatedInfo;
use crate::parser::Span;

/// Context information for error messages.
///
/// Breadcrumbs such as "in call to function 'nth'" attached to an error.
/// Each context entry can be converted to a RelatedInfo for diagnostic display.
#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    /// In a function call
    InFunctionCall { name: Option<String>, span: Span },
    /// Inside a special form such as `let` or `fn`
    InSpecialForm { form: String, span: Span },
    /// Where something was defined
    DefinedHere { what: String, span: Span },
}

impl Context {
    pub fn span(&self) -> &Span {
        match self {
            Context::InFunctionCall { span, .. }
            | Context::InSpecialForm { span, .. }
            | Context::DefinedHere { span, .. } => span,
        }
    }

    /// Convert to a RelatedInfo for diagnostic display
    pub fn to_related_info(&self) -> RelatedInfo {
        let message = match self {
            Context::InFunctionCall { name, .. } => match name {
                Some(n) => format!("in call to function '{}'", n),
                None => "in function call".to_string(),
            },
            Context::InSpecialForm { form, .. } => format!("in `{}` form", form),
            Context::DefinedHere { what, .. } => format!("{} defined here", what),
        };
        RelatedInfo {
            span: self.span().clone(),
            message,
        }
    }
}
