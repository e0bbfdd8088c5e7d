use crate::api::{Diagnostic, Severity};
use crate::diagnostics::context::Context;
use crate::parser::{Rule, Span};

/// Parser error with context
#[derive(Debug, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub source: String,
    pub span: Span,
    pub context: Vec<Context>,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    /// Unexpected token
    UnexpectedToken { expected: String, found: String },
    /// Unclosed delimiter
    UnclosedDelimiter { delimiter: char },
    /// Invalid number literal
    InvalidNumber { text: String },
    /// Unknown escape sequence in a string literal
    InvalidEscape { sequence: String },
    /// Maximum nesting depth exceeded
    MaxDepthExceeded { depth: usize, max_depth: usize },
    /// Other parse errors (catch-all for Pest errors we don't specifically handle)
    Other { message: String },
}

impl ParseError {
    /// Create a new ParseError with no context
    pub fn new(kind: ParseErrorKind, source: String, span: Span) -> Self {
        Self {
            kind,
            source,
            span,
            context: Vec::new(),
        }
    }

    /// Convert to a Diagnostic for API boundary
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (message, code, help) = match &self.kind {
            ParseErrorKind::UnexpectedToken { expected, found } => (
                format!("Expected {}, found {}", expected, found),
                "P001",
                vec![],
            ),
            ParseErrorKind::UnclosedDelimiter { delimiter } => (
                format!("Unclosed delimiter '{}'", delimiter),
                "P002",
                vec!["Add the missing closing delimiter".to_string()],
            ),
            ParseErrorKind::InvalidNumber { text } => (
                format!("Invalid number literal '{}'", text),
                "P003",
                vec!["Integers must fit in 64 bits".to_string()],
            ),
            ParseErrorKind::MaxDepthExceeded { max_depth, .. } => (
                format!(
                    "Expression nesting depth exceeds maximum of {} levels",
                    max_depth
                ),
                "P004",
                vec!["Reduce nesting or simplify the expression".to_string()],
            ),
            ParseErrorKind::InvalidEscape { sequence } => (
                format!("Unknown escape sequence '{}'", sequence),
                "P005",
                vec!["Supported escapes are \\n, \\t, \\r, \\\" and \\\\".to_string()],
            ),
            ParseErrorKind::Other { message } => (message.clone(), "P999", vec![]),
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
            help,
            code: Some(code.to_string()),
        }
    }
}

impl core::fmt::Display for ParseError {
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

impl std::error::Error for ParseError {}

/// Convert Pest error to human-readable ParseError
pub fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::ErrorVariant;

    let span = match err.location {
        pest::error::InputLocation::Pos(pos) => Span(pos..pos),
        pest::error::InputLocation::Span((start, end)) => Span(start..end),
    };

    let kind = match err.variant {
        ErrorVariant::ParsingError {
            positives,
            negatives,
        } => match unclosed_delimiter(source, span.0.start) {
            Some(delimiter) => ParseErrorKind::UnclosedDelimiter { delimiter },
            None => ParseErrorKind::UnexpectedToken {
                expected: format_expected_rules(&positives),
                found: format_found_rules(&negatives, source, span.0.start),
            },
        },
        ErrorVariant::CustomError { message } => ParseErrorKind::Other { message },
    };

    ParseError::new(kind, source.to_string(), span)
}

/// If parsing stopped at end of input with a group still open, report the
/// innermost opening delimiter.
fn unclosed_delimiter(source: &str, pos: usize) -> Option<char> {
    if pos < source.trim_end().len() {
        return None;
    }
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;
    for c in source.chars() {
        if in_comment {
            in_comment = c != '\n';
            continue;
        }
        if in_string {
            match (escaped, c) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            ';' => in_comment = true,
            '"' => in_string = true,
            '(' | '[' => stack.push(c),
            ')' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }
    if in_string {
        return Some('"');
    }
    stack.pop()
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::integer | Rule::float | Rule::boolean | Rule::string | Rule::nil => "literal",
            Rule::symbol => "symbol",
            Rule::list | Rule::vector => "expression",
            Rule::EOI => "end of input",
            _ => "expression",
        };
        if !concepts.contains(&concept) {
            concepts.push(concept);
        }
    }

    match concepts.split_last() {
        None => "something else".to_string(),
        Some((only, [])) => only.to_string(),
        Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
    }
}

/// Format found rules in a human-readable way
fn format_found_rules(rules: &[Rule], source: &str, pos: usize) -> String {
    match rules.first() {
        Some(Rule::EOI) => "end of input".to_string(),
        Some(rule) => format!("{:?}", rule),
        None => match source[pos..].chars().next() {
            Some(c) => format!("'{}'", c),
            None => "end of input".to_string(),
        },
    }
}
