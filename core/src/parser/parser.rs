use ecow::EcoString;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;

use super::error::{ParseError, ParseErrorKind, convert_pest_error};
use super::parsed_expr::{Form, FormKind, ParsedScript};
use super::syntax::Span;

/// Default nesting limit for `(`/`[` groups.
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Parser)]
#[grammar = "parser/kiln.pest"]
pub struct ExpressionParser;

/// Parse a script with the default nesting limit.
pub fn parse(source: &str) -> Result<ParsedScript, ParseError> {
    parse_with_max_depth(source, DEFAULT_MAX_DEPTH)
}

/// Parse a script, rejecting groups nested deeper than `max_depth`.
///
/// The depth check runs before pest so that adversarial input cannot
/// exhaust the native stack inside the generated parser.
pub fn parse_with_max_depth(source: &str, max_depth: usize) -> Result<ParsedScript, ParseError> {
    check_nesting(source, max_depth)?;

    let mut pairs = ExpressionParser::parse(Rule::main, source)
        .map_err(|err| convert_pest_error(err, source))?;
    let Some(main) = pairs.next() else {
        return Err(ParseError::new(
            ParseErrorKind::Other {
                message: "empty parse tree".to_string(),
            },
            source.to_string(),
            Span::new(0, source.len()),
        ));
    };

    let span = Span::from(main.as_span());
    let forms = main
        .into_inner()
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .map(|pair| parse_form(pair, source))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedScript { forms, span })
}

fn parse_form(pair: Pair<Rule>, source: &str) -> Result<Form, ParseError> {
    let span = Span::from(pair.as_span());
    let kind = match pair.as_rule() {
        Rule::nil => FormKind::Nil,
        Rule::boolean => FormKind::Bool(pair.as_str() == "true"),
        Rule::integer => {
            let text = pair.as_str();
            let value = text.parse::<i64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber {
                        text: text.to_string(),
                    },
                    source.to_string(),
                    span.clone(),
                )
            })?;
            FormKind::Int(value)
        }
        Rule::float => {
            let text = pair.as_str();
            let value = text.parse::<f64>().map_err(|_| {
                ParseError::new(
                    ParseErrorKind::InvalidNumber {
                        text: text.to_string(),
                    },
                    source.to_string(),
                    span.clone(),
                )
            })?;
            FormKind::Float(value)
        }
        Rule::string => {
            let inner = pair.into_inner().next();
            let raw = inner.as_ref().map(|p| p.as_str()).unwrap_or("");
            FormKind::Str(unescape(raw, &span, source)?)
        }
        Rule::symbol => FormKind::Symbol(EcoString::from(pair.as_str())),
        Rule::list => FormKind::List(parse_children(pair, source)?),
        Rule::vector => FormKind::Vector(parse_children(pair, source)?),
        rule => {
            return Err(ParseError::new(
                ParseErrorKind::Other {
                    message: format!("unexpected rule {:?}", rule),
                },
                source.to_string(),
                span,
            ));
        }
    };
    Ok(Form::new(kind, span))
}

fn parse_children(pair: Pair<Rule>, source: &str) -> Result<Vec<Form>, ParseError> {
    pair.into_inner()
        .map(|child| parse_form(child, source))
        .collect()
}

fn unescape(raw: &str, span: &Span, source: &str) -> Result<EcoString, ParseError> {
    let mut out = EcoString::new();
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            other => {
                let sequence = match other {
                    Some(c) => format!("\\{}", c),
                    None => "\\".to_string(),
                };
                return Err(ParseError::new(
                    ParseErrorKind::InvalidEscape { sequence },
                    source.to_string(),
                    span.clone(),
                ));
            }
        }
    }
    Ok(out)
}

/// Scan delimiters (outside strings and comments) and fail on the first
/// group that opens beyond `max_depth`.
fn check_nesting(source: &str, max_depth: usize) -> Result<(), ParseError> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escaped = false;

    for (pos, c) in source.char_indices() {
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
            '(' | '[' => {
                depth += 1;
                if depth > max_depth {
                    return Err(ParseError::new(
                        ParseErrorKind::MaxDepthExceeded { depth, max_depth },
                        source.to_string(),
                        Span::new(pos, pos + 1),
                    ));
                }
            }
            ')' | ']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}
