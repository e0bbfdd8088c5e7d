//! Error rendering using ariadne
//!
//! Compile errors carry their own source text. Evaluation errors only carry
//! a span, so the caller passes the source the script was compiled from.

use std::io::Write;

use ariadne::{ColorGenerator, Label, Report, ReportKind, Source};

use crate::{CompileError, Diagnostic, EvaluationError, Severity};

/// Render a compile error to stderr.
///
/// # Example
/// ```no_run
/// if let Err(err) = kiln::compile("rules", "(let [x] x)") {
///     kiln::render_compile_error(&err);
/// }
/// ```
pub fn render_compile_error(error: &CompileError) {
    render_compile_error_to_writer(error, &mut std::io::stderr(), true).ok();
}

/// Render a compile error to a String (useful for logs, web UIs, etc.)
pub fn render_compile_error_to_string(error: &CompileError) -> String {
    let mut buf = Vec::new();
    render_compile_error_to_writer(error, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Same as [`render_compile_error_to_string`] without ANSI color codes.
pub fn render_compile_error_to_string_no_color(error: &CompileError) -> String {
    let mut buf = Vec::new();
    render_compile_error_to_writer(error, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an evaluation error against the source of the failing script.
pub fn render_evaluation_error(error: &EvaluationError, source: &str) {
    render_evaluation_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an evaluation error to a String.
///
/// # Example
/// ```
/// use kiln::Binding;
///
/// let source = "(/ 1 n)";
/// let script = kiln::compile("ratio", source).unwrap();
/// let err = kiln::evaluate(&script, Binding::from_pairs([("n", 0)]).unwrap()).unwrap_err();
///
/// let rendered = kiln::render_evaluation_error_to_string_no_color(&err, source);
/// assert!(rendered.contains("Division by zero"));
/// ```
pub fn render_evaluation_error_to_string(error: &EvaluationError, source: &str) -> String {
    let mut buf = Vec::new();
    render_evaluation_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Same as [`render_evaluation_error_to_string`] without ANSI color codes.
pub fn render_evaluation_error_to_string_no_color(error: &EvaluationError, source: &str) -> String {
    let mut buf = Vec::new();
    render_evaluation_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_compile_error_to_writer(
    error: &CompileError,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        CompileError::EmptyName => writeln!(writer, "Error: {}", error),
        CompileError::Invalid {
            name,
            source_text,
            diagnostics,
        } => render_diagnostics(name, source_text, diagnostics, writer, use_color),
    }
}

fn render_evaluation_error_to_writer(
    error: &EvaluationError,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    render_diagnostics(
        error.script(),
        source,
        &[error.to_diagnostic()],
        writer,
        use_color,
    )
}

fn render_diagnostics(
    name: &str,
    source: &str,
    diagnostics: &[Diagnostic],
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    for diag in diagnostics {
        let mut colors = ColorGenerator::new();
        colors.next(); // Skip the first color.

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let mut report = Report::build(kind, (name, diag.span.0.clone()))
            .with_message(&diag.message)
            .with_config(ariadne::Config::default().with_color(use_color));

        if let Some(code) = &diag.code {
            report = report.with_code(code);
        }

        let color = colors.next();
        report = report.with_label(
            Label::new((name, diag.span.0.clone()))
                .with_message(&diag.message)
                .with_color(color),
        );

        for related in &diag.related {
            let color = colors.next();
            report = report.with_label(
                Label::new((name, related.span.0.clone()))
                    .with_message(&related.message)
                    .with_color(color),
            );
        }

        for help_msg in &diag.help {
            report = report.with_help(help_msg);
        }

        report.finish().write((name, Source::from(source)), &mut *writer)?;
    }

    Ok(())
}
