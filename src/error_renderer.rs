//! Error rendering using ariadne
//!
//! Parse errors are drawn as a report with the offending source range
//! underlined. Errors from later stages have no source location and are
//! printed as a single line.

use crate::{Error, ParseError};
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::io::Write;

const SOURCE_ID: &str = "<input>";

/// Render an error with source context to stderr
///
/// # Example
/// ```no_run
/// use minmath::{Engine, EngineOptions, render_error};
///
/// let engine = Engine::new(EngineOptions::default());
/// let source = "1 + * 2";
/// if let Err(e) = engine.compile_source(source) {
///     render_error(&e, source);
/// }
/// ```
pub fn render_error(error: &Error, source: &str) {
    render_error_to_writer(error, source, &mut std::io::stderr(), true).ok();
}

/// Render an error to a specific writer
pub fn render_error_to(error: &Error, source: &str, writer: &mut dyn Write) -> std::io::Result<()> {
    render_error_to_writer(error, source, writer, true)
}

/// Render an error to a String
pub fn render_error_to_string(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, true).ok();
    String::from_utf8_lossy(&buf).to_string()
}

/// Render an error to a String without color codes (useful for tests)
pub fn render_error_to_string_no_color(error: &Error, source: &str) -> String {
    let mut buf = Vec::new();
    render_error_to_writer(error, source, &mut buf, false).ok();
    String::from_utf8_lossy(&buf).to_string()
}

fn render_error_to_writer(
    error: &Error,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    match error {
        Error::Parse(err) => render_parse_error(err, source, writer, use_color),
        Error::Compilation(fault) => writeln!(writer, "Error: {}", fault),
        Error::Runtime(err) => writeln!(writer, "Error: {}", err),
        Error::UnknownParameter { name } => writeln!(writer, "Error: unknown parameter `{}`", name),
    }
}

fn render_parse_error(
    err: &ParseError,
    source: &str,
    writer: &mut dyn Write,
    use_color: bool,
) -> std::io::Result<()> {
    // ariadne works in character offsets; the parser reports bytes.
    let start = source[..err.span.start].chars().count();
    let end = start + source[err.span.clone()].chars().count();

    Report::build(ReportKind::Error, (SOURCE_ID, start..end))
        .with_message("could not parse expression")
        .with_config(Config::default().with_color(use_color))
        .with_label(
            Label::new((SOURCE_ID, start..end))
                .with_message(err.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .write((SOURCE_ID, Source::from(source)), &mut *writer)
}
