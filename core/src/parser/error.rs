use core::ops::Range;

use crate::parser::Rule;
use crate::{String, ToString, Vec, format};

/// Parser error with the byte range it refers to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
}

/// Specific kinds of parse errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    /// Unexpected token
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },

    /// Integer literal outside the `i32` range
    #[error("integer literal `{text}` does not fit in 32 bits")]
    InvalidNumber { text: String },

    /// Maximum nesting depth exceeded
    #[error("expression nesting depth exceeds maximum of {max_depth} levels")]
    MaxDepthExceeded { depth: usize, max_depth: usize },
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Convert a pest error into a [`ParseError`] that names what was expected
/// in terms a user would recognize.
pub(crate) fn convert_pest_error(err: pest::error::Error<Rule>, source: &str) -> ParseError {
    use pest::error::{ErrorVariant, InputLocation};

    let span = match err.location {
        InputLocation::Pos(pos) => pos..pos,
        InputLocation::Span((start, end)) => start..end,
    };

    let expected = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } => format_expected_rules(positives),
        ErrorVariant::CustomError { message } => message.clone(),
    };
    let found = describe_input_at(source, span.start);

    // Point at the offending character rather than an empty position.
    let end = source[span.start..]
        .chars()
        .next()
        .map_or(span.start, |ch| span.start + ch.len_utf8());
    ParseError::new(
        ParseErrorKind::UnexpectedToken { expected, found },
        span.start..end.max(span.end),
    )
}

/// Format expected rules in a human-readable way
fn format_expected_rules(rules: &[Rule]) -> String {
    let mut concepts: Vec<&str> = Vec::new();

    for rule in rules {
        let concept = match rule {
            Rule::integer | Rule::neg_integer => "integer",
            Rule::ident => "identifier",
            Rule::expression | Rule::binary | Rule::neg | Rule::bit_not | Rule::not | Rule::plus => {
                "expression"
            }
            Rule::conditional => "`?`",
            Rule::EOI => "end of input",
            _ => "operator",
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

/// Describe the input starting at `pos`
fn describe_input_at(source: &str, pos: usize) -> String {
    match source[pos..].chars().next() {
        None => "end of input".to_string(),
        Some(ch) => format!("`{}`", ch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_expected_rules() {
        assert_eq!(format_expected_rules(&[Rule::integer, Rule::neg_integer]), "integer");
        assert_eq!(
            format_expected_rules(&[Rule::integer, Rule::ident, Rule::EOI]),
            "integer, identifier or end of input"
        );
        assert_eq!(format_expected_rules(&[]), "something else");
    }

    #[test]
    fn test_describe_input() {
        assert_eq!(describe_input_at("a + $", 4), "`$`");
        assert_eq!(describe_input_at("a +", 3), "end of input");
    }

    #[test]
    fn test_display() {
        let error = ParseError::new(
            ParseErrorKind::UnexpectedToken {
                expected: "expression".to_string(),
                found: "`)`".to_string(),
            },
            9..10,
        );
        assert_eq!(error.to_string(), "expected expression, found `)`");
        assert_eq!(error.span, 9..10);
    }
}
