//! Parses the argument list that follows an annotation marker.
//!
//! `OBS_PROP("min=0", "max=100", "hidden")` yields `min=0`, `max=100` and
//! `hidden=1`. Malformed arguments are skipped one at a time; a marker that is
//! not followed by a parenthesized list is an error for the whole declaration.

use thiserror::Error;
use tracing::warn;

use crate::frontend::{Token, TokenKind};
use crate::shared::Attribute;

/// Value given to a bare `key` argument.
pub const DEFAULT_VALUE: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("expected `(` after annotation marker on line {line}, found `{found}`")]
    ExpectedOpenParen { line: usize, found: String },

    #[error("annotation argument list opened on line {line} is never closed")]
    Unterminated { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    ExpectOpenParen,
    CollectArguments,
    Done,
}

/// Parses the tokens immediately following a marker.
///
/// `marker_line` is only used for error reporting.
///
/// ## Errors
/// Returns an error when the first token is not `(`, or when the list is not
/// closed before the declaration it annotates begins.
pub fn parse_attributes(
    tokens: &[Token],
    marker_line: usize,
) -> Result<Vec<Attribute>, AttributeError> {
    let mut attributes = Vec::new();
    let mut state = ParseState::ExpectOpenParen;
    let mut remaining = tokens.iter();

    while state != ParseState::Done {
        let Some(token) = remaining.next() else {
            return Err(match state {
                ParseState::ExpectOpenParen => AttributeError::ExpectedOpenParen {
                    line: marker_line,
                    found: "end of file".to_string(),
                },
                _ => AttributeError::Unterminated { line: marker_line },
            });
        };

        state = match state {
            ParseState::ExpectOpenParen if token.is_punctuation("(") => ParseState::CollectArguments,
            ParseState::ExpectOpenParen => {
                return Err(AttributeError::ExpectedOpenParen {
                    line: token.line,
                    found: token.text.clone(),
                });
            }
            ParseState::CollectArguments if token.is_punctuation(")") => ParseState::Done,
            ParseState::CollectArguments if ends_declaration(token) => {
                return Err(AttributeError::Unterminated { line: marker_line });
            }
            ParseState::CollectArguments => {
                if token.kind == TokenKind::StringLiteral {
                    let raw = token.string_value().unwrap_or_default();
                    if let Some(attribute) = split_argument(&raw, token.line) {
                        attributes.push(attribute);
                    }
                }
                ParseState::CollectArguments
            }
            ParseState::Done => ParseState::Done,
        };
    }

    Ok(attributes)
}

/// Splits one argument on its first `=`, applying the malformed-input policy.
fn split_argument(raw: &str, line: usize) -> Option<Attribute> {
    let (name, value) = match raw.split_once('=') {
        Some((name, value)) => (name.trim(), value.trim()),
        None => (raw.trim(), ""),
    };

    if name.is_empty() {
        warn!(line, argument = raw, "skipping annotation argument without a name");
        return None;
    }

    if value.contains('=') {
        warn!(
            line,
            argument = raw,
            "skipping annotation argument with more than one `=`"
        );
        return None;
    }

    let value = if value.is_empty() { DEFAULT_VALUE } else { value };
    Some(Attribute::new(name, value))
}

/// Tokens that can only appear once the annotated declaration has started.
fn ends_declaration(token: &Token) -> bool {
    token.is_punctuation(";") || token.is_punctuation("{") || token.is_punctuation("}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::tokenize;

    fn parse(source: &str) -> Result<Vec<Attribute>, AttributeError> {
        parse_attributes(&tokenize(source), 1)
    }

    #[test]
    fn parses_keys_and_values_in_order() -> Result<(), AttributeError> {
        let attributes = parse("(\"min=0\", \"max=100\", \"hidden\") int a;")?;

        assert_eq!(
            attributes,
            vec![
                Attribute::new("min", "0"),
                Attribute::new("max", "100"),
                Attribute::new("hidden", "1"),
            ]
        );
        Ok(())
    }

    #[test]
    fn empty_list_yields_no_attributes() -> Result<(), AttributeError> {
        assert!(parse("() struct S {};")?.is_empty());
        Ok(())
    }

    #[test]
    fn drops_empty_and_multiply_assigned_arguments() -> Result<(), AttributeError> {
        let attributes = parse("(\"\", \"multi=a=b\", \"standalone\")")?;
        assert_eq!(attributes, vec![Attribute::new("standalone", "1")]);

        let attributes = parse("(\"=\", \"valid=yes\")")?;
        assert_eq!(attributes, vec![Attribute::new("valid", "yes")]);

        let attributes = parse("(\"a=b=c\", \"simple\")")?;
        assert_eq!(attributes, vec![Attribute::new("simple", "1")]);
        Ok(())
    }

    #[test]
    fn trailing_equals_defaults_value() -> Result<(), AttributeError> {
        assert_eq!(parse("(\"flag=\")")?, vec![Attribute::new("flag", "1")]);
        Ok(())
    }

    #[test]
    fn ignores_non_literal_tokens() -> Result<(), AttributeError> {
        let attributes = parse("(\"a=1\", 42, name, \"b\")")?;

        assert_eq!(attributes, vec![Attribute::new("a", "1"), Attribute::new("b", "1")]);
        Ok(())
    }

    #[test]
    fn keeps_escaped_quotes_in_values() -> Result<(), AttributeError> {
        let attributes = parse(r#"("label=say \"hi\"", "path=C:\\temp")"#)?;

        assert_eq!(
            attributes,
            vec![
                Attribute::new("label", "say \"hi\""),
                Attribute::new("path", "C:\\temp"),
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_open_paren_is_an_error() {
        let error = parse("enum class E {};").unwrap_err();

        assert_eq!(
            error,
            AttributeError::ExpectedOpenParen {
                line: 1,
                found: "enum".to_string()
            }
        );
    }

    #[test]
    fn unterminated_list_is_an_error() {
        assert_eq!(
            parse("(\"a=1\" int x;").unwrap_err(),
            AttributeError::Unterminated { line: 1 }
        );
        assert_eq!(parse("(\"a=1\"").unwrap_err(), AttributeError::Unterminated { line: 1 });
    }

    #[test]
    #[tracing_test::traced_test]
    fn logs_skipped_arguments() -> Result<(), AttributeError> {
        parse("(\"=\", \"x=1=2\")")?;

        assert!(logs_contain("without a name"));
        assert!(logs_contain("more than one"));
        Ok(())
    }
}
