use std::fmt::Write;

/// Escapes text for the body of a C++ narrow string literal.
///
/// Quotes, backslashes and the common whitespace escapes get their short
/// forms; any other control character becomes a three-digit octal escape.
pub fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for ch in text.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            ch if ch.is_ascii_control() => {
                let _ = write!(escaped, "\\{:03o}", ch as u32);
            }
            ch => escaped.push(ch),
        }
    }

    escaped
}

/// A complete, quoted C++ string literal.
pub fn string_literal(text: &str) -> String {
    format!("\"{}\"", escape_literal(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::token::decode_escapes;

    #[test]
    fn escapes_quotes_and_backslashes() {
        assert_eq!(escape_literal(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape_literal(r"C:\temp"), r"C:\\temp");
        assert_eq!(string_literal("a\nb"), "\"a\\nb\"");
    }

    #[test]
    fn escapes_other_controls_as_octal() {
        assert_eq!(escape_literal("\u{1}x\u{7f}"), "\\001x\\177");
    }

    #[test]
    fn decoding_restores_the_original() {
        for original in ["plain", "quote \" and \\ slash", "tab\tline\nend\r", "bell\u{7}"] {
            assert_eq!(decode_escapes(&escape_literal(original)), original);
        }
    }
}
