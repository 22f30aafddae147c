//! Raw token definitions for INI-dialect text
//!
//! The raw token layer is dialect-independent: it recognizes every
//! character that *could* be significant under some rule set (brackets,
//! delimiters, comment markers, quotes, backslashes, whitespace, line
//! breaks) and a catch-all text token for everything else. Which of these
//! actually matter is decided later against the active `Options`.
//! Tokenization is handled entirely by logos.

use logos::Logos;
use serde::{Deserialize, Serialize};

/// All raw tokens. Token text is recovered from the source by span, so the
/// variants are fieldless.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawToken {
    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[token("=")]
    Equals,

    #[token(":")]
    Colon,

    #[token("#")]
    Hash,

    #[token(";")]
    Semicolon,

    #[token("\"")]
    DoubleQuote,

    #[token("'")]
    SingleQuote,

    #[token("\\")]
    Backslash,

    // A line break; \r\n is kept as one token so the original style survives
    #[regex(r"\r?\n")]
    Newline,

    // A bare carriage return not followed by a line feed
    #[token("\r")]
    CarriageReturn,

    #[regex(r"[ \t]+")]
    Whitespace,

    // Catch-all for runs of non-special characters
    #[regex(r#"[^\[\]=:#;"'\\ \t\r\n]+"#)]
    Text,
}

impl RawToken {
    /// Whitespace that does not end the line.
    pub fn is_inline_whitespace(self) -> bool {
        matches!(self, RawToken::Whitespace | RawToken::CarriageReturn)
    }

    pub fn is_quote(self) -> bool {
        matches!(self, RawToken::DoubleQuote | RawToken::SingleQuote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini::lexing::lexer::tokenize_with_spans;

    fn kinds(source: &str) -> Vec<RawToken> {
        tokenize_with_spans(source)
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn key_value_line() {
        assert_eq!(
            kinds("key = value"),
            vec![
                RawToken::Text,
                RawToken::Whitespace,
                RawToken::Equals,
                RawToken::Whitespace,
                RawToken::Text
            ]
        );
    }

    #[test]
    fn section_heading_line() {
        assert_eq!(
            kinds("[server]\n"),
            vec![
                RawToken::OpenBracket,
                RawToken::Text,
                RawToken::CloseBracket,
                RawToken::Newline
            ]
        );
    }

    #[test]
    fn crlf_is_one_newline_token() {
        assert_eq!(kinds("a\r\nb"), vec![RawToken::Text, RawToken::Newline, RawToken::Text]);
    }

    #[test]
    fn bare_carriage_return_is_not_a_newline() {
        assert_eq!(kinds("a\rb"), vec![RawToken::Text, RawToken::CarriageReturn, RawToken::Text]);
    }

    #[test]
    fn unicode_text_is_a_single_run() {
        assert_eq!(kinds("schlüssel"), vec![RawToken::Text]);
    }
}
