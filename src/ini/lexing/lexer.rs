//! Convenience functions for tokenizing INI text
//!
//! The actual tokenization is handled entirely by logos; this module pairs
//! each token with its byte span so later passes can slice the source.

use logos::Logos;

use super::tokens::RawToken;

/// A token and the byte range it covers in the source.
pub type SpannedToken = (RawToken, std::ops::Range<usize>);

/// Tokenize a string, pairing every token with its byte span.
///
/// The raw token set covers every character, so a lexer error can only come
/// from an input logos refuses to classify; such a slice is carried as text
/// to keep the stream lossless.
pub fn tokenize_with_spans(source: &str) -> Vec<SpannedToken> {
    let mut lexer = RawToken::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => tokens.push((RawToken::Text, lexer.span())),
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_tile_the_source() {
        let source = "[a]\nkey = value ; note\n";
        let tokens = tokenize_with_spans(source);

        let mut offset = 0;
        for (_, span) in &tokens {
            assert_eq!(span.start, offset, "gap before {:?}", span);
            offset = span.end;
        }
        assert_eq!(offset, source.len());
    }

    #[test]
    fn slices_reassemble_the_source() {
        let source = "x=1\n; comment\n[s]\n";
        let rebuilt: String = tokenize_with_spans(source)
            .iter()
            .map(|(_, span)| &source[span.clone()])
            .collect();
        assert_eq!(rebuilt, source);
    }
}
