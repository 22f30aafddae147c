//! Line grouping and classification
//!
//! INI is line-oriented, so parsing runs over physical lines: the token
//! stream is grouped at newline tokens, then each line is classified
//! against the active `Options` (a `;` line is only a comment when the
//! comment rule says so). Continuation lines are the parser's business;
//! grouping here is strictly physical.

use crate::ini::lexing::lexer::SpannedToken;
use crate::ini::lexing::tokens::RawToken;
use crate::ini::options::Options;

/// One physical line: its tokens and, unless the file ends without one,
/// the byte range of its line break.
#[derive(Debug, Clone)]
pub struct Line {
    pub tokens: Vec<SpannedToken>,
    pub newline: Option<std::ops::Range<usize>>,
}

impl Line {
    /// The first token that is not inline whitespace.
    pub fn first_significant(&self) -> Option<&SpannedToken> {
        self.tokens
            .iter()
            .find(|(token, _)| !token.is_inline_whitespace())
    }

    /// Byte range from the first token to the end of the line break.
    pub fn byte_range(&self) -> Option<std::ops::Range<usize>> {
        let start = self.tokens.first().map(|(_, span)| span.start);
        let end = self
            .newline
            .as_ref()
            .map(|span| span.end)
            .or_else(|| self.tokens.last().map(|(_, span)| span.end));
        match (start, end) {
            (Some(start), Some(end)) => Some(start..end),
            (None, Some(end)) => self.newline.as_ref().map(|span| span.start..end),
            _ => None,
        }
    }
}

/// The classification of a physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    Comment,
    SectionHeading,
    KeyLine,
}

/// Group a token stream into physical lines.
pub fn group_lines(tokens: Vec<SpannedToken>) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut current = Vec::new();

    for (token, span) in tokens {
        if token == RawToken::Newline {
            lines.push(Line {
                tokens: std::mem::take(&mut current),
                newline: Some(span),
            });
        } else {
            current.push((token, span));
        }
    }

    if !current.is_empty() {
        lines.push(Line {
            tokens: current,
            newline: None,
        });
    }

    lines
}

/// Whether `token` starts a comment under the active comment rule.
pub fn is_comment_marker(token: RawToken, options: &Options) -> bool {
    match token {
        RawToken::Hash => options.comment_rule().allows_hash(),
        RawToken::Semicolon => options.comment_rule().allows_semicolon(),
        _ => false,
    }
}

/// Classify a line against the active rules.
pub fn classify(line: &Line, options: &Options) -> LineKind {
    match line.first_significant() {
        None => LineKind::Blank,
        Some((token, _)) if is_comment_marker(*token, options) => LineKind::Comment,
        Some((RawToken::OpenBracket, _)) => LineKind::SectionHeading,
        Some(_) => LineKind::KeyLine,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ini::lexing::lexer::tokenize_with_spans;
    use crate::ini::options::CommentRule;

    fn lines_of(source: &str) -> Vec<Line> {
        group_lines(tokenize_with_spans(source))
    }

    #[test]
    fn groups_at_newlines() {
        let lines = lines_of("[a]\nx=1\n\ny=2");
        assert_eq!(lines.len(), 4);
        assert!(lines[0].newline.is_some());
        assert!(lines[3].newline.is_none());
        assert!(lines[2].tokens.is_empty());
    }

    #[test]
    fn classification_follows_comment_rule() {
        let lines = lines_of("; note\n");
        let default = Options::default();
        assert_eq!(classify(&lines[0], &default), LineKind::Comment);

        let hash_only = Options::default().with_comment_rule(CommentRule::HashComments);
        assert_eq!(classify(&lines[0], &hash_only), LineKind::KeyLine);
    }

    #[test]
    fn whitespace_only_line_is_blank() {
        let lines = lines_of("   \n");
        assert_eq!(classify(&lines[0], &Options::default()), LineKind::Blank);
    }

    #[test]
    fn heading_line() {
        let lines = lines_of("  [a]\n");
        assert_eq!(
            classify(&lines[0], &Options::default()),
            LineKind::SectionHeading
        );
    }
}
