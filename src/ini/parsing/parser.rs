//! Line-oriented parser building the concrete syntax tree
//!
//! The parser walks physical lines, carrying state for constructs that span
//! lines (escape continuations) and for trivia awaiting attachment. Blank
//! lines and standalone comments are held pending and attach to the next
//! construct: a comment run before a key belongs to that key, a comment run
//! before a heading belongs to that section, and a blank run directly
//! before a heading stays with the previous section as its trailing blank.
//!
//! Parsing is all-or-nothing; any error aborts with no partial tree.

use crate::ini::ast::{Arena, NodeId, NodeKind, ParseError, SourceLocation};
use crate::ini::config::GLOBAL_SECTION;
use crate::ini::lexing::{
    classify, group_lines, is_comment_marker, tokenize_with_spans, Line, LineKind, RawToken,
    SpannedToken,
};
use crate::ini::options::{GlobalKeysRule, NameValueDelimiterRule, Options};
use crate::ini::parsing::values::{
    decode_escape, fragments_into, fragments_text, FragmentAccumulator,
};

/// Parse `source` into a tree. Spans are not assigned here; the caller runs
/// the layout pass before using them.
pub fn parse(options: &Options, source: &str) -> Result<(Arena, NodeId), ParseError> {
    let mut parser = Parser::new(options, source);
    parser.run()?;
    Ok((parser.arena, parser.root))
}

struct Parser<'a> {
    source: &'a str,
    options: &'a Options,
    locations: SourceLocation,
    lines: Vec<Line>,
    cursor: usize,
    arena: Arena,
    root: NodeId,
    current_section: Option<NodeId>,
    global_section: Option<NodeId>,
    pending: Vec<NodeId>,
}

impl<'a> Parser<'a> {
    fn new(options: &'a Options, source: &'a str) -> Self {
        let lines = group_lines(tokenize_with_spans(source));
        let mut arena = Arena::new();
        let root = arena.alloc(NodeKind::Root);
        Parser {
            source,
            options,
            locations: SourceLocation::new(source),
            lines,
            cursor: 0,
            arena,
            root,
            current_section: None,
            global_section: None,
            pending: Vec::new(),
        }
    }

    fn run(&mut self) -> Result<(), ParseError> {
        while self.cursor < self.lines.len() {
            match classify(&self.lines[self.cursor], self.options) {
                LineKind::Blank => self.parse_blank_line(),
                LineKind::Comment => self.parse_comment_line(),
                LineKind::SectionHeading => self.parse_heading()?,
                LineKind::KeyLine => self.parse_key_line()?,
            }
        }
        // Trivia left at end of file stays where the document left off
        let container = self.previous_container();
        self.attach_pending(container);
        Ok(())
    }

    fn slice(&self, span: &std::ops::Range<usize>) -> &'a str {
        &self.source[span.clone()]
    }

    fn error_position(&self, byte: usize) -> (usize, usize) {
        let pos = self.locations.byte_to_position(byte);
        (pos.line + 1, pos.column + 1)
    }

    fn previous_container(&self) -> NodeId {
        self.current_section
            .or(self.global_section)
            .unwrap_or(self.root)
    }

    fn attach_pending(&mut self, container: NodeId) {
        for id in self.pending.drain(..) {
            self.arena.push_child(container, id);
        }
    }

    /// The synthetic global section, created when the first global key
    /// appears. Global keys only occur before any heading, so pushing it as
    /// the next root child preserves document order.
    fn ensure_global(&mut self) -> NodeId {
        if let Some(id) = self.global_section {
            return id;
        }
        let id = self.arena.alloc(NodeKind::Section {
            name: GLOBAL_SECTION.to_string(),
        });
        self.arena.push_child(self.root, id);
        self.global_section = Some(id);
        id
    }

    /// Consume a run of inline whitespace tokens into a single leaf.
    fn take_ws(&mut self, parent: NodeId, toks: &[SpannedToken], mut i: usize) -> usize {
        let mut text = String::new();
        while i < toks.len() && toks[i].0.is_inline_whitespace() {
            text.push_str(self.slice(&toks[i].1));
            i += 1;
        }
        if !text.is_empty() {
            let leaf = self.arena.alloc(NodeKind::Token { text });
            self.arena.push_child(parent, leaf);
        }
        i
    }

    fn push_token_leaf(&mut self, parent: NodeId, text: String) {
        let leaf = self.arena.alloc(NodeKind::Token { text });
        self.arena.push_child(parent, leaf);
    }

    /// Decode one escape sequence at `toks[i]` (a backslash) into `acc`.
    /// Used where line continuation does not apply (names, headings).
    fn push_escape(
        &mut self,
        acc: &mut FragmentAccumulator,
        toks: &[SpannedToken],
        i: usize,
    ) -> usize {
        if i + 1 < toks.len() {
            let slice = self.slice(&toks[i + 1].1);
            let mut chars = slice.chars();
            match chars.next() {
                Some(c) => {
                    acc.push_replace(format!("\\{}", c), decode_escape(c).to_string());
                    let rest = chars.as_str();
                    if !rest.is_empty() {
                        acc.push_literal(rest);
                    }
                    i + 2
                }
                None => i + 2,
            }
        } else {
            // A backslash with nothing after it on the line is literal
            acc.push_literal("\\");
            i + 1
        }
    }

    /// A trailing backslash continues the logical line: record the
    /// backslash and line break as a replaceable fragment contributing no
    /// text, then refill the working token list from the next physical
    /// line. Only called when a line break exists.
    fn continue_line(
        &mut self,
        vacc: &mut FragmentAccumulator,
        toks: &mut Vec<SpannedToken>,
        newline: &mut Option<std::ops::Range<usize>>,
    ) {
        if let Some(nl) = newline.take() {
            let raw = format!("\\{}", self.slice(&nl));
            vacc.push_replace(raw, String::new());
        }
        self.cursor += 1;
        if self.cursor < self.lines.len() {
            let next = self.lines[self.cursor].clone();
            *toks = next.tokens;
            *newline = next.newline;
        } else {
            *toks = Vec::new();
        }
    }

    /// A trailing comment: marker token plus everything to the end of the
    /// line's tokens.
    fn trailing_comment(&mut self, toks: &[SpannedToken], marker_idx: usize) -> NodeId {
        let marker_span = toks[marker_idx].1.clone();
        let last_end = toks[toks.len() - 1].1.end;
        let rest = &self.source[marker_span.end..last_end];
        let comment = self.arena.alloc(NodeKind::Comment {
            text: rest.to_string(),
        });
        let marker_text = self.slice(&marker_span).to_string();
        self.push_token_leaf(comment, marker_text);
        if !rest.is_empty() {
            let rest = rest.to_string();
            self.push_token_leaf(comment, rest);
        }
        comment
    }

    fn parse_blank_line(&mut self) {
        let line = &self.lines[self.cursor];
        if let Some(range) = line.byte_range() {
            let text = self.source[range].to_string();
            let leaf = self.arena.alloc(NodeKind::Token { text });
            self.pending.push(leaf);
        }
        self.cursor += 1;
    }

    fn parse_comment_line(&mut self) {
        let line = self.lines[self.cursor].clone();
        let toks = &line.tokens;
        let comment = self.arena.alloc(NodeKind::Comment {
            text: String::new(),
        });
        let i = self.take_ws(comment, toks, 0);
        let marker_span = toks[i].1.clone();
        let marker_text = self.slice(&marker_span).to_string();
        self.push_token_leaf(comment, marker_text);

        let last_end = toks[toks.len() - 1].1.end;
        let rest = self.source[marker_span.end..last_end].to_string();
        if !rest.is_empty() {
            self.push_token_leaf(comment, rest.clone());
        }
        self.arena.node_mut(comment).kind = NodeKind::Comment { text: rest };

        if let Some(span) = &line.newline {
            let text = self.slice(span).to_string();
            self.push_token_leaf(comment, text);
        }
        self.pending.push(comment);
        self.cursor += 1;
    }

    /// Split pending trivia at a section boundary: a leading blank run stays
    /// with the previous container, everything from the first comment on
    /// belongs to the new section.
    fn split_pending(&mut self) -> Vec<NodeId> {
        let first_comment = self
            .pending
            .iter()
            .position(|id| matches!(self.arena.node(*id).kind, NodeKind::Comment { .. }))
            .unwrap_or(self.pending.len());
        let moved = self.pending.split_off(first_comment);
        let container = self.previous_container();
        self.attach_pending(container);
        moved
    }

    fn parse_heading(&mut self) -> Result<(), ParseError> {
        let line = self.lines[self.cursor].clone();
        let toks = &line.tokens;
        let escapes = self.options.escape_sequence_rule().enabled();

        let heading = self.arena.alloc(NodeKind::SectionHeading {
            name: String::new(),
        });
        let mut i = self.take_ws(heading, toks, 0);

        let open_span = toks[i].1.clone();
        let open_byte = open_span.start;
        let open_text = self.slice(&open_span).to_string();
        self.push_token_leaf(heading, open_text);
        i += 1;

        i = self.take_ws(heading, toks, i);

        let mut acc = FragmentAccumulator::new();
        let mut closed = false;
        while i < toks.len() {
            let (tok, span) = toks[i].clone();
            match tok {
                RawToken::CloseBracket => {
                    closed = true;
                    i += 1;
                    break;
                }
                RawToken::Backslash if escapes => {
                    i = self.push_escape(&mut acc, toks, i);
                }
                _ => {
                    let slice = self.slice(&span).to_string();
                    acc.push_literal(&slice);
                    i += 1;
                }
            }
        }
        if !closed {
            let (line, column) = self.error_position(open_byte);
            return Err(ParseError::MalformedSectionHeading { line, column });
        }

        let (fragments, trailing_ws) = acc.finish_trimmed();
        let name = fragments_text(&fragments);
        fragments_into(&mut self.arena, heading, fragments);
        if !trailing_ws.is_empty() {
            self.push_token_leaf(heading, trailing_ws);
        }
        self.push_token_leaf(heading, "]".to_string());

        i = self.take_ws(heading, toks, i);
        if i < toks.len() {
            if is_comment_marker(toks[i].0, self.options) {
                let comment = self.trailing_comment(toks, i);
                self.arena.push_child(heading, comment);
            } else {
                let (line, column) = self.error_position(toks[i].1.start);
                return Err(ParseError::MalformedSectionHeading { line, column });
            }
        }
        if let Some(span) = &line.newline {
            let text = self.slice(span).to_string();
            self.push_token_leaf(heading, text);
        }
        self.arena.node_mut(heading).kind = NodeKind::SectionHeading { name: name.clone() };

        let section = self.arena.alloc(NodeKind::Section { name });
        let leading = self.split_pending();
        for id in leading {
            self.arena.push_child(section, id);
        }
        self.arena.push_child(section, heading);
        self.arena.push_child(self.root, section);
        self.current_section = Some(section);
        self.cursor += 1;
        Ok(())
    }

    fn parse_key_line(&mut self) -> Result<(), ParseError> {
        let rule = self.options.name_value_delimiter_rule();
        let escapes = self.options.escape_sequence_rule().enabled();
        let continuation = self.options.escape_sequence_rule().allows_continuation();
        let quotes = self.options.quotation_rule().enabled();

        let first = self.lines[self.cursor].clone();
        let mut toks = first.tokens;
        let mut newline = first.newline;

        let key = self.arena.alloc(NodeKind::Key);
        let mut i = self.take_ws(key, &toks, 0);
        let name_start_byte = toks[i].1.start;

        // --- key name, up to the first permitted delimiter ---
        let mut acc = FragmentAccumulator::new();
        let mut delimiter: Option<String> = None;
        let mut separator_ws: Option<String> = None;
        let mut comment_idx: Option<usize> = None;
        while i < toks.len() {
            let (tok, span) = toks[i].clone();
            if is_comment_marker(tok, self.options) {
                comment_idx = Some(i);
                break;
            }
            match tok {
                RawToken::Equals if rule.accepts_equals() => {
                    delimiter = Some(self.slice(&span).to_string());
                    i += 1;
                    break;
                }
                RawToken::Colon if rule.accepts_colon() => {
                    delimiter = Some(self.slice(&span).to_string());
                    i += 1;
                    break;
                }
                t if t.is_inline_whitespace()
                    && rule == NameValueDelimiterRule::NoDelimiter
                    && !acc.is_empty() =>
                {
                    let mut ws = String::new();
                    while i < toks.len() && toks[i].0.is_inline_whitespace() {
                        ws.push_str(self.slice(&toks[i].1));
                        i += 1;
                    }
                    separator_ws = Some(ws);
                    break;
                }
                RawToken::Backslash if escapes => {
                    i = self.push_escape(&mut acc, &toks, i);
                }
                _ => {
                    let slice = self.slice(&span).to_string();
                    acc.push_literal(&slice);
                    i += 1;
                }
            }
        }

        let (fragments, name_trailing_ws) = acc.finish_trimmed();
        let name = fragments_text(&fragments);
        let key_name = self.arena.alloc(NodeKind::KeyName { name: name.clone() });
        fragments_into(&mut self.arena, key_name, fragments);
        self.arena.push_child(key, key_name);
        if !name_trailing_ws.is_empty() {
            self.push_token_leaf(key, name_trailing_ws);
        }
        if let Some(sep) = separator_ws {
            self.push_token_leaf(key, sep);
        }
        if let Some(delim) = delimiter {
            self.push_token_leaf(key, delim);
            i = self.take_ws(key, &toks, i);
        }

        // --- value, possibly spanning continuation lines ---
        let mut vacc = FragmentAccumulator::new();
        let mut in_quote: Option<(RawToken, usize)> = None;
        let mut had_quote = false;
        let mut pending_ws = String::new();
        let mut comment_node: Option<NodeId> = None;
        if let Some(idx) = comment_idx {
            // The marker cut the name scan short; there is no value
            comment_node = Some(self.trailing_comment(&toks, idx));
        } else {
            loop {
                if i >= toks.len() {
                    if let Some((_, open_byte)) = in_quote {
                        let (line, column) = self.error_position(open_byte);
                        return Err(ParseError::UnterminatedQuotation { line, column });
                    }
                    break;
                }
                let (tok, span) = toks[i].clone();
                if let Some((open_tok, _)) = in_quote {
                    match tok {
                        t if t == open_tok => {
                            let raw = self.slice(&span).to_string();
                            vacc.push_replace(raw, String::new());
                            in_quote = None;
                            i += 1;
                        }
                        RawToken::Backslash if escapes => {
                            if i + 1 < toks.len() {
                                i = self.push_escape(&mut vacc, &toks, i);
                            } else if continuation && newline.is_some() {
                                self.continue_line(&mut vacc, &mut toks, &mut newline);
                                i = 0;
                            } else {
                                vacc.push_literal("\\");
                                i += 1;
                            }
                        }
                        _ => {
                            let slice = self.slice(&span).to_string();
                            vacc.push_literal(&slice);
                            i += 1;
                        }
                    }
                    continue;
                }

                if is_comment_marker(tok, self.options) {
                    comment_node = Some(self.trailing_comment(&toks, i));
                    break;
                }
                match tok {
                    t if t.is_inline_whitespace() => {
                        pending_ws.push_str(self.slice(&span));
                        i += 1;
                    }
                    t if t.is_quote() && quotes && !had_quote && vacc.is_empty() => {
                        let raw = self.slice(&span).to_string();
                        vacc.push_replace(raw, String::new());
                        in_quote = Some((t, span.start));
                        had_quote = true;
                        i += 1;
                    }
                    RawToken::Backslash if escapes => {
                        if !pending_ws.is_empty() {
                            let ws = std::mem::take(&mut pending_ws);
                            vacc.push_literal(&ws);
                        }
                        if i + 1 < toks.len() {
                            i = self.push_escape(&mut vacc, &toks, i);
                        } else if continuation && newline.is_some() {
                            self.continue_line(&mut vacc, &mut toks, &mut newline);
                            i = 0;
                        } else {
                            vacc.push_literal("\\");
                            i += 1;
                        }
                    }
                    _ => {
                        if !pending_ws.is_empty() {
                            let ws = std::mem::take(&mut pending_ws);
                            vacc.push_literal(&ws);
                        }
                        let slice = self.slice(&span).to_string();
                        vacc.push_literal(&slice);
                        i += 1;
                    }
                }
            }
        }

        // Assemble the tail of the key line in document order: value,
        // trailing whitespace, trailing comment, line break.
        let fragments = vacc.finish();
        let value = fragments_text(&fragments);
        let key_value = self.arena.alloc(NodeKind::KeyValue {
            value: value.clone(),
        });
        fragments_into(&mut self.arena, key_value, fragments);
        self.arena.push_child(key, key_value);

        if !pending_ws.is_empty() {
            self.push_token_leaf(key, pending_ws);
        }
        if let Some(comment) = comment_node {
            self.arena.push_child(key, comment);
        }
        if let Some(span) = &newline {
            let text = self.slice(span).to_string();
            self.push_token_leaf(key, text);
        }

        // Keys before any heading require the global keys rule
        if self.current_section.is_none()
            && self.options.global_keys_rule() == GlobalKeysRule::DisallowGlobalKeys
        {
            let (line, column) = self.error_position(name_start_byte);
            return Err(ParseError::DisallowedGlobalKey {
                key: name,
                line,
                column,
            });
        }
        let container = match self.current_section {
            Some(section) => section,
            None => self.ensure_global(),
        };
        self.attach_pending(container);
        self.arena.push_child(container, key);
        self.cursor += 1;
        Ok(())
    }
}
