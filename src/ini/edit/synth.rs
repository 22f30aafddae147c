//! Synthesis of new tree nodes, formatted per `Options`
//!
//! Mutations that introduce content (a new key line, a new section heading,
//! a comment) build it here. Names and values are first validated against
//! the active rules: text that could not survive a re-parse (a line break
//! with escapes off, a delimiter character inside a key name) is rejected
//! rather than written.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ini::ast::{Arena, EditError, NodeId, NodeKind};
use crate::ini::options::{
    NameValueDelimiterPreferenceRule, NameValueDelimiterRule, NameValueDelimiterSpacingRule,
    Options, QuotationRule,
};
use crate::ini::parsing::values::{fragments_into, Fragment, FragmentAccumulator};

static LINE_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]").expect("valid pattern"));

fn has_line_break(text: &str) -> bool {
    LINE_BREAK.is_match(text)
}

fn marker_chars(options: &Options) -> Vec<char> {
    let rule = options.comment_rule();
    let mut chars = Vec::new();
    if rule.allows_hash() {
        chars.push('#');
    }
    if rule.allows_semicolon() {
        chars.push(';');
    }
    chars
}

fn delimiter_chars(options: &Options) -> Vec<char> {
    let rule = options.name_value_delimiter_rule();
    let mut chars = Vec::new();
    if rule.accepts_equals() {
        chars.push('=');
    }
    if rule.accepts_colon() {
        chars.push(':');
    }
    chars
}

/// The delimiter written for synthesized keys, `None` under `NoDelimiter`.
pub fn written_delimiter(options: &Options) -> Option<&'static str> {
    match options.name_value_delimiter_rule() {
        NameValueDelimiterRule::EqualsDelimiter => Some("="),
        NameValueDelimiterRule::ColonDelimiter => Some(":"),
        NameValueDelimiterRule::EqualsOrColonDelimiter => {
            match options.name_value_delimiter_preference_rule() {
                NameValueDelimiterPreferenceRule::PreferColonDelimiter => Some(":"),
                _ => Some("="),
            }
        }
        NameValueDelimiterRule::NoDelimiter => None,
    }
}

pub fn validate_section_name(options: &Options, name: &str) -> Result<(), EditError> {
    if options.escape_sequence_rule().enabled() {
        return Ok(());
    }
    let err = || EditError::UnrepresentableName {
        name: name.to_string(),
    };
    if has_line_break(name) || name.contains(']') || name.trim() != name || name.is_empty() {
        return Err(err());
    }
    Ok(())
}

pub fn validate_key_name(options: &Options, name: &str) -> Result<(), EditError> {
    if options.escape_sequence_rule().enabled() {
        return Ok(());
    }
    let err = || EditError::UnrepresentableName {
        name: name.to_string(),
    };
    if has_line_break(name) || name.trim() != name {
        return Err(err());
    }
    if name.starts_with('[') {
        return Err(err());
    }
    if marker_chars(options).iter().any(|c| name.contains(*c)) {
        return Err(err());
    }
    if delimiter_chars(options).iter().any(|c| name.contains(*c)) {
        return Err(err());
    }
    if options.name_value_delimiter_rule() == NameValueDelimiterRule::NoDelimiter
        && name.contains([' ', '\t'])
    {
        return Err(err());
    }
    Ok(())
}

pub fn validate_value(options: &Options, value: &str) -> Result<(), EditError> {
    if options.escape_sequence_rule().enabled() {
        return Ok(());
    }
    let err = || EditError::UnrepresentableValue {
        value: value.to_string(),
    };
    if has_line_break(value) {
        return Err(err());
    }
    let quoted = match options.quotation_rule() {
        QuotationRule::AlwaysUseQuotation => true,
        _ => value_needs_quotes(options, value),
    };
    if quoted {
        if !options.quotation_rule().enabled() {
            return Err(err());
        }
        // Quoting uses whichever quote character the value does not contain
        if value.contains('"') && value.contains('\'') {
            return Err(err());
        }
    }
    Ok(())
}

pub fn validate_comment_text(text: &str) -> Result<(), EditError> {
    if has_line_break(text) {
        return Err(EditError::UnrepresentableValue {
            value: text.to_string(),
        });
    }
    Ok(())
}

/// Whether a value must be quoted to survive a re-parse.
fn value_needs_quotes(options: &Options, value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let edge_ws = value.starts_with([' ', '\t']) || value.ends_with([' ', '\t']);
    let has_marker = marker_chars(options).iter().any(|c| value.contains(*c));
    // With quote processing on, a leading quote character would otherwise
    // open a quotation on re-parse
    let leading_quote =
        options.quotation_rule().enabled() && value.starts_with(['"', '\'']);
    edge_ws || has_marker || leading_quote
}

fn escape_char(acc: &mut FragmentAccumulator, c: char) {
    let (raw, text) = match c {
        '\0' => ("\\0".to_string(), c),
        '\x07' => ("\\a".to_string(), c),
        '\x08' => ("\\b".to_string(), c),
        '\x0C' => ("\\f".to_string(), c),
        '\n' => ("\\n".to_string(), c),
        '\r' => ("\\r".to_string(), c),
        '\t' => ("\\t".to_string(), c),
        '\x0B' => ("\\v".to_string(), c),
        other => (format!("\\{}", other), other),
    };
    acc.push_replace(raw, text.to_string());
}

/// Encode `text`, escaping every character in `specials`, every control
/// character, and (when `escape_edge_ws`) whitespace at either end.
fn encode(text: &str, specials: &[char], escape_edge_ws: bool) -> Vec<Fragment> {
    let mut acc = FragmentAccumulator::new();
    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        let edge = i == 0 || i == chars.len() - 1;
        let is_ws = *c == ' ' || *c == '\t';
        if *c == '\\'
            || specials.contains(c)
            || c.is_control()
            || (escape_edge_ws && edge && is_ws)
        {
            escape_char(&mut acc, *c);
        } else {
            let mut buf = [0u8; 4];
            acc.push_literal(c.encode_utf8(&mut buf));
        }
    }
    acc.finish()
}

pub fn encode_section_name(options: &Options, name: &str) -> Vec<Fragment> {
    if !options.escape_sequence_rule().enabled() {
        return vec![Fragment::Literal(name.to_string())];
    }
    encode(name, &[']'], true)
}

pub fn encode_key_name(options: &Options, name: &str) -> Vec<Fragment> {
    if !options.escape_sequence_rule().enabled() {
        return vec![Fragment::Literal(name.to_string())];
    }
    let mut specials = marker_chars(options);
    specials.extend(delimiter_chars(options));
    specials.push('[');
    let escape_all_ws =
        options.name_value_delimiter_rule() == NameValueDelimiterRule::NoDelimiter;
    if escape_all_ws {
        specials.push(' ');
        specials.push('\t');
    }
    encode(name, &specials, true)
}

pub fn encode_value(options: &Options, value: &str) -> Vec<Fragment> {
    let escapes = options.escape_sequence_rule().enabled();
    let quote = match options.quotation_rule() {
        QuotationRule::AlwaysUseQuotation => true,
        QuotationRule::UseQuotation => value_needs_quotes(options, value),
        QuotationRule::IgnoreQuotation => false,
    };

    if quote {
        let q = if value.contains('"') && (!escapes || value.contains('\'')) {
            '\''
        } else {
            '"'
        };
        let mut fragments = vec![Fragment::Replace {
            raw: q.to_string(),
            text: String::new(),
        }];
        if escapes {
            fragments.extend(encode(value, &[q], false));
        } else if !value.is_empty() {
            fragments.push(Fragment::Literal(value.to_string()));
        }
        fragments.push(Fragment::Replace {
            raw: q.to_string(),
            text: String::new(),
        });
        return fragments;
    }

    if !escapes {
        if value.is_empty() {
            return Vec::new();
        }
        return vec![Fragment::Literal(value.to_string())];
    }
    encode(value, &marker_chars(options), true)
}

/// Build a complete key line: name, delimiter with spacing, value, line
/// break.
pub fn synth_key_line(
    arena: &mut Arena,
    options: &Options,
    key: &str,
    value: &str,
) -> Result<NodeId, EditError> {
    validate_key_name(options, key)?;
    validate_value(options, value)?;

    let line = arena.alloc(NodeKind::Key);
    let key_name = arena.alloc(NodeKind::KeyName {
        name: key.to_string(),
    });
    fragments_into(arena, key_name, encode_key_name(options, key));
    arena.push_child(line, key_name);

    match written_delimiter(options) {
        Some(delimiter) => {
            let spacing = options.name_value_delimiter_spacing_rule();
            let left = matches!(
                spacing,
                NameValueDelimiterSpacingRule::BothSides | NameValueDelimiterSpacingRule::LeftOnly
            );
            let right = matches!(
                spacing,
                NameValueDelimiterSpacingRule::BothSides
                    | NameValueDelimiterSpacingRule::RightOnly
            );
            if left {
                push_ws(arena, line);
            }
            let leaf = arena.alloc(NodeKind::Token {
                text: delimiter.to_string(),
            });
            arena.push_child(line, leaf);
            if right {
                push_ws(arena, line);
            }
        }
        None => push_ws(arena, line),
    }

    let key_value = arena.alloc(NodeKind::KeyValue {
        value: value.to_string(),
    });
    fragments_into(arena, key_value, encode_value(options, value));
    arena.push_child(line, key_value);

    let newline = arena.alloc(NodeKind::Newline);
    arena.push_child(line, newline);
    Ok(line)
}

fn push_ws(arena: &mut Arena, parent: NodeId) {
    let leaf = arena.alloc(NodeKind::Token {
        text: " ".to_string(),
    });
    arena.push_child(parent, leaf);
}

/// Build a section node holding its heading line and one key line.
pub fn synth_section(
    arena: &mut Arena,
    options: &Options,
    name: &str,
    key_line: NodeId,
) -> Result<NodeId, EditError> {
    validate_section_name(options, name)?;

    let heading = arena.alloc(NodeKind::SectionHeading {
        name: name.to_string(),
    });
    let open = arena.alloc(NodeKind::Token {
        text: "[".to_string(),
    });
    arena.push_child(heading, open);
    fragments_into(arena, heading, encode_section_name(options, name));
    let close = arena.alloc(NodeKind::Token {
        text: "]".to_string(),
    });
    arena.push_child(heading, close);
    let newline = arena.alloc(NodeKind::Newline);
    arena.push_child(heading, newline);

    let section = arena.alloc(NodeKind::Section {
        name: name.to_string(),
    });
    arena.push_child(section, heading);
    arena.push_child(section, key_line);
    Ok(section)
}

/// Build a comment node. `own_line` comments carry their own line break;
/// same-line comments are appended to an existing line.
pub fn synth_comment(
    arena: &mut Arena,
    options: &Options,
    text: &str,
    own_line: bool,
) -> Result<NodeId, EditError> {
    validate_comment_text(text)?;

    let body = if text.is_empty() {
        String::new()
    } else {
        format!(" {}", text)
    };
    let comment = arena.alloc(NodeKind::Comment { text: body.clone() });
    let marker = arena.alloc(NodeKind::Token {
        text: options.comment_rule().preferred_marker().to_string(),
    });
    arena.push_child(comment, marker);
    if !body.is_empty() {
        let leaf = arena.alloc(NodeKind::Token { text: body });
        arena.push_child(comment, leaf);
    }
    if own_line {
        let newline = arena.alloc(NodeKind::Newline);
        arena.push_child(comment, newline);
    }
    Ok(comment)
}
