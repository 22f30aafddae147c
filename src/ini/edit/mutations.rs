//! Tree edit operations
//!
//! Every operation clones the tree, splices the edit in, re-runs layout,
//! and rebuilds the index, returning a new `Configuration`. Untouched
//! regions keep their verbatim leaves, so unedited formatting survives.
//! Policy checks mirror parsing: an edit that would produce content the
//! active rules disallow fails the same way the equivalent input would.

use serde::{Deserialize, Serialize};

use crate::ini::ast::{Arena, EditError, NodeId, NodeKind, ParseError};
use crate::ini::config::index;
use crate::ini::config::{Configuration, GLOBAL_SECTION};
use crate::ini::edit::synth;
use crate::ini::options::{DuplicateKeyRule, DuplicateSectionRule, Options};
use crate::ini::parsing::values::fragments_into;
use crate::ini::writing;

/// Placement of an inserted comment relative to its target node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentPosition {
    Before,
    After,
    SameLine,
}

/// Relayout and reindex an edited tree.
fn rebuild(
    options: &Options,
    mut arena: Arena,
    root: NodeId,
    section_hint: &str,
) -> Result<Configuration, EditError> {
    writing::layout(options, &mut arena, root);
    match index::build(options, &arena, root) {
        Ok(index) => Ok(Configuration { arena, root, index }),
        Err(err) => Err(policy_error(section_hint, err)),
    }
}

/// Translate an index-build policy violation into the edit vocabulary.
fn policy_error(section_hint: &str, err: ParseError) -> EditError {
    match err {
        ParseError::DisallowedDuplicateKey { key, .. } => EditError::DuplicateKey {
            section: section_hint.to_string(),
            key,
        },
        ParseError::DisallowedDuplicateSection { section, .. } => {
            EditError::DuplicateSection { section }
        }
        _ => EditError::DuplicateSection {
            section: section_hint.to_string(),
        },
    }
}

/// Key nodes inside `section_node` whose name is `key`, in document order.
/// This walks the tree rather than the index so superseded occurrences
/// (kept for round-trip) are found too.
pub(crate) fn tree_key_nodes(arena: &Arena, section_node: NodeId, key: &str) -> Vec<NodeId> {
    arena
        .node(section_node)
        .children
        .iter()
        .copied()
        .filter(|child| {
            matches!(arena.node(*child).kind, NodeKind::Key)
                && arena.key_name(*child).is_some_and(|name_id| {
                    matches!(&arena.node(name_id).kind, NodeKind::KeyName { name } if name == key)
                })
        })
        .collect()
}

/// The blank lines and comments directly above a line node, which belong to
/// it: the run of trivia siblings between the previous construct and the
/// node itself.
pub(crate) fn leading_trivia(arena: &Arena, line_node: NodeId) -> Vec<NodeId> {
    let Some(parent) = arena.node(line_node).parent else {
        return Vec::new();
    };
    let Some(idx) = arena.child_index(parent, line_node) else {
        return Vec::new();
    };
    let children = &arena.node(parent).children;
    let mut start = idx;
    while start > 0 {
        let prev = arena.node(children[start - 1]);
        let is_trivia =
            matches!(prev.kind, NodeKind::Comment { .. }) || prev.is_blank_line();
        if !is_trivia {
            break;
        }
        start -= 1;
    }
    children[start..idx].to_vec()
}

fn leaf_ends_with_newline(kind: &NodeKind) -> bool {
    match kind {
        NodeKind::Token { text } => text.ends_with('\n'),
        NodeKind::ReplaceableToken { raw, .. } => raw.ends_with('\n'),
        NodeKind::Newline => true,
        _ => false,
    }
}

fn last_leaf(arena: &Arena, id: NodeId) -> Option<NodeId> {
    let node = arena.node(id);
    if node.is_leaf() {
        return Some(id);
    }
    for child in node.children.iter().rev() {
        if let Some(leaf) = last_leaf(arena, *child) {
            return Some(leaf);
        }
    }
    None
}

/// Make sure the text rendered for `node` ends with a line break, so a line
/// inserted after it starts on its own line.
fn ensure_trailing_newline(arena: &mut Arena, node: NodeId) {
    let needs_newline = match last_leaf(arena, node) {
        Some(leaf) => !leaf_ends_with_newline(&arena.node(leaf).kind),
        None => false,
    };
    if needs_newline {
        let newline = arena.alloc(NodeKind::Newline);
        arena.push_child(node, newline);
    }
}

/// Insert a synthesized key line into a section, after the last key or
/// comment and before any trailing blank run.
fn insert_key_into_section(arena: &mut Arena, section: NodeId, line: NodeId) {
    let children = &arena.node(section).children;
    let pos = children
        .iter()
        .rposition(|child| {
            matches!(
                arena.node(*child).kind,
                NodeKind::Key | NodeKind::Comment { .. } | NodeKind::SectionHeading { .. }
            )
        })
        .map(|i| i + 1)
        .unwrap_or(children.len());
    if pos > 0 {
        let prev = arena.node(section).children[pos - 1];
        ensure_trailing_newline(arena, prev);
    }
    arena.insert_child(section, pos, line);
}

pub fn add(
    options: &Options,
    section: &str,
    key: &str,
    value: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    synth::validate_key_name(options, key)?;
    synth::validate_value(options, value)?;

    let mut arena = config.arena.clone();
    match config.index.section(section) {
        Some(entry) => {
            let existing = entry
                .key_map
                .get(key)
                .and_then(|e| e.values.last().map(|(_, node)| *node));
            match existing {
                Some(key_node) => match options.duplicate_key_rule() {
                    DuplicateKeyRule::DisallowDuplicateKeys => {
                        return Err(EditError::DuplicateKey {
                            section: section.to_string(),
                            key: key.to_string(),
                        });
                    }
                    DuplicateKeyRule::DuplicateKeyReplacesValue => {
                        replace_value(&mut arena, options, key_node, value)?;
                    }
                    DuplicateKeyRule::DuplicateKeyAddsValue => {
                        let line = synth::synth_key_line(&mut arena, options, key, value)?;
                        let parent = arena
                            .node(key_node)
                            .parent
                            .ok_or(EditError::NodeNotFound { id: key_node })?;
                        let idx = arena
                            .child_index(parent, key_node)
                            .ok_or(EditError::NodeNotFound { id: key_node })?;
                        ensure_trailing_newline(&mut arena, key_node);
                        arena.insert_child(parent, idx + 1, line);
                    }
                },
                None => {
                    let section_node = *entry
                        .nodes
                        .last()
                        .ok_or(EditError::SectionNotFound {
                            section: section.to_string(),
                        })?;
                    let line = synth::synth_key_line(&mut arena, options, key, value)?;
                    insert_key_into_section(&mut arena, section_node, line);
                }
            }
        }
        None => {
            let line = synth::synth_key_line(&mut arena, options, key, value)?;
            if section == GLOBAL_SECTION {
                // The global section has no heading and precedes everything
                let global = arena.alloc(NodeKind::Section {
                    name: GLOBAL_SECTION.to_string(),
                });
                arena.push_child(global, line);
                arena.insert_child(config.root, 0, global);
            } else {
                if let Some(last) = arena.node(config.root).children.last().copied() {
                    ensure_trailing_newline(&mut arena, last);
                }
                let new_section = synth::synth_section(&mut arena, options, section, line)?;
                arena.push_child(config.root, new_section);
            }
        }
    }
    rebuild(options, arena, config.root, section)
}

/// Replace the value of an existing key node in place, keeping the line's
/// formatting around it.
fn replace_value(
    arena: &mut Arena,
    options: &Options,
    key_node: NodeId,
    value: &str,
) -> Result<(), EditError> {
    let key_value = match arena.key_value(key_node) {
        Some(id) => id,
        None => {
            // A key line parsed with no value gets one before its line break
            let id = arena.alloc(NodeKind::KeyValue {
                value: String::new(),
            });
            let pos = arena
                .node(key_node)
                .children
                .iter()
                .position(|c| leaf_ends_with_newline(&arena.node(*c).kind))
                .unwrap_or(arena.node(key_node).children.len());
            arena.insert_child(key_node, pos, id);
            id
        }
    };
    let old_children = std::mem::take(&mut arena.node_mut(key_value).children);
    for child in old_children {
        arena.node_mut(child).parent = None;
    }
    arena.node_mut(key_value).kind = NodeKind::KeyValue {
        value: value.to_string(),
    };
    fragments_into(arena, key_value, synth::encode_value(options, value));
    Ok(())
}

pub fn remove_key(
    options: &Options,
    section: &str,
    key: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    let entry = config
        .index
        .section(section)
        .ok_or(EditError::SectionNotFound {
            section: section.to_string(),
        })?;
    if !entry.key_map.contains_key(key) {
        return Err(EditError::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        });
    }

    let mut arena = config.arena.clone();
    for section_node in &entry.nodes {
        for key_node in tree_key_nodes(&arena, *section_node, key) {
            for trivia in leading_trivia(&arena, key_node) {
                arena.detach(trivia);
            }
            arena.detach(key_node);
        }
    }
    rebuild(options, arena, config.root, section)
}

pub fn remove_section(
    options: &Options,
    section: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    let entry = config
        .index
        .section(section)
        .ok_or(EditError::SectionNotFound {
            section: section.to_string(),
        })?;

    let mut arena = config.arena.clone();
    for section_node in &entry.nodes {
        arena.detach(*section_node);
    }
    rebuild(options, arena, config.root, section)
}

pub fn rename_key(
    options: &Options,
    section: &str,
    key: &str,
    new_name: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    synth::validate_key_name(options, new_name)?;
    let entry = config
        .index
        .section(section)
        .ok_or(EditError::SectionNotFound {
            section: section.to_string(),
        })?;
    if !entry.key_map.contains_key(key) {
        return Err(EditError::KeyNotFound {
            section: section.to_string(),
            key: key.to_string(),
        });
    }
    if new_name != key
        && entry.key_map.contains_key(new_name)
        && options.duplicate_key_rule() == DuplicateKeyRule::DisallowDuplicateKeys
    {
        return Err(EditError::DuplicateKey {
            section: section.to_string(),
            key: new_name.to_string(),
        });
    }

    let mut arena = config.arena.clone();
    for section_node in &entry.nodes {
        for key_node in tree_key_nodes(&arena, *section_node, key) {
            if let Some(name_id) = arena.key_name(key_node) {
                let old_children = std::mem::take(&mut arena.node_mut(name_id).children);
                for child in old_children {
                    arena.node_mut(child).parent = None;
                }
                arena.node_mut(name_id).kind = NodeKind::KeyName {
                    name: new_name.to_string(),
                };
                fragments_into(&mut arena, name_id, synth::encode_key_name(options, new_name));
            }
        }
    }
    rebuild(options, arena, config.root, section)
}

pub fn rename_section(
    options: &Options,
    section: &str,
    new_name: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    if section == GLOBAL_SECTION {
        return Err(EditError::UnrepresentableName {
            name: section.to_string(),
        });
    }
    synth::validate_section_name(options, new_name)?;
    let entry = config
        .index
        .section(section)
        .ok_or(EditError::SectionNotFound {
            section: section.to_string(),
        })?;
    if new_name != section
        && config.index.section(new_name).is_some()
        && options.duplicate_section_rule() == DuplicateSectionRule::DisallowDuplicateSections
    {
        return Err(EditError::DuplicateSection {
            section: new_name.to_string(),
        });
    }

    let mut arena = config.arena.clone();
    for section_node in &entry.nodes {
        arena.node_mut(*section_node).kind = NodeKind::Section {
            name: new_name.to_string(),
        };
        if let Some(heading) = arena.section_heading(*section_node) {
            rename_heading(&mut arena, options, heading, new_name);
        }
    }
    rebuild(options, arena, config.root, new_name)
}

/// Swap the name run of a heading for the new name, leaving brackets and
/// surrounding whitespace untouched.
fn rename_heading(arena: &mut Arena, options: &Options, heading: NodeId, new_name: &str) {
    arena.node_mut(heading).kind = NodeKind::SectionHeading {
        name: new_name.to_string(),
    };

    let children = arena.node(heading).children.clone();
    let is_token = |id: NodeId, text: &str| {
        matches!(&arena.node(id).kind, NodeKind::Token { text: t } if t == text)
    };
    let Some(open) = children.iter().position(|c| is_token(*c, "[")) else {
        return;
    };
    let Some(close) = children.iter().rposition(|c| is_token(*c, "]")) else {
        return;
    };

    let mut start = open + 1;
    let mut end = close;
    let is_ws = |id: NodeId| {
        matches!(&arena.node(id).kind, NodeKind::Token { text }
            if !text.is_empty() && text.chars().all(|c| c == ' ' || c == '\t'))
    };
    if start < end && is_ws(children[start]) {
        start += 1;
    }
    if end > start && is_ws(children[end - 1]) {
        end -= 1;
    }

    for child in &children[start..end] {
        arena.detach(*child);
    }
    let fragments = synth::encode_section_name(options, new_name);
    let mut insert_at = start;
    for fragment in fragments {
        let leaf = match fragment {
            crate::ini::parsing::Fragment::Literal(text) => {
                arena.alloc(NodeKind::Token { text })
            }
            crate::ini::parsing::Fragment::Replace { raw, text } => {
                arena.alloc(NodeKind::ReplaceableToken { raw, text })
            }
        };
        arena.insert_child(heading, insert_at, leaf);
        insert_at += 1;
    }
}

pub fn remove_node(
    options: &Options,
    id: NodeId,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    if config.node(id).is_none() || id == config.root {
        return Err(EditError::NodeNotFound { id });
    }
    let mut arena = config.arena.clone();
    arena.detach(id);
    rebuild(options, arena, config.root, "")
}

pub fn add_comment(
    options: &Options,
    position: CommentPosition,
    id: NodeId,
    text: &str,
    config: &Configuration,
) -> Result<Configuration, EditError> {
    synth::validate_comment_text(text)?;
    if config.node(id).is_none() {
        return Err(EditError::NodeNotFound { id });
    }

    let mut arena = config.arena.clone();
    match position {
        CommentPosition::Before | CommentPosition::After => {
            // Climb to the nearest node that is a direct item of a section
            // or of the root, so the comment lands between lines
            let target = arena
                .ancestor_where(id, |node| {
                    node.parent.is_some_and(|parent| {
                        matches!(
                            arena.node(parent).kind,
                            NodeKind::Root | NodeKind::Section { .. }
                        )
                    })
                })
                .ok_or(EditError::UnsupportedCommentTarget { id })?;
            let parent = arena
                .node(target)
                .parent
                .ok_or(EditError::UnsupportedCommentTarget { id })?;
            let idx = arena
                .child_index(parent, target)
                .ok_or(EditError::NodeNotFound { id })?;
            let comment = synth::synth_comment(&mut arena, options, text, true)?;
            match position {
                CommentPosition::Before => arena.insert_child(parent, idx, comment),
                _ => {
                    ensure_trailing_newline(&mut arena, target);
                    arena.insert_child(parent, idx + 1, comment);
                }
            }
        }
        CommentPosition::SameLine => {
            let line = line_owner(&arena, id).ok_or(EditError::UnsupportedCommentTarget { id })?;
            let pos = arena
                .node(line)
                .children
                .iter()
                .rposition(|c| !leaf_ends_with_newline(&arena.node(*c).kind))
                .map(|i| i + 1)
                .unwrap_or(0);
            let ws = arena.alloc(NodeKind::Token {
                text: " ".to_string(),
            });
            let comment = synth::synth_comment(&mut arena, options, text, false)?;
            arena.insert_child(line, pos, ws);
            arena.insert_child(line, pos + 1, comment);
        }
    }
    rebuild(options, arena, config.root, "")
}

/// The node owning the line `id` sits on: a key or a section heading.
fn line_owner(arena: &Arena, id: NodeId) -> Option<NodeId> {
    if let NodeKind::Section { .. } = arena.node(id).kind {
        return arena.section_heading(id);
    }
    arena.ancestor_where(id, |node| {
        matches!(node.kind, NodeKind::Key | NodeKind::SectionHeading { .. })
    })
}
