//! Serialization back to text
//!
//! Serializing is a document-order leaf walk: verbatim leaves emit their
//! original slice, replaceable leaves emit their raw spelling, synthesized
//! newlines resolve against the newline rule at this point (not at parse
//! time). An unedited tree therefore reproduces its input byte for byte.
//!
//! The layout pass lives here too: it assigns every node the line/column
//! span the node occupies in the serialized text, which doubles as the
//! source span for parsed input since the two are identical.

use crate::ini::ast::{Arena, NodeId, NodeKind, Position, Span};
use crate::ini::options::Options;

fn leaf_text<'a>(options: &Options, kind: &'a NodeKind) -> &'a str {
    match kind {
        NodeKind::Token { text } => text,
        NodeKind::ReplaceableToken { raw, .. } => raw,
        NodeKind::Newline => options.newline_rule().as_str(),
        _ => "",
    }
}

/// Render the tree rooted at `id` to text.
pub fn node_to_text(options: &Options, arena: &Arena, id: NodeId) -> String {
    let mut out = String::new();
    arena.visit_leaves(id, &mut |node| {
        out.push_str(leaf_text(options, &node.kind));
    });
    out
}

/// Assign spans to every node reachable from `root`.
pub fn layout(options: &Options, arena: &mut Arena, root: NodeId) {
    layout_node(options, arena, root, Position::default());
}

fn layout_node(options: &Options, arena: &mut Arena, id: NodeId, at: Position) -> Position {
    let node = arena.node(id);
    if node.is_leaf() {
        let end = at.advanced(leaf_text(options, &node.kind));
        arena.node_mut(id).span = Span::new(at, end);
        return end;
    }
    let children = node.children.clone();
    let mut cursor = at;
    for child in children {
        cursor = layout_node(options, arena, child, cursor);
    }
    arena.node_mut(id).span = Span::new(at, cursor);
    cursor
}
