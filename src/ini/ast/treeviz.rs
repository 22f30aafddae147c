//! Treeviz formatter for syntax tree nodes
//!
//! One line per node, structure encoded as indentation (2 spaces per level):
//!
//!   <indentation> <kind> <label> <span>
//!
//! Labels are the variant's semantic data (section/key names, values,
//! comment text), truncated so the tree stays scannable.

use super::node::{Arena, NodeId, NodeKind};

const MAX_LABEL_CHARS: usize = 30;

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let mut truncated = s.chars().take(max_chars).collect::<String>();
        truncated.push('…');
        truncated
    } else {
        s.to_string()
    }
}

fn label(kind: &NodeKind) -> String {
    let text = match kind {
        NodeKind::Root | NodeKind::Key | NodeKind::Newline => String::new(),
        NodeKind::Section { name } | NodeKind::SectionHeading { name } => name.clone(),
        NodeKind::KeyName { name } => name.clone(),
        NodeKind::KeyValue { value } => value.clone(),
        NodeKind::Comment { text } => text.clone(),
        NodeKind::Token { text } => format!("{:?}", text),
        NodeKind::ReplaceableToken { raw, text } => format!("{:?} => {:?}", raw, text),
    };
    truncate(&text, MAX_LABEL_CHARS)
}

fn render(arena: &Arena, id: NodeId, depth: usize, out: &mut String) {
    let node = arena.node(id);
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.kind.kind_name());
    let label = label(&node.kind);
    if !label.is_empty() {
        out.push(' ');
        out.push_str(&label);
    }
    out.push_str(&format!(" [{}]", node.span));
    out.push('\n');
    for child in &node.children {
        render(arena, *child, depth + 1, out);
    }
}

/// Render the tree rooted at `id` as indented text.
pub fn to_treeviz(arena: &Arena, id: NodeId) -> String {
    let mut out = String::new();
    render(arena, id, 0, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_one_line_per_node() {
        let mut arena = Arena::new();
        let root = arena.alloc(NodeKind::Root);
        let section = arena.alloc(NodeKind::Section {
            name: "server".to_string(),
        });
        arena.push_child(root, section);

        let viz = to_treeviz(&arena, root);
        let lines: Vec<&str> = viz.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Root"));
        assert!(lines[1].starts_with("  Section server"));
    }

    #[test]
    fn long_labels_are_truncated() {
        let mut arena = Arena::new();
        let value = arena.alloc(NodeKind::KeyValue {
            value: "v".repeat(80),
        });
        let viz = to_treeviz(&arena, value);
        assert!(viz.contains('…'));
    }
}
