//! The concrete syntax tree
//!
//! Every character of the parsed document lives in some leaf of this tree,
//! so serializing is a leaf concatenation and an unedited tree reproduces
//! its input byte for byte. Nodes live in an arena and are addressed by
//! stable `NodeId`s; holding an id is valid until an explicit removal
//! detaches the node, after which the id no longer resolves to reachable
//! content.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::span::{Position, Span};

/// Stable identifier of a node in its `Arena`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The tagged variants of the syntax tree.
///
/// `Token` leaves hold verbatim source text. `ReplaceableToken` leaves hold
/// a raw spelling that differs from the semantic text under escape or quote
/// processing (the raw form is what serialization emits). `Newline` leaves
/// are synthesized line breaks whose spelling resolves from the newline
/// rule at serialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Section { name: String },
    SectionHeading { name: String },
    Key,
    KeyName { name: String },
    KeyValue { value: String },
    Comment { text: String },
    Token { text: String },
    ReplaceableToken { raw: String, text: String },
    Newline,
}

impl NodeKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::Root => "Root",
            NodeKind::Section { .. } => "Section",
            NodeKind::SectionHeading { .. } => "SectionHeading",
            NodeKind::Key => "Key",
            NodeKind::KeyName { .. } => "KeyName",
            NodeKind::KeyValue { .. } => "KeyValue",
            NodeKind::Comment { .. } => "Comment",
            NodeKind::Token { .. } => "Token",
            NodeKind::ReplaceableToken { .. } => "ReplaceableToken",
            NodeKind::Newline => "Newline",
        }
    }
}

/// A node in the tree: variant data, child list, and source span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
    pub children: Vec<NodeId>,
    pub span: Span,
}

impl Node {
    /// Start of the text range this node occupies.
    pub fn position(&self) -> Position {
        self.span.start
    }

    /// End of the text range this node occupies.
    pub fn end_position(&self) -> Position {
        self.span.end
    }

    pub fn is_leaf(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Token { .. } | NodeKind::ReplaceableToken { .. } | NodeKind::Newline
        )
    }

    /// A whitespace-only leaf carrying a line break: a blank line.
    pub fn is_blank_line(&self) -> bool {
        match &self.kind {
            NodeKind::Token { text } => {
                text.contains('\n') && text.trim().is_empty()
            }
            _ => false,
        }
    }
}

/// Node storage. Detached nodes stay in the backing vector but are no
/// longer reachable from the root; their ids are considered invalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Arena { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            parent: None,
            kind,
            children: Vec::new(),
            span: Span::default(),
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    /// Append `child` to `parent`'s child list.
    pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `child` into `parent`'s child list at `index`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
    }

    /// Detach `child` from its parent. Returns false when the node had no
    /// parent (the root, or an already-detached node).
    pub fn detach(&mut self, child: NodeId) -> bool {
        let Some(parent) = self.node(child).parent else {
            return false;
        };
        let children = &mut self.node_mut(parent).children;
        if let Some(index) = children.iter().position(|c| *c == child) {
            children.remove(index);
        }
        self.node_mut(child).parent = None;
        true
    }

    /// Position of `child` within `parent`'s child list.
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent).children.iter().position(|c| *c == child)
    }

    /// Whether `id` is reachable by walking parents up to `root`.
    pub fn is_reachable(&self, root: NodeId, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let mut cursor = id;
        loop {
            if cursor == root {
                return true;
            }
            match self.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => return false,
            }
        }
    }

    /// The nearest ancestor (including `id` itself) matching `pred`.
    pub fn ancestor_where(
        &self,
        id: NodeId,
        pred: impl Fn(&Node) -> bool,
    ) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if pred(self.node(current)) {
                return Some(current);
            }
            cursor = self.node(current).parent;
        }
        None
    }

    /// Depth-first leaf visit in document order.
    pub fn visit_leaves(&self, id: NodeId, visit: &mut impl FnMut(&Node)) {
        let node = self.node(id);
        if node.is_leaf() {
            visit(node);
            return;
        }
        for child in &node.children {
            self.visit_leaves(*child, visit);
        }
    }

    /// The `KeyName` child of a key node.
    pub fn key_name(&self, key: NodeId) -> Option<NodeId> {
        self.node(key)
            .children
            .iter()
            .copied()
            .find(|c| matches!(self.node(*c).kind, NodeKind::KeyName { .. }))
    }

    /// The `KeyValue` child of a key node.
    pub fn key_value(&self, key: NodeId) -> Option<NodeId> {
        self.node(key)
            .children
            .iter()
            .copied()
            .find(|c| matches!(self.node(*c).kind, NodeKind::KeyValue { .. }))
    }

    /// The `SectionHeading` child of a section node. The synthetic global
    /// section has none.
    pub fn section_heading(&self, section: NodeId) -> Option<NodeId> {
        self.node(section)
            .children
            .iter()
            .copied()
            .find(|c| matches!(self.node(*c).kind, NodeKind::SectionHeading { .. }))
    }

    /// The trailing comment inside a line-owning node, if any.
    pub fn line_comment(&self, line: NodeId) -> Option<NodeId> {
        self.node(line)
            .children
            .iter()
            .copied()
            .find(|c| matches!(self.node(*c).kind, NodeKind::Comment { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_invalidates_reachability() {
        let mut arena = Arena::new();
        let root = arena.alloc(NodeKind::Root);
        let section = arena.alloc(NodeKind::Section {
            name: "a".to_string(),
        });
        arena.push_child(root, section);
        assert!(arena.is_reachable(root, section));

        assert!(arena.detach(section));
        assert!(!arena.is_reachable(root, section));
        assert!(!arena.detach(section));
    }

    #[test]
    fn blank_line_detection() {
        let mut arena = Arena::new();
        let blank = arena.alloc(NodeKind::Token {
            text: "  \n".to_string(),
        });
        let text = arena.alloc(NodeKind::Token {
            text: "x".to_string(),
        });
        assert!(arena.node(blank).is_blank_line());
        assert!(!arena.node(text).is_blank_line());
    }

    #[test]
    fn ancestor_lookup_walks_parents() {
        let mut arena = Arena::new();
        let root = arena.alloc(NodeKind::Root);
        let key = arena.alloc(NodeKind::Key);
        let name = arena.alloc(NodeKind::KeyName {
            name: "x".to_string(),
        });
        arena.push_child(root, key);
        arena.push_child(key, name);

        let owner = arena.ancestor_where(name, |n| matches!(n.kind, NodeKind::Key));
        assert_eq!(owner, Some(key));
    }
}
