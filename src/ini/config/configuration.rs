//! The configuration value
//!
//! A `Configuration` pairs the syntax tree with the derived section index.
//! It is logically immutable: queries borrow, and every mutation returns a
//! new value, leaving the original untouched. Snapshots can therefore be
//! shared freely across readers.

use std::io::{Read, Write};
use std::path::Path;

use crate::ini::ast::{Arena, EditError, LoadError, Node, NodeId, NodeKind, ParseError, ValueError};
use crate::ini::config::index::{self, Index, KeyMap};
use crate::ini::edit::mutations::{self, CommentPosition};
use crate::ini::options::Options;
use crate::ini::parsing;
use crate::ini::writing::{self, io};

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub(crate) arena: Arena,
    pub(crate) root: NodeId,
    pub(crate) index: Index,
}

impl Configuration {
    /// A configuration with no content.
    pub fn empty() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(NodeKind::Root);
        Configuration {
            arena,
            root,
            index: Index::default(),
        }
    }

    /// Parse a configuration from text.
    pub fn from_text(options: &Options, text: &str) -> Result<Self, ParseError> {
        let (mut arena, root) = parsing::parse(options, text)?;
        writing::layout(options, &mut arena, root);
        let index = index::build(options, &arena, root)?;
        Ok(Configuration { arena, root, index })
    }

    /// Build a configuration from `(section, key, value)` triples by
    /// folding `add` over an empty configuration.
    pub fn of_list<S>(
        options: &Options,
        values: impl IntoIterator<Item = (S, S, S)>,
    ) -> Result<Self, EditError>
    where
        S: AsRef<str>,
    {
        let mut config = Configuration::empty();
        for (section, key, value) in values {
            config = config.add(options, section.as_ref(), key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Read and parse a configuration file.
    pub fn from_file(options: &Options, path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let text = io::read_file(path)?;
        Ok(Configuration::from_text(options, &text)?)
    }

    /// Read and parse a configuration from a reader.
    pub fn from_reader(options: &Options, reader: &mut impl Read) -> Result<Self, LoadError> {
        let text = io::read_to_string(reader)?;
        Ok(Configuration::from_text(options, &text)?)
    }

    // --- output ---

    /// Render the configuration back to text.
    pub fn to_text(&self, options: &Options) -> String {
        writing::node_to_text(options, &self.arena, self.root)
    }

    /// Write the configuration to a file as UTF-8.
    pub fn write_to_file(
        &self,
        options: &Options,
        path: impl AsRef<Path>,
    ) -> std::io::Result<()> {
        io::write_file(path, &self.to_text(options))
    }

    /// Write the configuration to a writer as UTF-8.
    pub fn write_to_writer(
        &self,
        options: &Options,
        writer: &mut impl Write,
    ) -> std::io::Result<()> {
        io::write_to(writer, &self.to_text(options))
    }

    /// Render a single node back to text.
    pub fn node_to_text(&self, options: &Options, id: NodeId) -> Option<String> {
        self.node(id)
            .map(|_| writing::node_to_text(options, &self.arena, id))
    }

    /// Render the syntax tree as indented text, one line per node.
    pub fn to_treeviz(&self) -> String {
        crate::ini::ast::treeviz::to_treeviz(&self.arena, self.root)
    }

    // --- queries ---

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node by id. Returns `None` for ids invalidated by a
    /// removal.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        if self.arena.is_reachable(self.root, id) {
            Some(self.arena.node(id))
        } else {
            None
        }
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Section names in order of first appearance.
    pub fn sections(&self) -> Vec<&str> {
        self.index.section_names().collect()
    }

    /// Key names of a section, in insertion order.
    pub fn keys(&self, section: &str) -> Option<Vec<&str>> {
        self.index
            .section(section)
            .map(|entry| entry.key_map.keys().collect())
    }

    pub fn contains_section(&self, section: &str) -> bool {
        self.index.section(section).is_some()
    }

    pub fn contains_key(&self, section: &str, key: &str) -> bool {
        self.index
            .section(section)
            .is_some_and(|entry| entry.key_map.contains_key(key))
    }

    /// The last recorded value of a key.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.index
            .section(section)
            .and_then(|entry| entry.key_map.last_value(key))
    }

    /// The first recorded value of a key.
    pub fn get_first(&self, section: &str, key: &str) -> Option<&str> {
        self.index
            .section(section)
            .and_then(|entry| entry.key_map.first_value(key))
    }

    /// All recorded values of a key, in insertion order.
    pub fn get_multi_values(&self, section: &str, key: &str) -> Option<Vec<&str>> {
        self.index
            .section(section)
            .and_then(|entry| entry.key_map.get(key))
            .map(|entry| entry.values.iter().map(|(value, _)| value.as_str()).collect())
    }

    /// `get_multi_values` under its try-pattern name.
    pub fn try_get_values(&self, section: &str, key: &str) -> Option<Vec<&str>> {
        self.get_multi_values(section, key)
    }

    /// The last recorded value, parsed as an integer.
    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, ValueError> {
        match self.get(section, key) {
            None => Err(ValueError::NotFound {
                section: section.to_string(),
                key: key.to_string(),
            }),
            Some(text) => parse_int(section, key, text),
        }
    }

    /// The first recorded value, parsed as an integer.
    pub fn get_first_int(&self, section: &str, key: &str) -> Result<i64, ValueError> {
        match self.get_first(section, key) {
            None => Err(ValueError::NotFound {
                section: section.to_string(),
                key: key.to_string(),
            }),
            Some(text) => parse_int(section, key, text),
        }
    }

    /// The key map of a section together with the tree nodes backing it
    /// (several under `AllowDuplicateSections`).
    pub fn try_get_section(&self, section: &str) -> Option<(&KeyMap, &[NodeId])> {
        self.index
            .section(section)
            .map(|entry| (&entry.key_map, entry.nodes.as_slice()))
    }

    /// All key nodes recorded for a key name, in insertion order.
    pub fn key_nodes(&self, section: &str, key: &str) -> Option<Vec<NodeId>> {
        self.index
            .section(section)
            .and_then(|entry| entry.key_map.get(key))
            .map(|entry| entry.values.iter().map(|(_, node)| *node).collect())
    }

    /// The node of the last recorded key with this name.
    pub fn key_node(&self, section: &str, key: &str) -> Option<NodeId> {
        self.key_nodes(section, key).and_then(|nodes| nodes.last().copied())
    }

    /// Comments attached to a key: the comment lines directly above it and
    /// the trailing comment on its own line, for every occurrence.
    pub fn key_comments(&self, section: &str, key: &str) -> Option<Vec<NodeId>> {
        let entry = self.index.section(section)?;
        entry.key_map.get(key)?;
        let mut comments = Vec::new();
        for section_node in &entry.nodes {
            for key_node in mutations::tree_key_nodes(&self.arena, *section_node, key) {
                for id in mutations::leading_trivia(&self.arena, key_node) {
                    if matches!(self.arena.node(id).kind, NodeKind::Comment { .. }) {
                        comments.push(id);
                    }
                }
                if let Some(comment) = self.arena.line_comment(key_node) {
                    comments.push(comment);
                }
            }
        }
        Some(comments)
    }

    // --- mutations, each returning a new configuration ---

    /// Add a key, synthesizing the section when absent. An existing key is
    /// treated per the duplicate key rule, exactly as during parsing.
    pub fn add(
        &self,
        options: &Options,
        section: &str,
        key: &str,
        value: &str,
    ) -> Result<Self, EditError> {
        mutations::add(options, section, key, value, self)
    }

    /// Remove every occurrence of a key, along with the blank lines and
    /// comments that belonged only to it.
    pub fn remove_key(
        &self,
        options: &Options,
        section: &str,
        key: &str,
    ) -> Result<Self, EditError> {
        mutations::remove_key(options, section, key, self)
    }

    /// Remove a section with its heading and content.
    pub fn remove_section(&self, options: &Options, section: &str) -> Result<Self, EditError> {
        mutations::remove_section(options, section, self)
    }

    /// Rename a section, touching only its name token.
    pub fn rename_section(
        &self,
        options: &Options,
        section: &str,
        new_name: &str,
    ) -> Result<Self, EditError> {
        mutations::rename_section(options, section, new_name, self)
    }

    /// Rename a key, touching only its name token.
    pub fn rename_key(
        &self,
        options: &Options,
        section: &str,
        key: &str,
        new_name: &str,
    ) -> Result<Self, EditError> {
        mutations::rename_key(options, section, key, new_name, self)
    }

    /// Detach a single node (typically a comment).
    pub fn remove_node(&self, options: &Options, id: NodeId) -> Result<Self, EditError> {
        mutations::remove_node(options, id, self)
    }

    /// Insert a comment adjacent to a node.
    pub fn add_comment(
        &self,
        options: &Options,
        position: CommentPosition,
        id: NodeId,
        text: &str,
    ) -> Result<Self, EditError> {
        mutations::add_comment(options, position, id, text, self)
    }
}

fn parse_int(section: &str, key: &str, text: &str) -> Result<i64, ValueError> {
    text.trim().parse::<i64>().map_err(|_| ValueError::InvalidInteger {
        section: section.to_string(),
        key: key.to_string(),
        text: text.to_string(),
    })
}
