//! # initext
//!
//! A format-preserving parser and editor for INI-style configuration
//! files. Text is parsed into a concrete syntax tree that keeps every
//! character of input, so serializing an unedited configuration
//! reproduces the original byte for byte; edits touch only the nodes they
//! concern and leave surrounding formatting alone.
//!
//! The dialect (comment markers, delimiters, quoting, escaping,
//! duplicate-key and duplicate-section policies) is configured through
//! [`Options`]; see [`ini::options`] for the individual rules.

pub mod ini;

pub use ini::ast::{
    EditError, LoadError, Node, NodeId, ParseError, Position, Span, ValueError,
};
pub use ini::config::{Configuration, Index, KeyMap, GLOBAL_SECTION};
pub use ini::edit::CommentPosition;
pub use ini::options::Options;
