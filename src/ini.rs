//! Core of the INI parser/editor
//!
//! The pipeline runs text through the parser into a `(tree, index)` pair,
//! applies zero or more mutations (each yielding a new pair), and
//! serializes the tree back to text. The tree keeps every input character,
//! so text that parses and is not edited serializes back byte-identical.
//!
//! A dialect is described by `options::Options`; see `ast` for the node
//! model and `config::Configuration` for the public operation surface.

pub mod ast;
pub mod config;
pub mod edit;
pub mod lexing;
pub mod options;
pub mod parsing;
pub mod writing;
