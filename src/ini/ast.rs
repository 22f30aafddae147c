//! Syntax tree: nodes, spans, and errors

pub mod error;
pub mod node;
pub mod span;
pub mod treeviz;

pub use error::{EditError, LoadError, ParseError, ValueError};
pub use node::{Arena, Node, NodeId, NodeKind};
pub use span::{Position, SourceLocation, Span};
