//! Tokenization and line classification

pub mod lexer;
pub mod lines;
pub mod tokens;

pub use lexer::{tokenize_with_spans, SpannedToken};
pub use lines::{classify, group_lines, is_comment_marker, Line, LineKind};
pub use tokens::RawToken;
