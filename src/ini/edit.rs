//! Mutation engine: pure edits over a configuration

pub mod mutations;
pub mod synth;

pub use mutations::CommentPosition;
