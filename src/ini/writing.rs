//! Serialization and I/O

pub mod io;
pub mod serializer;

pub use serializer::{layout, node_to_text};
