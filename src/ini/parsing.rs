//! Parsing: raw text plus `Options` into a syntax tree

pub mod parser;
pub mod values;

pub use parser::parse;
pub use values::{Fragment, FragmentAccumulator};
