//! Configuration value and derived index

pub mod configuration;
pub mod index;

pub use configuration::Configuration;
pub use index::{Index, KeyEntry, KeyMap, SectionEntry, GLOBAL_SECTION};
