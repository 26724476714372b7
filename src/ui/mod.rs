//! Serde mirror of the editor's project files.

pub mod types;

pub use types::*;
