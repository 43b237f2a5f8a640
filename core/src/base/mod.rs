//! Numeric definitions shared by all crates

mod common;

// Re-export.
pub use common::*;
