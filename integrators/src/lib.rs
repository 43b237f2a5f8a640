//! Integrators

#[macro_use]
extern crate log;

mod bdpt;
mod progress;

// Re-export.
pub use bdpt::*;
pub use progress::*;
