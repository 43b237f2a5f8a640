//! Scenes

#[macro_use]
extern crate log;

mod emitter;
mod fog;
mod medium;
mod sensor;

// Re-export.
pub use emitter::*;
pub use fog::*;
pub use medium::*;
pub use sensor::*;
