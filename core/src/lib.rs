//! Core

extern crate bitflags;
#[macro_use]
extern crate hexf;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

// Re-export.
pub mod base;
pub mod decomposition;
pub mod film;
pub mod filter;
pub mod geometry;
pub mod image_io;
pub mod memory;
pub mod paramset;
pub mod path;
pub mod rng;
pub mod sampler;
pub mod sampling;
pub mod scene;
pub mod spectrum;
pub mod stats;
