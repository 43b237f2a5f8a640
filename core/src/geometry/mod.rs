//! Geometry

mod bounds2;
mod ellipsoid;
mod frame;
mod point2;
mod vector3;

// Re-export.
pub use bounds2::*;
pub use ellipsoid::*;
pub use frame::*;
pub use point2::*;
pub use vector3::*;
