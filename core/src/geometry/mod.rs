//! Geometry

mod ray;
mod vector3;

// Re-export.
pub use ray::*;
pub use vector3::*;
