//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod camera;
pub mod common;
pub mod error;
pub mod film;
pub mod geometry;
pub mod integrator;
pub mod light;
pub mod material;
pub mod renderer;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod spectrum;
