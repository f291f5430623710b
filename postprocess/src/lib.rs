//! Postprocess

#[macro_use]
extern crate log;

mod filters;
mod pipeline;
mod simd;
mod tonemap;

pub use filters::*;
pub use pipeline::*;
pub use tonemap::*;
