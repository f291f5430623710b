//! Rays

use super::{Point3f, Vector3f};
use crate::common::Float;

/// A ray with an origin, a unit direction and the shutter time it samples.
/// Immutable once constructed.
#[derive(Copy, Clone, Debug, Default)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,

    /// Time sample in `[0, 1)` used for motion blur.
    pub time: Float,
}

impl Ray {
    /// Creates a new `Ray`.
    ///
    /// * `o`    - Origin.
    /// * `d`    - Direction (expected to be normalized by the caller).
    /// * `time` - Time sample.
    pub fn new(o: Point3f, d: Vector3f, time: Float) -> Self {
        Self { o, d, time }
    }

    /// Returns the point at parametric distance `t` along the ray.
    ///
    /// * `t` - Parametric distance.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}
