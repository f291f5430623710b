//! Camera interface.

use crate::common::Float;
use crate::geometry::Ray;

/// Camera interface implemented by the scene layer. Implementations must be
/// pure and re-entrant; the renderer calls them concurrently from all
/// workers.
pub trait Camera: Send + Sync {
    /// Generates a primary ray through a point on the image plane.
    ///
    /// * `u`       - Horizontal image-plane coordinate in `[0, 1)`.
    /// * `v`       - Vertical image-plane coordinate in `[0, 1)`, growing
    ///               upwards.
    /// * `lens_uv` - Uniform 2-D sample for the lens aperture (depth of
    ///               field).
    /// * `time_u`  - Uniform sample mapped to the shutter interval (motion
    ///               blur).
    fn generate_ray(&self, u: Float, v: Float, lens_uv: (Float, Float), time_u: Float) -> Ray;
}
