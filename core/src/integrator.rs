//! Integrator interface.

use crate::geometry::Ray;
use crate::rng::RNG;
use crate::scene::Scene;
use crate::spectrum::RGBSpectrum;

/// Light-transport strategy: estimates the radiance arriving along a camera
/// ray. Implementations are stateless aside from their maximum bounce depth
/// and are evaluated concurrently from all render workers.
pub trait Integrator: Send + Sync {
    /// Returns the incident radiance at the origin of the given ray.
    ///
    /// * `ray`        - The ray.
    /// * `scene`      - The scene.
    /// * `background` - Environment radiance returned for rays that escape
    ///                  the scene.
    /// * `rng`        - Per-tile random number generator.
    fn li(&self, ray: &Ray, scene: &dyn Scene, background: &RGBSpectrum, rng: &mut RNG)
        -> RGBSpectrum;

    /// Reconfigures the maximum bounce depth. Only called between render
    /// runs, never while a render is in flight.
    ///
    /// * `depth` - Maximum number of bounces.
    fn set_max_depth(&mut self, depth: usize);
}
