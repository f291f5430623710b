//! Scene interface.

use crate::common::Float;
use crate::geometry::{Point3f, Ray, Vector3f};
use crate::light::ArcLight;
use crate::material::ArcMaterial;

/// Shading record produced by a successful intersection query.
#[derive(Clone)]
pub struct SurfaceInteraction {
    /// Hit point.
    pub p: Point3f,

    /// Shading normal, oriented against the incident ray.
    pub n: Vector3f,

    /// Parametric distance along the ray.
    pub t: Float,

    /// True when the incident ray arrived from outside the surface.
    pub front_face: bool,

    /// Material attached to the surface.
    pub material: ArcMaterial,
}

/// Surface-intersection provider. Implementations are read-only for the
/// duration of a render and must be safe to query concurrently from all
/// render workers.
pub trait Scene: Send + Sync {
    /// Intersects a ray with the scene and returns the closest hit within
    /// `[t_min, t_max]`, or `None` on a miss.
    ///
    /// * `ray`   - The ray.
    /// * `t_min` - Minimum parametric distance.
    /// * `t_max` - Maximum parametric distance.
    fn hit(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<SurfaceInteraction>;

    /// All explicitly sampleable light sources in the scene. Used by the
    /// physically-based integrator; the default is an empty list.
    fn lights(&self) -> &[ArcLight] {
        &[]
    }
}
