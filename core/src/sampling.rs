//! Sampling routines shared by the integrators and material models.

use crate::common::{max, Float, INV_PI, PI, TWO_PI};
use crate::geometry::Vector3f;

/// Maps a uniform 2-D sample to a point on the unit disk using Shirley's
/// concentric mapping, which preserves stratification better than the polar
/// mapping.
///
/// * `u` - Uniform sample in `[0, 1)^2`.
pub fn concentric_sample_disk(u: (Float, Float)) -> (Float, Float) {
    // Map to [-1, 1]^2 and handle degeneracy at the origin.
    let ox = 2.0 * u.0 - 1.0;
    let oy = 2.0 * u.1 - 1.0;
    if ox == 0.0 && oy == 0.0 {
        return (0.0, 0.0);
    }

    let (r, theta) = if ox.abs() > oy.abs() {
        (ox, (PI / 4.0) * (oy / ox))
    } else {
        (oy, (PI / 2.0) - (PI / 4.0) * (ox / oy))
    };
    (r * theta.cos(), r * theta.sin())
}

/// Maps a uniform 2-D sample to a cosine-weighted direction on the local
/// hemisphere around `+z`.
///
/// * `u` - Uniform sample in `[0, 1)^2`.
pub fn cosine_sample_hemisphere(u: (Float, Float)) -> Vector3f {
    let d = concentric_sample_disk(u);
    let z = max(0.0, 1.0 - d.0 * d.0 - d.1 * d.1).sqrt();
    Vector3f::new(d.0, d.1, z)
}

/// Returns the PDF for cosine-weighted sampling a direction from a hemisphere.
///
/// * `cos_theta` - Cosine term of incident radiance.
#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Maps a uniform 2-D sample to a direction on the unit sphere.
///
/// * `u` - Uniform sample in `[0, 1)^2`.
pub fn uniform_sample_sphere(u: (Float, Float)) -> Vector3f {
    let z = 1.0 - 2.0 * u.0;
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * u.1;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Returns the weight for the power heuristic (β = 2) used to combine two
/// sampling strategies in a multiple importance estimate.
///
/// * `nf`    - Number of samples taken with the first strategy.
/// * `f_pdf` - PDF of the first strategy.
/// * `ng`    - Number of samples taken with the second strategy.
/// * `g_pdf` - PDF of the second strategy.
#[inline]
pub fn power_heuristic(nf: usize, f_pdf: Float, ng: usize, g_pdf: Float) -> Float {
    let f = nf as Float * f_pdf;
    let g = ng as Float * g_pdf;
    (f * f) / (f * f + g * g)
}

/// An orthonormal basis around a surface normal; transforms directions
/// between local shading space (`+z` along the normal) and world space.
#[derive(Copy, Clone, Debug)]
pub struct Frame {
    /// Tangent.
    pub t: Vector3f,

    /// Bitangent.
    pub b: Vector3f,

    /// Normal.
    pub n: Vector3f,
}

impl Frame {
    /// Builds a frame around a unit normal.
    ///
    /// * `n` - The normal.
    pub fn from_normal(n: &Vector3f) -> Self {
        let up = if n.z.abs() < 0.999 {
            Vector3f::new(0.0, 0.0, 1.0)
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };
        let t = n.cross(&up).normalize();
        let b = n.cross(&t);
        Self { t, b, n: *n }
    }

    /// Transforms a local-space direction to world space.
    ///
    /// * `v` - Local direction.
    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        self.t * v.x + self.b * v.y + self.n * v.z
    }

    /// Transforms a world-space direction to local space.
    ///
    /// * `v` - World direction.
    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.t), v.dot(&self.b), v.dot(&self.n))
    }
}
