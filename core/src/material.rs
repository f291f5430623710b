//! Material interface.

use crate::common::Float;
use crate::geometry::Vector3f;
use crate::scene::SurfaceInteraction;
use crate::spectrum::RGBSpectrum;
use std::sync::Arc;

/// Atomic reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material + Send + Sync>;

/// Result of sampling a material's scattering distribution at a shading
/// point.
#[derive(Copy, Clone, Debug)]
pub struct BSDFSample {
    /// Sampled incident direction (world space, unit length).
    pub wi: Vector3f,

    /// Throughput factor. For delta lobes this is the full weight; for
    /// non-delta lobes the integrator applies `cos θ / pdf` on top.
    pub f: RGBSpectrum,

    /// Probability density of `wi` with respect to solid angle. Meaningless
    /// for delta lobes.
    pub pdf: Float,

    /// True when the sampled lobe is a delta (specular) distribution; the
    /// `cos θ / pdf` weighting must be skipped.
    pub is_specular: bool,
}

/// Material interface implemented by the scene layer.
pub trait Material {
    /// Returns the radiance emitted from the shading point towards `wo`.
    /// Non-emissive materials return black.
    ///
    /// * `si` - The surface interaction.
    /// * `wo` - Outgoing direction.
    fn emitted(&self, _si: &SurfaceInteraction, _wo: &Vector3f) -> RGBSpectrum {
        RGBSpectrum::ZERO
    }

    /// Samples an incident direction from the scattering distribution.
    /// Returns `None` when the material does not scatter (pure emitter).
    ///
    /// * `si` - The surface interaction.
    /// * `wo` - Outgoing direction.
    /// * `u`  - Uniform 2-D sample.
    fn sample(&self, si: &SurfaceInteraction, wo: &Vector3f, u: (Float, Float))
        -> Option<BSDFSample>;

    /// Evaluates the BSDF for a given pair of directions. Delta lobes
    /// evaluate to black; used by explicit light sampling.
    ///
    /// * `si` - The surface interaction.
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    fn eval(&self, _si: &SurfaceInteraction, _wo: &Vector3f, _wi: &Vector3f) -> RGBSpectrum {
        RGBSpectrum::ZERO
    }

    /// Returns the probability density of sampling `wi` via `sample()`, used
    /// for multiple importance weighting. Delta lobes return zero.
    ///
    /// * `si` - The surface interaction.
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    fn pdf(&self, _si: &SurfaceInteraction, _wo: &Vector3f, _wi: &Vector3f) -> Float {
        0.0
    }
}
