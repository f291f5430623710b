//! Light interface.

use crate::common::Float;
use crate::geometry::{Point3f, Vector3f};
use crate::spectrum::RGBSpectrum;
use std::sync::Arc;

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light + Send + Sync>;

/// Result of sampling a light source from a shading point. Produced
/// transiently per shading point; `dist` bounds the occlusion test.
#[derive(Copy, Clone, Debug)]
pub struct LightSample {
    /// Incident radiance arriving from the light.
    pub li: RGBSpectrum,

    /// Direction from the shading point towards the light (unit length).
    pub wi: Vector3f,

    /// Probability density of the sample with respect to solid angle. Delta
    /// lights report the discrete probability of their single direction.
    pub pdf: Float,

    /// Distance from the shading point to the sampled light position.
    pub dist: Float,
}

/// Light interface implemented by the scene layer.
pub trait Light {
    /// Samples the light from a shading point.
    ///
    /// * `p` - The shading point.
    /// * `u` - Uniform 2-D sample for area lights; ignored by delta lights.
    fn sample_li(&self, p: &Point3f, u: (Float, Float)) -> LightSample;

    /// Returns true for lights described by a delta distribution (point,
    /// directional). Delta lights cannot be hit by BSDF samples and take a
    /// multiple importance weight of one.
    fn is_delta(&self) -> bool {
        true
    }
}
