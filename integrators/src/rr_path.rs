//! Path tracing with Russian roulette termination.

use aurora_core::common::{clamp, max, Float, INFINITY, PDF_EPSILON, RAY_EPSILON};
use aurora_core::geometry::Ray;
use aurora_core::integrator::Integrator;
use aurora_core::rng::RNG;
use aurora_core::scene::Scene;
use aurora_core::spectrum::RGBSpectrum;

/// Bounces rendered in full before roulette may terminate a path.
const RR_WARMUP: usize = 3;

/// Survival probability bounds. The floor keeps dark paths from surviving
/// with unbounded `1 / q` weights; the ceiling guarantees termination even
/// for unit-throughput paths.
const RR_MIN_SURVIVAL: Float = 0.05;
const RR_MAX_SURVIVAL: Float = 0.95;

/// Path tracer that terminates probabilistically once a path's throughput
/// drops, surviving paths being reweighted by the inverse survival
/// probability so the estimate stays unbiased. `max_depth` remains a hard
/// cap on top of the roulette.
pub struct RRPathIntegrator {
    max_depth: usize,
}

impl RRPathIntegrator {
    /// Creates a Russian roulette path tracer.
    ///
    /// * `max_depth` - Hard cap on the number of bounces.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Integrator for RRPathIntegrator {
    fn li(
        &self,
        ray: &Ray,
        scene: &dyn Scene,
        background: &RGBSpectrum,
        rng: &mut RNG,
    ) -> RGBSpectrum {
        let mut l = RGBSpectrum::ZERO;
        let mut beta = RGBSpectrum::ONE;
        let mut ray = *ray;
        let mut bounces = 0;

        loop {
            let si = match scene.hit(&ray, RAY_EPSILON, INFINITY) {
                Some(si) => si,
                None => {
                    l += beta * *background;
                    break;
                }
            };

            if bounces >= self.max_depth {
                break;
            }

            let wo = -ray.d;
            l += beta * si.material.emitted(&si, &wo);

            let bs = match si.material.sample(&si, &wo, rng.uniform_2d()) {
                Some(bs) => bs,
                None => break,
            };

            if bs.is_specular {
                beta *= bs.f;
            } else {
                if bs.pdf <= PDF_EPSILON {
                    break;
                }
                let cos_theta = max(0.0, si.n.dot(&bs.wi));
                beta *= bs.f * (cos_theta / bs.pdf);
            }
            if beta.is_black() {
                break;
            }

            bounces += 1;
            if bounces > RR_WARMUP {
                let q = clamp(beta.max_component_value(), RR_MIN_SURVIVAL, RR_MAX_SURVIVAL);
                if rng.uniform_float() >= q {
                    break;
                }
                beta /= q;
            }

            ray = Ray::new(si.p, bs.wi, ray.time);
        }

        l
    }

    fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }
}
