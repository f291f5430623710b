//! Path tracing with explicit light sampling.

use aurora_core::common::{clamp, max, Float, INFINITY, PDF_EPSILON, RAY_EPSILON};
use aurora_core::geometry::{Ray, Vector3f};
use aurora_core::integrator::Integrator;
use aurora_core::light::Light;
use aurora_core::rng::RNG;
use aurora_core::sampling::power_heuristic;
use aurora_core::scene::{Scene, SurfaceInteraction};
use aurora_core::spectrum::RGBSpectrum;

const RR_WARMUP: usize = 3;
const RR_MIN_SURVIVAL: Float = 0.05;
const RR_MAX_SURVIVAL: Float = 0.95;

/// Path tracer with next-event estimation: at every non-specular vertex one
/// light is sampled explicitly and its contribution weighted with the power
/// heuristic. Surface emission is added only for camera rays and rays leaving
/// a specular bounce, so light found by the explicit strategy is never
/// counted twice. Termination combines Russian roulette with the depth cap.
pub struct PbrPathIntegrator {
    max_depth: usize,
}

impl PbrPathIntegrator {
    /// Creates a path tracer with explicit light sampling.
    ///
    /// * `max_depth` - Hard cap on the number of bounces.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Integrator for PbrPathIntegrator {
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
        let mut specular_bounce = true; // Camera rays count emission.

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
            if specular_bounce {
                l += beta * si.material.emitted(&si, &wo);
            }

            // Next-event estimation: sample one light uniformly and scale by
            // the light count to keep the single-light estimate unbiased.
            let lights = scene.lights();
            if !lights.is_empty() {
                let idx = rng.bounded_uniform_u32(lights.len() as u32) as usize;
                let ld = estimate_direct(&si, &wo, lights[idx].as_ref(), scene, ray.time, rng);
                l += beta * ld * lights.len() as Float;
            }

            let bs = match si.material.sample(&si, &wo, rng.uniform_2d()) {
                Some(bs) => bs,
                None => break,
            };
            specular_bounce = bs.is_specular;

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

/// Estimates the direct contribution of one light at a shading point.
///
/// The shadow ray runs from just off the surface to just short of the light
/// so neither endpoint self-intersects. Delta lights take a multiple
/// importance weight of one; area lights are weighted against the BSDF pdf
/// with the power heuristic.
fn estimate_direct(
    si: &SurfaceInteraction,
    wo: &Vector3f,
    light: &dyn Light,
    scene: &dyn Scene,
    time: Float,
    rng: &mut RNG,
) -> RGBSpectrum {
    let ls = light.sample_li(&si.p, rng.uniform_2d());
    if ls.pdf <= PDF_EPSILON || ls.li.is_black() {
        return RGBSpectrum::ZERO;
    }

    let cos_theta = max(0.0, si.n.dot(&ls.wi));
    let f = si.material.eval(si, wo, &ls.wi) * cos_theta;
    if f.is_black() {
        return RGBSpectrum::ZERO;
    }

    let shadow = Ray::new(si.p, ls.wi, time);
    if scene.hit(&shadow, RAY_EPSILON, ls.dist - RAY_EPSILON).is_some() {
        return RGBSpectrum::ZERO;
    }

    let weight = if light.is_delta() {
        1.0
    } else {
        power_heuristic(1, ls.pdf, 1, si.material.pdf(si, wo, &ls.wi))
    };
    f * ls.li * (weight / ls.pdf)
}
