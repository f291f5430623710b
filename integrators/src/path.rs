//! Fixed-depth path tracing.

use aurora_core::common::{max, Float, INFINITY, PDF_EPSILON, RAY_EPSILON};
use aurora_core::geometry::Ray;
use aurora_core::integrator::Integrator;
use aurora_core::rng::RNG;
use aurora_core::scene::Scene;
use aurora_core::spectrum::RGBSpectrum;

/// Unidirectional path tracer with a fixed maximum bounce count.
///
/// Lights are found only by hitting emissive surfaces or escaping to the
/// background, so convergence depends on the scene; it is the baseline the
/// other integrators refine.
pub struct PathIntegrator {
    /// Maximum number of bounces.
    max_depth: usize,
}

impl PathIntegrator {
    /// Creates a fixed-depth path tracer.
    ///
    /// * `max_depth` - Maximum number of bounces.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }
}

impl Integrator for PathIntegrator {
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
                    // Escaped rays pick up the environment at any depth.
                    l += beta * *background;
                    break;
                }
            };

            // A path that runs out of depth ends at the hit without picking
            // up that surface's emission.
            if bounces >= self.max_depth {
                break;
            }

            let wo = -ray.d;
            l += beta * si.material.emitted(&si, &wo);

            let bs = match si.material.sample(&si, &wo, rng.uniform_2d()) {
                Some(bs) => bs,
                None => break, // Pure emitters do not scatter.
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

            ray = Ray::new(si.p, bs.wi, ray.time);
            bounces += 1;
        }

        l
    }

    fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::*;
    use aurora_core::geometry::{Point3f, Vector3f};
    use float_cmp::approx_eq;

    fn down_ray() -> Ray {
        Ray::new(Point3f::new(0.0, 0.0, 3.0), Vector3f::new(0.0, 0.0, -1.0), 0.0)
    }

    #[test]
    fn miss_returns_background_even_at_depth_zero() {
        let scene = ListScene::empty();
        let integrator = PathIntegrator::new(0);
        let bg = RGBSpectrum::from_rgb(0.3, 0.6, 0.9);
        let mut rng = RNG::new(1);
        assert_eq!(integrator.li(&down_ray(), &scene, &bg, &mut rng), bg);
    }

    #[test]
    fn depth_zero_hit_returns_zero_radiance() {
        // With no bounces allowed, any hit ends the path with nothing
        // collected, even on an emissive surface.
        let bg = RGBSpectrum::ONE;
        let integrator = PathIntegrator::new(0);
        let mut rng = RNG::new(2);

        let diffuse = ListScene::single_sphere(lambertian(0.5));
        assert_eq!(
            integrator.li(&down_ray(), &diffuse, &bg, &mut rng),
            RGBSpectrum::ZERO
        );

        let glowing = ListScene::single_sphere(emitter(RGBSpectrum::from_rgb(2.0, 3.0, 4.0)));
        assert_eq!(
            integrator.li(&down_ray(), &glowing, &bg, &mut rng),
            RGBSpectrum::ZERO
        );
    }

    #[test]
    fn emission_is_collected_only_below_the_depth_cap() {
        // Depth 1 reaches the emitter's vertex with one bounce to spare, so
        // its radiance is picked up there.
        let radiance = RGBSpectrum::from_rgb(2.0, 3.0, 4.0);
        let glowing = ListScene::single_sphere(emitter(radiance));
        let integrator = PathIntegrator::new(1);
        let mut rng = RNG::new(2);
        assert_eq!(
            integrator.li(&down_ray(), &glowing, &RGBSpectrum::ZERO, &mut rng),
            radiance
        );
    }

    #[test]
    fn one_bounce_off_a_convex_diffuse_surface_is_exact() {
        // Cosine importance sampling cancels the BRDF and cosine terms, so
        // every path carries exactly albedo * background after one bounce.
        let albedo = 0.5;
        let scene = ListScene::single_sphere(lambertian(albedo));
        let integrator = PathIntegrator::new(1);
        let bg = RGBSpectrum::new(1.0);
        let mut rng = RNG::new(3);

        for _ in 0..64 {
            let l = integrator.li(&down_ray(), &scene, &bg, &mut rng);
            assert!(approx_eq!(f32, l[0], albedo, epsilon = 1e-5));
            assert!(approx_eq!(f32, l[1], albedo, epsilon = 1e-5));
            assert!(approx_eq!(f32, l[2], albedo, epsilon = 1e-5));
        }
    }

    #[test]
    fn deeper_paths_never_gain_energy() {
        let scene = ListScene::single_sphere(lambertian(0.8));
        let bg = RGBSpectrum::new(1.0);
        let mut rng = RNG::new(4);
        let integrator = PathIntegrator::new(16);

        for _ in 0..256 {
            let l = integrator.li(&down_ray(), &scene, &bg, &mut rng);
            for ch in 0..3 {
                assert!(l[ch].is_finite());
                assert!((0.0..=1.0).contains(&l[ch]));
            }
        }
    }

    #[test]
    fn mirror_relays_the_emitter() {
        // Camera ray reflects off the mirror sphere straight back up into an
        // emitter placed behind the camera path.
        let radiance = RGBSpectrum::from_rgb(5.0, 6.0, 7.0);
        let scene = ListScene::new(vec![
            Sphere::unit(mirror()),
            Sphere::new(Point3f::new(0.0, 0.0, 6.0), 1.0, emitter(radiance)),
        ]);
        let integrator = PathIntegrator::new(2);
        let mut rng = RNG::new(5);
        let l = integrator.li(&down_ray(), &scene, &RGBSpectrum::ZERO, &mut rng);
        assert_eq!(l, radiance);
    }
}
