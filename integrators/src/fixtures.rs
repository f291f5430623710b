//! Shared test scene: analytic spheres with a few canonical materials.

use aurora_core::common::{max, Float, INV_PI};
use aurora_core::geometry::{Point3f, Ray, Vector3f};
use aurora_core::light::{ArcLight, Light, LightSample};
use aurora_core::material::{ArcMaterial, BSDFSample, Material};
use aurora_core::sampling::{cosine_hemisphere_pdf, cosine_sample_hemisphere, Frame};
use aurora_core::scene::{Scene, SurfaceInteraction};
use aurora_core::spectrum::RGBSpectrum;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Ideal diffuse reflector sampled with the cosine-weighted hemisphere.
struct Lambertian {
    albedo: RGBSpectrum,
}

impl Material for Lambertian {
    fn sample(
        &self,
        si: &SurfaceInteraction,
        _wo: &Vector3f,
        u: (Float, Float),
    ) -> Option<BSDFSample> {
        let frame = Frame::from_normal(&si.n);
        let local = cosine_sample_hemisphere(u);
        Some(BSDFSample {
            wi: frame.to_world(&local),
            f: self.albedo * INV_PI,
            pdf: cosine_hemisphere_pdf(local.z),
            is_specular: false,
        })
    }

    fn eval(&self, si: &SurfaceInteraction, _wo: &Vector3f, wi: &Vector3f) -> RGBSpectrum {
        if si.n.dot(wi) > 0.0 {
            self.albedo * INV_PI
        } else {
            RGBSpectrum::ZERO
        }
    }

    fn pdf(&self, si: &SurfaceInteraction, _wo: &Vector3f, wi: &Vector3f) -> Float {
        cosine_hemisphere_pdf(max(0.0, si.n.dot(wi)))
    }
}

/// Pure emitter; does not scatter.
struct Emitter {
    radiance: RGBSpectrum,
}

impl Material for Emitter {
    fn emitted(&self, _si: &SurfaceInteraction, _wo: &Vector3f) -> RGBSpectrum {
        self.radiance
    }

    fn sample(
        &self,
        _si: &SurfaceInteraction,
        _wo: &Vector3f,
        _u: (Float, Float),
    ) -> Option<BSDFSample> {
        None
    }
}

/// Perfect mirror; a delta lobe with unit reflectance.
struct Mirror;

impl Material for Mirror {
    fn sample(
        &self,
        si: &SurfaceInteraction,
        wo: &Vector3f,
        _u: (Float, Float),
    ) -> Option<BSDFSample> {
        let wi = si.n * (2.0 * si.n.dot(wo)) - *wo;
        Some(BSDFSample {
            wi,
            f: RGBSpectrum::ONE,
            pdf: 1.0,
            is_specular: true,
        })
    }
}

pub fn lambertian(albedo: Float) -> ArcMaterial {
    Arc::new(Lambertian {
        albedo: RGBSpectrum::new(albedo),
    })
}

pub fn emitter(radiance: RGBSpectrum) -> ArcMaterial {
    Arc::new(Emitter { radiance })
}

pub fn mirror() -> ArcMaterial {
    Arc::new(Mirror)
}

/// Isotropic point source with inverse-square falloff.
pub struct PointLight {
    pub p: Point3f,
    pub intensity: RGBSpectrum,
}

impl Light for PointLight {
    fn sample_li(&self, p: &Point3f, _u: (Float, Float)) -> LightSample {
        let to_light = self.p - *p;
        let dist = to_light.length();
        LightSample {
            li: self.intensity / (dist * dist),
            wi: to_light / dist,
            pdf: 1.0,
            dist,
        }
    }
}

pub fn point_light(p: Point3f, intensity: RGBSpectrum) -> ArcLight {
    Arc::new(PointLight { p, intensity })
}

pub struct Sphere {
    pub center: Point3f,
    pub radius: Float,
    pub material: ArcMaterial,
}

impl Sphere {
    pub fn new(center: Point3f, radius: Float, material: ArcMaterial) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    /// Unit sphere at the origin.
    pub fn unit(material: ArcMaterial) -> Self {
        Self::new(Point3f::zero(), 1.0, material)
    }

    fn hit(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<SurfaceInteraction> {
        let oc = ray.o - self.center;
        let a = ray.d.length_squared();
        let half_b = oc.dot(&ray.d);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let mut t = (-half_b - sqrt_d) / a;
        if t < t_min || t > t_max {
            t = (-half_b + sqrt_d) / a;
            if t < t_min || t > t_max {
                return None;
            }
        }

        let p = ray.at(t);
        let outward = (p - self.center) / self.radius;
        let front_face = ray.d.dot(&outward) < 0.0;
        Some(SurfaceInteraction {
            p,
            n: if front_face { outward } else { -outward },
            t,
            front_face,
            material: Arc::clone(&self.material),
        })
    }
}

/// Linear-scan aggregate over spheres plus a light list.
pub struct ListScene {
    spheres: Vec<Sphere>,
    lights: Vec<ArcLight>,
}

impl ListScene {
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn new(spheres: Vec<Sphere>) -> Self {
        Self {
            spheres,
            lights: Vec::new(),
        }
    }

    pub fn with_lights(spheres: Vec<Sphere>, lights: Vec<ArcLight>) -> Self {
        Self { spheres, lights }
    }

    pub fn single_sphere(material: ArcMaterial) -> Self {
        Self::new(vec![Sphere::unit(material)])
    }
}

impl Scene for ListScene {
    fn hit(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<SurfaceInteraction> {
        let mut closest = t_max;
        let mut hit = None;
        for sphere in &self.spheres {
            if let Some(si) = sphere.hit(ray, t_min, closest) {
                closest = si.t;
                hit = Some(si);
            }
        }
        hit
    }

    fn lights(&self) -> &[ArcLight] {
        &self.lights
    }
}

/// Wraps a scene and counts intersection queries; used to compare how much
/// work different termination strategies perform.
pub struct CountingScene<S> {
    inner: S,
    hits: AtomicUsize,
}

impl<S: Scene> CountingScene<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hits: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

impl<S: Scene> Scene for CountingScene<S> {
    fn hit(&self, ray: &Ray, t_min: Float, t_max: Float) -> Option<SurfaceInteraction> {
        self.hits.fetch_add(1, Ordering::Relaxed);
        self.inner.hit(ray, t_min, t_max)
    }

    fn lights(&self) -> &[ArcLight] {
        self.inner.lights()
    }
}
