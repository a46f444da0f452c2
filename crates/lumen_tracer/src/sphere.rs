//! Sphere primitives: static and linearly moving.

use crate::{
    hittable::{HitRecord, Hittable},
    sampling::random_to_sphere,
    Material, UniformRng,
};
use lumen_core::{Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Onb, Ray, Vec3};
use std::f32::consts::PI;

/// Get the UV coordinates for a point on the unit sphere.
fn sphere_uv(p: Vec3) -> (f32, f32) {
    // phi: angle around Y from -X, theta: latitude
    let phi = p.z.atan2(p.x);
    let theta = p.y.clamp(-1.0, 1.0).asin();
    let u = 1.0 - (phi + PI) / (2.0 * PI);
    let v = (theta + PI / 2.0) / PI;
    (u, v)
}

/// Nearest root of the ray/sphere quadratic strictly inside `ray_t`.
fn hit_sphere(center: Vec3, radius: f32, ray: &Ray, ray_t: Interval) -> Option<f32> {
    let oc = ray.origin() - center;
    let a = ray.direction().length_squared();
    let b = oc.dot(ray.direction());
    let c = oc.length_squared() - radius * radius;

    let discriminant = b * b - a * c;
    if discriminant <= 0.0 {
        return None;
    }

    let sqrtd = discriminant.sqrt();
    [(-b - sqrtd) / a, (-b + sqrtd) / a]
        .into_iter()
        .find(|&root| ray_t.surrounds(root))
}

fn fill_record<'a>(
    rec: &mut HitRecord<'a>,
    ray: &Ray,
    t: f32,
    center: Vec3,
    radius: f32,
    material: &'a Material,
) {
    rec.t = t;
    rec.p = ray.at(t);
    rec.normal = (rec.p - center) / radius;
    (rec.u, rec.v) = sphere_uv(rec.normal);
    rec.material = Some(material);
}

/// A sphere primitive.
#[derive(Debug)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Material,
}

impl Sphere {
    pub const TYPE_TAG: i32 = 1;

    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        Self {
            center,
            radius,
            material,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let center = Vec3::decode(stream)?;
        let radius = f32::decode(stream)?;
        let material = Material::create(stream)?;
        Ok(Self::new(center, radius, material))
    }
}

impl Hittable for Sphere {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn UniformRng,
    ) -> bool {
        match hit_sphere(self.center, self.radius, ray, ray_t) {
            Some(t) => {
                fill_record(rec, ray, t, self.center, self.radius, &self.material);
                true
            }
            None => false,
        }
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        let rvec = Vec3::splat(self.radius.abs());
        Some(Aabb::new(self.center - rvec, self.center + rvec))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, _rng: &mut dyn UniformRng) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        if hit_sphere(self.center, self.radius, &ray, Interval::FORWARD).is_none() {
            return 0.0;
        }
        let dist_squared = (self.center - origin).length_squared();
        let cos_theta_max = (1.0 - self.radius * self.radius / dist_squared).max(0.0).sqrt();
        let solid_angle = 2.0 * PI * (1.0 - cos_theta_max);
        1.0 / solid_angle
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        let direction = self.center - origin;
        let uvw = Onb::build_from_w(direction);
        uvw.local(random_to_sphere(self.radius, direction.length_squared(), rng))
    }
}

impl Persist for Sphere {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.center.encode(stream)?;
        self.radius.encode(stream)?;
        self.material.serialize(stream)
    }
}

/// A sphere whose center moves linearly from `center0` at `time0` to
/// `center1` at `time1`.
#[derive(Debug)]
pub struct MovingSphere {
    center0: Vec3,
    center1: Vec3,
    time0: f32,
    time1: f32,
    radius: f32,
    material: Material,
}

impl MovingSphere {
    pub const TYPE_TAG: i32 = 2;

    pub fn new(
        center0: Vec3,
        center1: Vec3,
        time0: f32,
        time1: f32,
        radius: f32,
        material: Material,
    ) -> Self {
        Self {
            center0,
            center1,
            time0,
            time1,
            radius,
            material,
        }
    }

    /// Center at `time`; affine in time and exact at both endpoints.
    pub fn center(&self, time: f32) -> Vec3 {
        let span = self.time1 - self.time0;
        if span == 0.0 {
            return self.center0;
        }
        self.center0 + ((time - self.time0) / span) * (self.center1 - self.center0)
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let center0 = Vec3::decode(stream)?;
        let center1 = Vec3::decode(stream)?;
        let time0 = f32::decode(stream)?;
        let time1 = f32::decode(stream)?;
        let radius = f32::decode(stream)?;
        let material = Material::create(stream)?;
        Ok(Self::new(center0, center1, time0, time1, radius, material))
    }
}

impl Hittable for MovingSphere {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn UniformRng,
    ) -> bool {
        let center = self.center(ray.time());
        match hit_sphere(center, self.radius, ray, ray_t) {
            Some(t) => {
                fill_record(rec, ray, t, center, self.radius, &self.material);
                true
            }
            None => false,
        }
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        let rvec = Vec3::splat(self.radius.abs());
        let c0 = self.center(t0);
        let c1 = self.center(t1);
        Some(Aabb::join(
            &Aabb::new(c0 - rvec, c0 + rvec),
            &Aabb::new(c1 - rvec, c1 + rvec),
        ))
    }
}

impl Persist for MovingSphere {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.center0.encode(stream)?;
        self.center1.encode(stream)?;
        self.time0.encode(stream)?;
        self.time1.encode(stream)?;
        self.radius.encode(stream)?;
        self.material.serialize(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PcgRng;

    fn grey() -> Material {
        Material::lambertian(Vec3::splat(0.5))
    }

    #[test]
    fn test_sphere_hit() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, grey());
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        let hit = sphere.hit(&ray, Interval::FORWARD, &mut rec, &mut PcgRng::new(0, 0));

        assert!(hit);
        assert!((rec.t - 4.0).abs() < 1e-5);
        assert!((rec.normal - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!(rec.material.is_some());
    }

    #[test]
    fn test_sphere_hit_from_front() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, Material::lambertian(Vec3::ONE));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0), 0.0);
        let mut rec = HitRecord::default();

        assert!(sphere.hit(&ray, Interval::FORWARD, &mut rec, &mut PcgRng::new(0, 0)));
        assert!((rec.t - 4.0).abs() < 1e-5);
        assert!((rec.p - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
        assert!((rec.normal - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_sphere_miss() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, grey());
        let ray = Ray::new(Vec3::new(0.0, 5.0, 5.0), Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        assert!(!sphere.hit(&ray, Interval::FORWARD, &mut rec, &mut PcgRng::new(0, 0)));
    }

    #[test]
    fn test_sphere_hit_from_inside_uses_far_root() {
        let sphere = Sphere::new(Vec3::ZERO, 1.0, grey());
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);
        let mut rec = HitRecord::default();
        assert!(sphere.hit(&ray, Interval::FORWARD, &mut rec, &mut PcgRng::new(0, 0)));
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!(!rec.is_front_face(&ray));
    }

    #[test]
    fn test_sphere_uv_range() {
        let (u, v) = sphere_uv(Vec3::Y);
        assert!((v - 1.0).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&u));
        let (_, v) = sphere_uv(-Vec3::Y);
        assert!(v.abs() < 1e-6);
    }

    #[test]
    fn test_sphere_light_sampling() {
        let sphere = Sphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0, grey());
        let mut rng = PcgRng::new(7, 3);
        for _ in 0..100 {
            let dir = sphere.random(Vec3::ZERO, &mut rng);
            let pdf = sphere.pdf_value(Vec3::ZERO, dir, &mut rng);
            assert!(pdf > 0.0);
        }
        assert_eq!(sphere.pdf_value(Vec3::ZERO, -Vec3::Z, &mut rng), 0.0);
    }

    #[test]
    fn test_moving_sphere_center_is_affine() {
        let c0 = Vec3::new(0.0, 0.0, 0.0);
        let c1 = Vec3::new(2.0, 4.0, 0.0);
        let sphere = MovingSphere::new(c0, c1, 0.0, 1.0, 0.5, grey());
        assert_eq!(sphere.center(0.0), c0);
        assert_eq!(sphere.center(1.0), c1);
        assert!((sphere.center(0.5) - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_moving_sphere_bounds_cover_motion() {
        let sphere = MovingSphere::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), 0.0, 1.0, 0.5, grey());
        let bbox = sphere.bounds(0.0, 1.0).unwrap();
        assert_eq!(bbox.min, Vec3::new(-0.5, -0.5, -0.5));
        assert_eq!(bbox.max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_moving_sphere_hit_at_time() {
        let sphere = MovingSphere::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), 0.0, 1.0, 0.5, grey());
        let ray = Ray::new(Vec3::new(0.0, 3.0, -5.0), Vec3::Z, 1.0);
        let mut rec = HitRecord::default();
        let mut rng = PcgRng::new(0, 0);
        assert!(sphere.hit(&ray, Interval::FORWARD, &mut rec, &mut rng));

        let early = Ray::new(Vec3::new(0.0, 3.0, -5.0), Vec3::Z, 0.0);
        assert!(!sphere.hit(&early, Interval::FORWARD, &mut rec, &mut rng));
    }
}
