//! Hittable trait, HitRecord and the brute-force HitableList.

use crate::{Material, Primitive, UniformRng};
use lumen_core::{Error, Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Record of a ray-object intersection.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitRecord<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Geometric outward normal as produced by the primitive
    pub normal: Vec3,
    /// Material at the intersection point
    pub material: Option<&'a Material>,
    /// UV texture coordinates
    pub u: f32,
    pub v: f32,
}

impl HitRecord<'_> {
    /// Whether `ray` arrived from the side the normal points to.
    pub fn is_front_face(&self, ray: &Ray) -> bool {
        ray.direction().dot(self.normal) < 0.0
    }
}

/// Trait for objects that can be hit by rays.
pub trait Hittable: Send + Sync {
    /// Find the closest hit with `t` strictly inside `ray_t`.
    ///
    /// Returns true if hit and fills in the hit record; `rec` is left alone
    /// on a miss. `rng` is only consumed by participating media.
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool;

    /// Conservative bounds over the time interval `[t0, t1]`.
    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb>;

    /// Solid-angle density of sampling `direction` from `origin` towards
    /// this object.
    fn pdf_value(&self, _origin: Vec3, _direction: Vec3, _rng: &mut dyn UniformRng) -> f32 {
        0.0
    }

    /// Sample a direction from `origin` towards this object.
    fn random(&self, _origin: Vec3, _rng: &mut dyn UniformRng) -> Vec3 {
        Vec3::X
    }
}

/// A list of primitives tested one after another.
#[derive(Debug, Default)]
pub struct HitableList {
    objects: Vec<Primitive>,
}

impl HitableList {
    pub const TYPE_TAG: i32 = 13;

    pub fn new(objects: Vec<Primitive>) -> Self {
        Self { objects }
    }

    /// Add an object to the list.
    pub fn add(&mut self, object: impl Into<Primitive>) {
        self.objects.push(object.into());
    }

    pub fn objects(&self) -> &[Primitive] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let count = u32::decode(stream)?;
        let objects = (0..count)
            .map(|_| Primitive::create(stream))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { objects })
    }
}

impl Hittable for HitableList {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        let mut hit_anything = false;
        let mut closest_so_far = ray_t.max;

        for object in &self.objects {
            if object.hit(ray, ray_t.with_max(closest_so_far), rec, rng) {
                hit_anything = true;
                closest_so_far = rec.t;
            }
        }

        hit_anything
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        let (first, rest) = self.objects.split_first()?;
        rest.iter().try_fold(first.bounds(t0, t1)?, |acc, object| {
            Some(Aabb::join(&acc, &object.bounds(t0, t1)?))
        })
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        if self.objects.is_empty() {
            return 0.0;
        }
        let weight = 1.0 / self.objects.len() as f32;
        self.objects
            .iter()
            .map(|object| weight * object.pdf_value(origin, direction, rng))
            .sum()
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        if self.objects.is_empty() {
            return Vec3::X;
        }
        let n = self.objects.len();
        let index = ((rng.rand() * n as f32) as usize).min(n - 1);
        self.objects[index].random(origin, rng)
    }
}

impl Persist for HitableList {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        let count = u32::try_from(self.objects.len())
            .map_err(|_| Error::invalid("too many list children"))?;
        count.encode(stream)?;
        self.objects
            .iter()
            .try_for_each(|object| object.serialize(stream))
    }
}

impl FromIterator<Primitive> for HitableList {
    fn from_iter<I: IntoIterator<Item = Primitive>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, PcgRng, Sphere};

    fn sphere_at(x: f32) -> Primitive {
        Sphere::new(Vec3::new(x, 0.0, -5.0), 0.5, Material::lambertian(Vec3::splat(0.5))).into()
    }

    #[test]
    fn test_list_returns_closest() {
        let list = HitableList::new(vec![
            Sphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0, Material::lambertian(Vec3::ONE)).into(),
            Sphere::new(Vec3::new(0.0, 0.0, -4.0), 1.0, Material::lambertian(Vec3::ONE)).into(),
        ]);
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        let mut rec = HitRecord::default();
        let mut rng = PcgRng::new(0, 0);
        assert!(list.hit(&ray, Interval::FORWARD, &mut rec, &mut rng));
        assert!((rec.t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_list_has_no_bounds() {
        let list = HitableList::default();
        assert!(list.bounds(0.0, 1.0).is_none());
        assert_eq!(list.pdf_value(Vec3::ZERO, Vec3::X, &mut PcgRng::new(0, 0)), 0.0);
    }

    #[test]
    fn test_list_bounds_join_children() {
        let list: HitableList = [sphere_at(-2.0), sphere_at(3.0)].into_iter().collect();
        let bbox = list.bounds(0.0, 1.0).unwrap();
        assert_eq!(bbox.min, Vec3::new(-2.5, -0.5, -5.5));
        assert_eq!(bbox.max, Vec3::new(3.5, 0.5, -4.5));
    }

    #[test]
    fn test_miss_leaves_record_untouched() {
        let list: HitableList = [sphere_at(0.0)].into_iter().collect();
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        let mut rec = HitRecord {
            t: 42.0,
            ..Default::default()
        };
        assert!(!list.hit(&ray, Interval::FORWARD, &mut rec, &mut PcgRng::new(1, 1)));
        assert_eq!(rec.t, 42.0);
    }
}
