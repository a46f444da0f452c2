//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree of [`Primitive`]s. Each level sorts its objects along a
//! randomly chosen axis and splits them at the median; leaves are the
//! primitives themselves.

use crate::{
    hittable::{HitRecord, Hittable},
    Primitive, UniformRng,
};
use lumen_core::{persist, Error, Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Internal BVH node owning one or two children.
#[derive(Debug)]
pub struct Bvh {
    left: Box<Primitive>,
    right: Option<Box<Primitive>>,
    bbox: Aabb,
}

impl Bvh {
    pub const TYPE_TAG: i32 = 14;

    /// Build a hierarchy over `objects` with bounds taken over `[t0, t1]`.
    pub fn new(objects: Vec<Primitive>, t0: f32, t1: f32, rng: &mut dyn UniformRng) -> Result<Self> {
        let count = objects.len();
        let bvh = Self::build(objects, t0, t1, rng)?;
        log::debug!("Built BVH over {} primitives, bounds {:?}", count, bvh.bbox);
        Ok(bvh)
    }

    fn build(objects: Vec<Primitive>, t0: f32, t1: f32, rng: &mut dyn UniformRng) -> Result<Self> {
        let n = objects.len();
        if n == 0 {
            return Err(Error::EmptyBvh);
        }

        // Bounds once per object; sorting compares them repeatedly.
        let mut keyed = objects
            .into_iter()
            .map(|object| object.bounds(t0, t1).map(|bbox| (bbox, object)))
            .collect::<Option<Vec<_>>>()
            .ok_or(Error::Unbounded)?;

        if n == 1 {
            let (bbox, left) = keyed.pop().ok_or(Error::EmptyBvh)?;
            return Ok(Self {
                left: Box::new(left),
                right: None,
                bbox,
            });
        }

        let axis = ((3.0 * rng.rand()) as usize).min(2);
        keyed.sort_unstable_by(|(a, _), (b, _)| a.min[axis].total_cmp(&b.min[axis]));

        let bbox = keyed
            .iter()
            .skip(1)
            .fold(keyed[0].0, |acc, (bbox, _)| Aabb::join(&acc, bbox));

        let right_half = keyed.split_off(n / 2);
        let left = Self::subtree(keyed, t0, t1, rng)?;
        let right = Self::subtree(right_half, t0, t1, rng)?;

        Ok(Self {
            left: Box::new(left),
            right: Some(Box::new(right)),
            bbox,
        })
    }

    /// A single object stays a leaf; anything larger becomes a nested node.
    fn subtree(
        mut keyed: Vec<(Aabb, Primitive)>,
        t0: f32,
        t1: f32,
        rng: &mut dyn UniformRng,
    ) -> Result<Primitive> {
        if keyed.len() == 1 {
            let (_, object) = keyed.pop().ok_or(Error::EmptyBvh)?;
            return Ok(object);
        }
        let objects = keyed.into_iter().map(|(_, object)| object).collect();
        Ok(Primitive::Bvh(Self::build(objects, t0, t1, rng)?))
    }

    pub fn bbox(&self) -> Aabb {
        self.bbox
    }

    pub fn left(&self) -> &Primitive {
        &self.left
    }

    pub fn right(&self) -> Option<&Primitive> {
        self.right.as_deref()
    }

    /// Number of nodes below and including this one.
    pub fn node_count(&self) -> usize {
        let count = |p: &Primitive| match p {
            Primitive::Bvh(node) => node.node_count(),
            _ => 0,
        };
        1 + count(&*self.left) + self.right.as_deref().map_or(0, count)
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let bbox = Aabb::decode(stream)?;
        let left = Primitive::create(stream)?;
        let right = Primitive::create_optional(stream)?;
        Ok(Self {
            left: Box::new(left),
            right: right.map(Box::new),
            bbox,
        })
    }
}

impl Hittable for Bvh {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        if !self.bbox.hit(ray, ray_t) {
            return false;
        }

        let hit_left = self.left.hit(ray, ray_t, rec, rng);

        // Only check right up to closest hit
        let right_t = if hit_left { ray_t.with_max(rec.t) } else { ray_t };
        let hit_right = match &self.right {
            Some(right) => right.hit(ray, right_t, rec, rng),
            None => false,
        };

        hit_left || hit_right
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        Some(self.bbox)
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        match &self.right {
            Some(right) => {
                0.5 * self.left.pdf_value(origin, direction, rng)
                    + 0.5 * right.pdf_value(origin, direction, rng)
            }
            None => self.left.pdf_value(origin, direction, rng),
        }
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        match &self.right {
            Some(right) if rng.rand() >= 0.5 => right.random(origin, rng),
            _ => self.left.random(origin, rng),
        }
    }
}

impl Persist for Bvh {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.bbox.encode(stream)?;
        self.left.serialize(stream)?;
        persist::serialize_optional(self.right.as_deref(), stream)
    }
}
