//! Instancing wrappers that move a child primitive.

use crate::{
    hittable::{HitRecord, Hittable},
    Primitive, UniformRng,
};
use lumen_core::{Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Mat4, Mat4Ext, Ray, Vec3};

/// Offsets its child by a constant vector.
#[derive(Debug)]
pub struct Translate {
    offset: Vec3,
    child: Box<Primitive>,
}

impl Translate {
    pub const TYPE_TAG: i32 = 10;

    pub fn new(child: impl Into<Primitive>, offset: Vec3) -> Self {
        Self {
            offset,
            child: Box::new(child.into()),
        }
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let offset = Vec3::decode(stream)?;
        let child = Primitive::create(stream)?;
        Ok(Self::new(child, offset))
    }
}

impl Hittable for Translate {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        let moved = ray.shifted(self.offset);
        if self.child.hit(&moved, ray_t, rec, rng) {
            rec.p += self.offset;
            true
        } else {
            false
        }
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        self.child
            .bounds(t0, t1)
            .map(|bbox| bbox.translate(self.offset))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        self.child.pdf_value(origin - self.offset, direction, rng)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        self.child.random(origin - self.offset, rng)
    }
}

impl Persist for Translate {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.offset.encode(stream)?;
        self.child.serialize(stream)
    }
}

/// Rotates its child about the Y axis.
#[derive(Debug)]
pub struct RotateY {
    angle: f32,
    child: Box<Primitive>,
    /// Object to world
    rotation: Mat4,
    /// World to object
    inverse: Mat4,
    bbox: Option<Aabb>,
}

impl RotateY {
    pub const TYPE_TAG: i32 = 11;

    /// Rotate `child` by `angle` degrees.
    pub fn new(child: impl Into<Primitive>, angle: f32) -> Self {
        let child = child.into();
        let rotation = Mat4::from_rotation_y(angle.to_radians());
        let inverse = rotation.inverse();
        let bbox = child
            .bounds(0.0, 1.0)
            .map(|bbox| rotation.transform_aabb(&bbox));
        Self {
            angle,
            child: Box::new(child),
            rotation,
            inverse,
            bbox,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let angle = f32::decode(stream)?;
        let child = Primitive::create(stream)?;
        Ok(Self::new(child, angle))
    }
}

impl Hittable for RotateY {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        let local = ray.transformed(&self.inverse);
        if self.child.hit(&local, ray_t, rec, rng) {
            rec.p = self.rotation.transform_point3(rec.p);
            rec.normal = self.rotation.transform_vector3(rec.normal);
            true
        } else {
            false
        }
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        self.bbox
    }
}

impl Persist for RotateY {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.angle.encode(stream)?;
        self.child.serialize(stream)
    }
}
