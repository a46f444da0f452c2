//! Axis-aligned rectangles, boxes built from them, and normal flipping.

use crate::{
    hittable::{HitRecord, HitableList, Hittable},
    Material, Primitive, UniformRng,
};
use lumen_core::{Error, Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Half thickness given to rectangle bounds along their fixed axis.
const RECT_THICKNESS: f32 = 1e-4;

/// Plane a rectangle lies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plane {
    Xy,
    Xz,
    Yz,
}

impl Plane {
    /// `(a, b, fixed)` axis indices.
    #[inline]
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            Plane::Xy => (0, 1, 2),
            Plane::Xz => (0, 2, 1),
            Plane::Yz => (1, 2, 0),
        }
    }

    pub fn type_tag(self) -> i32 {
        match self {
            Plane::Xy => 3,
            Plane::Xz => 4,
            Plane::Yz => 5,
        }
    }

    pub fn from_tag(tag: i32) -> Option<Plane> {
        match tag {
            3 => Some(Plane::Xy),
            4 => Some(Plane::Xz),
            5 => Some(Plane::Yz),
            _ => None,
        }
    }

    /// Place in-plane coordinates `(a, b)` at height `k` in world space.
    fn point(self, a: f32, b: f32, k: f32) -> Vec3 {
        let (ia, ib, ik) = self.axes();
        let mut p = Vec3::ZERO;
        p[ia] = a;
        p[ib] = b;
        p[ik] = k;
        p
    }

    fn normal(self) -> Vec3 {
        let mut n = Vec3::ZERO;
        n[self.axes().2] = 1.0;
        n
    }
}

/// Rectangle `[a0, a1] x [b0, b1]` at `k` along the plane's fixed axis.
///
/// The normal always points along `+axis`; wrap in [`FlipNormals`] for the
/// other side.
#[derive(Debug)]
pub struct AxisRect {
    plane: Plane,
    a0: f32,
    a1: f32,
    b0: f32,
    b1: f32,
    k: f32,
    material: Material,
}

impl AxisRect {
    pub fn new(plane: Plane, a0: f32, a1: f32, b0: f32, b1: f32, k: f32, material: Material) -> Self {
        Self {
            plane,
            a0,
            a1,
            b0,
            b1,
            k,
            material,
        }
    }

    pub fn xy(x0: f32, x1: f32, y0: f32, y1: f32, k: f32, material: Material) -> Self {
        Self::new(Plane::Xy, x0, x1, y0, y1, k, material)
    }

    pub fn xz(x0: f32, x1: f32, z0: f32, z1: f32, k: f32, material: Material) -> Self {
        Self::new(Plane::Xz, x0, x1, z0, z1, k, material)
    }

    pub fn yz(y0: f32, y1: f32, z0: f32, z1: f32, k: f32, material: Material) -> Self {
        Self::new(Plane::Yz, y0, y1, z0, z1, k, material)
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn area(&self) -> f32 {
        (self.a1 - self.a0) * (self.b1 - self.b0)
    }

    /// Parameter and in-plane coordinates of the crossing with the plane.
    fn crossing(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, f32, f32)> {
        // Zero-width rectangles are degenerate
        if !(self.a1 > self.a0 && self.b1 > self.b0) {
            return None;
        }
        let (ia, ib, ik) = self.plane.axes();
        let t = (self.k - ray.origin()[ik]) / ray.direction()[ik];
        if !ray_t.surrounds(t) {
            return None;
        }
        let a = ray.origin()[ia] + t * ray.direction()[ia];
        let b = ray.origin()[ib] + t * ray.direction()[ib];
        if a < self.a0 || a > self.a1 || b < self.b0 || b > self.b1 {
            return None;
        }
        Some((t, a, b))
    }

    /// Decode the payload of a rectangle whose tag selected `plane`.
    pub fn deserialize(plane: Plane, stream: &mut Stream) -> Result<Self> {
        let a0 = f32::decode(stream)?;
        let a1 = f32::decode(stream)?;
        let b0 = f32::decode(stream)?;
        let b1 = f32::decode(stream)?;
        let k = f32::decode(stream)?;
        let material = Material::create(stream)?;
        Ok(Self::new(plane, a0, a1, b0, b1, k, material))
    }
}

impl Hittable for AxisRect {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn UniformRng,
    ) -> bool {
        let Some((t, a, b)) = self.crossing(ray, ray_t) else {
            return false;
        };
        rec.t = t;
        rec.p = ray.at(t);
        rec.normal = self.plane.normal();
        rec.u = (a - self.a0) / (self.a1 - self.a0);
        rec.v = (b - self.b0) / (self.b1 - self.b0);
        rec.material = Some(&self.material);
        true
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        Some(Aabb::new(
            self.plane.point(self.a0, self.b0, self.k - RECT_THICKNESS),
            self.plane.point(self.a1, self.b1, self.k + RECT_THICKNESS),
        ))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, _rng: &mut dyn UniformRng) -> f32 {
        let ray = Ray::new(origin, direction, 0.0);
        let Some((t, _, _)) = self.crossing(&ray, Interval::FORWARD) else {
            return 0.0;
        };
        let length_squared = direction.length_squared();
        let distance_squared = t * t * length_squared;
        let cosine = (direction.dot(self.plane.normal()) / length_squared.sqrt()).abs();
        distance_squared / (cosine * self.area())
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        let a = self.a0 + rng.rand() * (self.a1 - self.a0);
        let b = self.b0 + rng.rand() * (self.b1 - self.b0);
        self.plane.point(a, b, self.k) - origin
    }
}

impl Persist for AxisRect {
    fn type_tag(&self) -> i32 {
        self.plane.type_tag()
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.a0.encode(stream)?;
        self.a1.encode(stream)?;
        self.b0.encode(stream)?;
        self.b1.encode(stream)?;
        self.k.encode(stream)?;
        self.material.serialize(stream)
    }
}

/// Reverses the normal reported by its child.
#[derive(Debug)]
pub struct FlipNormals {
    child: Box<Primitive>,
}

impl FlipNormals {
    pub const TYPE_TAG: i32 = 12;

    pub fn new(child: impl Into<Primitive>) -> Self {
        Self {
            child: Box::new(child.into()),
        }
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        Ok(Self::new(Primitive::create(stream)?))
    }
}

impl Hittable for FlipNormals {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        if self.child.hit(ray, ray_t, rec, rng) {
            rec.normal = -rec.normal;
            true
        } else {
            false
        }
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        self.child.bounds(t0, t1)
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        self.child.pdf_value(origin, direction, rng)
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        self.child.random(origin, rng)
    }
}

impl Persist for FlipNormals {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.child.serialize(stream)
    }
}

/// Axis-aligned box made of six rectangles with outward normals.
#[derive(Debug)]
pub struct Cuboid {
    pmin: Vec3,
    pmax: Vec3,
    material: Material,
    sides: HitableList,
}

impl Cuboid {
    pub const TYPE_TAG: i32 = 6;

    pub fn new(p0: Vec3, p1: Vec3, material: Material) -> Self {
        let pmin = p0.min(p1);
        let pmax = p0.max(p1);

        let mut sides = HitableList::default();
        sides.add(AxisRect::xy(pmin.x, pmax.x, pmin.y, pmax.y, pmax.z, material.clone()));
        sides.add(FlipNormals::new(AxisRect::xy(
            pmin.x, pmax.x, pmin.y, pmax.y, pmin.z, material.clone(),
        )));
        sides.add(AxisRect::xz(pmin.x, pmax.x, pmin.z, pmax.z, pmax.y, material.clone()));
        sides.add(FlipNormals::new(AxisRect::xz(
            pmin.x, pmax.x, pmin.z, pmax.z, pmin.y, material.clone(),
        )));
        sides.add(AxisRect::yz(pmin.y, pmax.y, pmin.z, pmax.z, pmax.x, material.clone()));
        sides.add(FlipNormals::new(AxisRect::yz(
            pmin.y, pmax.y, pmin.z, pmax.z, pmin.x, material.clone(),
        )));

        Self {
            pmin,
            pmax,
            material,
            sides,
        }
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let pmin = Vec3::decode(stream)?;
        let pmax = Vec3::decode(stream)?;
        if pmin.cmpgt(pmax).any() {
            return Err(Error::invalid(format!("box min {pmin} exceeds max {pmax}")));
        }
        let material = Material::create(stream)?;
        Ok(Self::new(pmin, pmax, material))
    }
}

impl Hittable for Cuboid {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        self.sides.hit(ray, ray_t, rec, rng)
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        Some(Aabb::new(self.pmin, self.pmax))
    }
}

impl Persist for Cuboid {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.pmin.encode(stream)?;
        self.pmax.encode(stream)?;
        self.material.serialize(stream)
    }
}
