//! Homogeneous participating medium bounded by another primitive.

use crate::{
    hittable::{HitRecord, Hittable},
    Material, Primitive, Texture, UniformRng,
};
use lumen_core::{Error, Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Offset used to find the exit point after the entry point.
const EXIT_EPSILON: f32 = 0.0001;

/// Fog of constant density filling a closed boundary.
///
/// Rays scatter after an exponentially distributed free path; the hit uses
/// the isotropic phase material and an arbitrary normal.
#[derive(Debug)]
pub struct ConstantMedium {
    boundary: Box<Primitive>,
    density: f32,
    phase_function: Material,
}

impl ConstantMedium {
    pub const TYPE_TAG: i32 = 9;

    pub fn new(boundary: impl Into<Primitive>, density: f32, albedo: Texture) -> Self {
        Self::with_phase(boundary, density, Material::isotropic(albedo))
    }

    pub fn with_phase(boundary: impl Into<Primitive>, density: f32, phase_function: Material) -> Self {
        Self {
            boundary: Box::new(boundary.into()),
            density,
            phase_function,
        }
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let density = f32::decode(stream)?;
        if density.is_nan() || density <= 0.0 {
            return Err(Error::invalid(format!("medium density {density} must be positive")));
        }
        let phase_function = Material::create(stream)?;
        let boundary = Primitive::create(stream)?;
        Ok(Self::with_phase(boundary, density, phase_function))
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        let mut rec1 = HitRecord::default();
        let mut rec2 = HitRecord::default();

        if !self.boundary.hit(ray, Interval::UNIVERSE, &mut rec1, rng) {
            return false;
        }
        if !self
            .boundary
            .hit(ray, Interval::UNIVERSE.with_min(rec1.t + EXIT_EPSILON), &mut rec2, rng)
        {
            return false;
        }

        let entry = rec1.t.max(ray_t.min).max(0.0);
        let exit = rec2.t.min(ray_t.max);
        if entry >= exit {
            return false;
        }

        let ray_length = ray.direction().length();
        let distance_inside = (exit - entry) * ray_length;
        let hit_distance = -(1.0 / self.density) * rng.rand().ln();
        if hit_distance >= distance_inside {
            return false;
        }

        rec.t = entry + hit_distance / ray_length;
        rec.p = ray.at(rec.t);
        rec.normal = Vec3::X;
        rec.u = 0.0;
        rec.v = 0.0;
        rec.material = Some(&self.phase_function);
        true
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        self.boundary.bounds(t0, t1)
    }
}

impl Persist for ConstantMedium {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.density.encode(stream)?;
        self.phase_function.serialize(stream)?;
        self.boundary.serialize(stream)
    }
}
