//! Probability densities over directions used for importance sampling.

use crate::{
    hittable::Hittable,
    sampling::{random_cosine_direction, random_in_unit_sphere, random_to_sphere},
    Primitive, UniformRng,
};
use lumen_core::{wire, Error, Persist, Result, Stream, Wire, NULL_TAG};
use lumen_math::{Onb, Vec3};
use std::f32::consts::PI;

/// A direction distribution that can be sampled and evaluated.
///
/// `Hitable` borrows the primitive it aims at; every other variant owns its
/// data, so material PDFs are `Pdf<'static>`.
#[derive(Debug, Clone)]
pub enum Pdf<'a> {
    /// Density 1 over the `+z` hemisphere.
    Const,
    Cosine(CosinePdf),
    Hitable(HitablePdf<'a>),
    Mixture(Box<Pdf<'a>>, Box<Pdf<'a>>),
    /// Uniform over the unit sphere.
    Uniform,
}

impl<'a> Pdf<'a> {
    pub const CONST_TAG: i32 = 1;
    pub const COSINE_TAG: i32 = 2;
    pub const HITABLE_TAG: i32 = 3;
    pub const MIXTURE_TAG: i32 = 4;
    pub const UNIFORM_TAG: i32 = 5;

    pub fn cosine(w: Vec3) -> Self {
        Pdf::Cosine(CosinePdf::new(w))
    }

    pub fn hitable(target: &'a Primitive, origin: Vec3) -> Self {
        Pdf::Hitable(HitablePdf::new(target, origin))
    }

    /// Equal-weight mixture of two densities.
    pub fn mixture(p0: Pdf<'a>, p1: Pdf<'a>) -> Self {
        Pdf::Mixture(Box::new(p0), Box::new(p1))
    }

    /// Density of sampling `direction`.
    ///
    /// Never negative, NaN or infinite: invalid densities report 0.
    pub fn value(&self, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        let density = match self {
            Pdf::Const => 1.0,
            Pdf::Cosine(cosine) => cosine.value(direction),
            Pdf::Hitable(hitable) => hitable.value(direction, rng),
            Pdf::Mixture(p0, p1) => 0.5 * p0.value(direction, rng) + 0.5 * p1.value(direction, rng),
            Pdf::Uniform => 1.0 / (4.0 * PI),
        };
        if density.is_finite() && density >= 0.0 {
            density
        } else {
            0.0
        }
    }

    /// Draw a direction from this density.
    pub fn generate(&self, rng: &mut dyn UniformRng) -> Vec3 {
        match self {
            Pdf::Const => random_to_sphere(1.0, 1.0, rng),
            Pdf::Cosine(cosine) => cosine.generate(rng),
            Pdf::Hitable(hitable) => hitable.generate(rng),
            Pdf::Mixture(p0, p1) => {
                if rng.rand() < 0.5 {
                    p0.generate(rng)
                } else {
                    p1.generate(rng)
                }
            }
            Pdf::Uniform => random_in_unit_sphere(rng),
        }
    }

    /// Read a type tag and decode the density it names.
    ///
    /// `Hitable` densities are bound to `target`; decoding one without a
    /// target fails with [`Error::UnboundPdfTarget`].
    pub fn create(stream: &mut Stream, target: Option<&'a Primitive>) -> Result<Pdf<'a>> {
        stream.nested(|stream| Self::decode_tagged(stream, target))
    }

    fn decode_tagged(stream: &mut Stream, target: Option<&'a Primitive>) -> Result<Pdf<'a>> {
        let tag = wire::read_tag(stream)?;
        match tag {
            Self::CONST_TAG => Ok(Pdf::Const),
            Self::COSINE_TAG => Ok(Pdf::cosine(Vec3::decode(stream)?)),
            Self::HITABLE_TAG => {
                let origin = Vec3::decode(stream)?;
                let target = target.ok_or(Error::UnboundPdfTarget)?;
                Ok(Pdf::hitable(target, origin))
            }
            Self::MIXTURE_TAG => {
                let p0 = Pdf::create(stream, target)?;
                let p1 = Pdf::create(stream, target)?;
                Ok(Pdf::mixture(p0, p1))
            }
            Self::UNIFORM_TAG => Ok(Pdf::Uniform),
            NULL_TAG => Err(Error::UnexpectedNull("pdf")),
            _ => Err(Error::UnknownTypeTag { kind: "pdf", tag }),
        }
    }
}

impl Persist for Pdf<'_> {
    fn type_tag(&self) -> i32 {
        match self {
            Pdf::Const => Self::CONST_TAG,
            Pdf::Cosine(_) => Self::COSINE_TAG,
            Pdf::Hitable(_) => Self::HITABLE_TAG,
            Pdf::Mixture(..) => Self::MIXTURE_TAG,
            Pdf::Uniform => Self::UNIFORM_TAG,
        }
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        match self {
            Pdf::Const | Pdf::Uniform => Ok(()),
            Pdf::Cosine(cosine) => cosine.uvw.w().encode(stream),
            Pdf::Hitable(hitable) => hitable.origin.encode(stream),
            Pdf::Mixture(p0, p1) => {
                p0.serialize(stream)?;
                p1.serialize(stream)
            }
        }
    }
}

/// Cosine-weighted hemisphere around a normal.
#[derive(Debug, Clone, Copy)]
pub struct CosinePdf {
    uvw: Onb,
}

impl CosinePdf {
    pub fn new(w: Vec3) -> Self {
        Self {
            uvw: Onb::build_from_w(w),
        }
    }

    fn value(&self, direction: Vec3) -> f32 {
        let cosine = direction.normalize().dot(self.uvw.w());
        if cosine > 0.0 {
            cosine / PI
        } else {
            0.0
        }
    }

    fn generate(&self, rng: &mut dyn UniformRng) -> Vec3 {
        self.uvw.local(random_cosine_direction(rng))
    }
}

/// Directions from `origin` towards a primitive, usually a light.
#[derive(Debug, Clone, Copy)]
pub struct HitablePdf<'a> {
    target: &'a Primitive,
    origin: Vec3,
}

impl<'a> HitablePdf<'a> {
    pub fn new(target: &'a Primitive, origin: Vec3) -> Self {
        Self { target, origin }
    }

    fn value(&self, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        self.target.pdf_value(self.origin, direction, rng)
    }

    fn generate(&self, rng: &mut dyn UniformRng) -> Vec3 {
        self.target.random(self.origin, rng)
    }
}
