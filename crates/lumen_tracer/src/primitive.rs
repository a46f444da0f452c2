//! The closed set of traceable primitives.

use crate::{
    hittable::{HitRecord, HitableList, Hittable},
    AxisRect, Bvh, ConstantMedium, Cuboid, FlipNormals, MovingSphere, Plane, RotateY, Sphere,
    Translate, Triangle, TriangleMesh, UniformRng,
};
use lumen_core::{wire, Error, Persist, Result, Stream, NULL_TAG};
use lumen_math::{Aabb, Interval, Ray, Vec3};

/// Any node of the scene graph.
///
/// Ownership is strictly tree shaped: wrappers own one boxed child, lists
/// and BVH nodes own theirs.
#[derive(Debug)]
pub enum Primitive {
    Sphere(Sphere),
    MovingSphere(MovingSphere),
    Rect(AxisRect),
    Cuboid(Cuboid),
    Triangle(Triangle),
    TriangleMesh(TriangleMesh),
    ConstantMedium(ConstantMedium),
    Translate(Translate),
    RotateY(RotateY),
    FlipNormals(FlipNormals),
    List(HitableList),
    Bvh(Bvh),
}

macro_rules! dispatch {
    ($self:expr, $p:ident => $body:expr) => {
        match $self {
            Primitive::Sphere($p) => $body,
            Primitive::MovingSphere($p) => $body,
            Primitive::Rect($p) => $body,
            Primitive::Cuboid($p) => $body,
            Primitive::Triangle($p) => $body,
            Primitive::TriangleMesh($p) => $body,
            Primitive::ConstantMedium($p) => $body,
            Primitive::Translate($p) => $body,
            Primitive::RotateY($p) => $body,
            Primitive::FlipNormals($p) => $body,
            Primitive::List($p) => $body,
            Primitive::Bvh($p) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Primitive {
                fn from(value: $ty) -> Self {
                    Primitive::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    Sphere(Sphere),
    MovingSphere(MovingSphere),
    Rect(AxisRect),
    Cuboid(Cuboid),
    Triangle(Triangle),
    TriangleMesh(TriangleMesh),
    ConstantMedium(ConstantMedium),
    Translate(Translate),
    RotateY(RotateY),
    FlipNormals(FlipNormals),
    List(HitableList),
    Bvh(Bvh),
);

impl Primitive {
    /// Read a type tag and decode the node it names.
    pub fn create(stream: &mut Stream) -> Result<Primitive> {
        Self::create_optional(stream)?.ok_or(Error::UnexpectedNull("primitive"))
    }

    /// Like [`create`](Self::create), but the null tag yields `None`.
    pub fn create_optional(stream: &mut Stream) -> Result<Option<Primitive>> {
        stream.nested(Self::decode_tagged)
    }

    fn decode_tagged(stream: &mut Stream) -> Result<Option<Primitive>> {
        let tag = wire::read_tag(stream)?;
        let primitive = match tag {
            NULL_TAG => return Ok(None),
            Sphere::TYPE_TAG => Sphere::deserialize(stream)?.into(),
            MovingSphere::TYPE_TAG => MovingSphere::deserialize(stream)?.into(),
            3..=5 => {
                let plane = Plane::from_tag(tag).ok_or(Error::UnknownTypeTag {
                    kind: "primitive",
                    tag,
                })?;
                AxisRect::deserialize(plane, stream)?.into()
            }
            Cuboid::TYPE_TAG => Cuboid::deserialize(stream)?.into(),
            Triangle::TYPE_TAG => Triangle::deserialize(stream)?.into(),
            TriangleMesh::TYPE_TAG => TriangleMesh::deserialize(stream)?.into(),
            ConstantMedium::TYPE_TAG => ConstantMedium::deserialize(stream)?.into(),
            Translate::TYPE_TAG => Translate::deserialize(stream)?.into(),
            RotateY::TYPE_TAG => RotateY::deserialize(stream)?.into(),
            FlipNormals::TYPE_TAG => FlipNormals::deserialize(stream)?.into(),
            HitableList::TYPE_TAG => HitableList::deserialize(stream)?.into(),
            Bvh::TYPE_TAG => Bvh::deserialize(stream)?.into(),
            _ => {
                return Err(Error::UnknownTypeTag {
                    kind: "primitive",
                    tag,
                })
            }
        };
        Ok(Some(primitive))
    }
}

impl Hittable for Primitive {
    #[inline]
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        rng: &mut dyn UniformRng,
    ) -> bool {
        dispatch!(self, p => p.hit(ray, ray_t, rec, rng))
    }

    fn bounds(&self, t0: f32, t1: f32) -> Option<Aabb> {
        dispatch!(self, p => p.bounds(t0, t1))
    }

    fn pdf_value(&self, origin: Vec3, direction: Vec3, rng: &mut dyn UniformRng) -> f32 {
        dispatch!(self, p => p.pdf_value(origin, direction, rng))
    }

    fn random(&self, origin: Vec3, rng: &mut dyn UniformRng) -> Vec3 {
        dispatch!(self, p => p.random(origin, rng))
    }
}

impl Persist for Primitive {
    fn type_tag(&self) -> i32 {
        dispatch!(self, p => p.type_tag())
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        dispatch!(self, p => p.serialize(stream))
    }
}
