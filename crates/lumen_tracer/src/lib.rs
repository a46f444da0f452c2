//! Lumen tracer - CPU path tracing core.
//!
//! A Monte Carlo path tracer built around a closed set of scene node types:
//! - Primitives, instancing transforms and participating media ([`Primitive`])
//! - A bounding volume hierarchy over any of them ([`Bvh`])
//! - Materials, textures and sampling densities ([`Material`], [`Texture`], [`Pdf`])
//!
//! Every node can be written to and rebuilt from a [`lumen_core::Stream`],
//! so a whole [`Scene`] can be shipped to another renderer backend.

mod bucket;
mod bvh;
mod camera;
mod hittable;
mod material;
mod medium;
mod pdf;
mod perlin;
mod primitive;
mod rect;
mod renderer;
mod rng;
pub mod sampling;
mod scene;
mod sphere;
mod texture;
mod transform;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use bvh::Bvh;
pub use camera::Camera;
pub use hittable::{HitRecord, HitableList, Hittable};
pub use material::{
    Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterKind, ScatterRecord,
};
pub use medium::ConstantMedium;
pub use pdf::{CosinePdf, HitablePdf, Pdf};
pub use perlin::{Perlin, TURBULENCE_DEPTH};
pub use primitive::Primitive;
pub use rect::{AxisRect, Cuboid, FlipNormals, Plane};
pub use renderer::{
    color_to_rgba, linear_to_gamma, ray_color, render, render_pixel, Ambient, Backend, ImageBuffer,
    RenderConfig, RenderError,
};
pub use rng::{PcgRng, SimpleRng, StdRandRng, UniformRng};
pub use scene::{cornell_camera, Scene};
pub use sphere::{MovingSphere, Sphere};
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, Texture, CHECKER_SCALE, MISSING_TEXTURE_COLOR};
pub use transform::{RotateY, Translate};
pub use triangle::{TriAccel, TriIndex, Triangle, TriangleMesh};

/// Re-export the math types that appear in this crate's API
pub use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};
