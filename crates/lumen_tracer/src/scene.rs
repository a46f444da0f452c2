//! A renderable scene: the root primitive plus the lights to sample.

use crate::{
    AxisRect, Bvh, Camera, Cuboid, FlipNormals, Material, PcgRng, Primitive, RotateY, Translate,
};
use lumen_core::{persist, Persist, Result, Stream};
use lumen_math::Vec3;

/// Root of the scene graph. Immutable while tracing.
#[derive(Debug)]
pub struct Scene {
    pub world: Primitive,
    /// Emitters sampled directly by the integrator
    pub lights: Option<Primitive>,
}

impl Scene {
    pub fn new(world: impl Into<Primitive>, lights: Option<Primitive>) -> Self {
        Self {
            world: world.into(),
            lights,
        }
    }

    /// Write `[world][lights | null tag]`.
    pub fn serialize(&self, stream: &mut Stream) -> Result<()> {
        let start = stream.write_offset();
        self.world.serialize(stream)?;
        persist::serialize_optional(self.lights.as_ref(), stream)?;
        log::debug!(
            "Serialized scene: {} bytes",
            stream.write_offset() - start
        );
        Ok(())
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let start = stream.read_offset();
        let world = Primitive::create(stream).inspect_err(|e| {
            log::warn!("Failed to decode scene world: {e}");
        })?;
        let lights = Primitive::create_optional(stream).inspect_err(|e| {
            log::warn!("Failed to decode scene lights: {e}");
        })?;
        log::info!(
            "Loaded scene ({} bytes, lights: {})",
            stream.read_offset() - start,
            lights.is_some()
        );
        Ok(Self { world, lights })
    }

    /// Serialize into a fresh owned stream of `capacity` bytes.
    pub fn to_stream(&self, capacity: usize) -> Result<Stream<'static>> {
        let mut stream = Stream::create(capacity);
        self.serialize(&mut stream)?;
        Ok(stream)
    }

    /// The classic Cornell box: five walls, a ceiling light and two
    /// rotated boxes, wrapped in a BVH.
    pub fn cornell_box() -> Result<Self> {
        let red = Material::lambertian(Vec3::new(0.65, 0.05, 0.05));
        let white = Material::lambertian(Vec3::splat(0.73));
        let green = Material::lambertian(Vec3::new(0.12, 0.45, 0.15));
        let light = Material::diffuse_light(Vec3::splat(15.0));

        let objects: Vec<Primitive> = vec![
            FlipNormals::new(AxisRect::yz(0.0, 555.0, 0.0, 555.0, 555.0, green)).into(),
            AxisRect::yz(0.0, 555.0, 0.0, 555.0, 0.0, red).into(),
            FlipNormals::new(AxisRect::xz(213.0, 343.0, 227.0, 332.0, 554.0, light.clone())).into(),
            FlipNormals::new(AxisRect::xz(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())).into(),
            AxisRect::xz(0.0, 555.0, 0.0, 555.0, 0.0, white.clone()).into(),
            FlipNormals::new(AxisRect::xy(0.0, 555.0, 0.0, 555.0, 555.0, white.clone())).into(),
            Translate::new(
                RotateY::new(
                    Cuboid::new(Vec3::ZERO, Vec3::splat(165.0), white.clone()),
                    -18.0,
                ),
                Vec3::new(130.0, 0.0, 65.0),
            )
            .into(),
            Translate::new(
                RotateY::new(
                    Cuboid::new(Vec3::ZERO, Vec3::new(165.0, 330.0, 165.0), white),
                    15.0,
                ),
                Vec3::new(265.0, 0.0, 295.0),
            )
            .into(),
        ];

        let mut rng = PcgRng::new(0, 0);
        let world = Bvh::new(objects, 0.0, 1.0, &mut rng)?;
        let lights = AxisRect::xz(213.0, 343.0, 227.0, 332.0, 554.0, light);
        Ok(Self::new(world, Some(lights.into())))
    }
}

/// Camera framing [`Scene::cornell_box`].
pub fn cornell_camera(width: u32, height: u32) -> Camera {
    Camera::new()
        .with_resolution(width, height)
        .with_position(
            Vec3::new(278.0, 278.0, -800.0),
            Vec3::new(278.0, 278.0, 0.0),
            Vec3::Y,
        )
        .with_lens(40.0, 0.0, 10.0)
        .with_shutter(0.0, 1.0)
}
