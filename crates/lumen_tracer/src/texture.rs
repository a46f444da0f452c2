//! Textures: spatially varying colours looked up by `(u, v, p)`.

use crate::{
    perlin::{Perlin, TURBULENCE_DEPTH},
    Color,
};
use lumen_core::{wire, Error, Persist, Result, Stream, Wire, NULL_TAG};
use lumen_math::Vec3;

/// Colour returned by an image texture that has no pixels.
pub const MISSING_TEXTURE_COLOR: Color = Vec3::new(0.0, 1.0, 1.0);

/// Default frequency of the checker pattern.
pub const CHECKER_SCALE: f32 = 10.0;

/// Largest pixel buffer accepted when decoding an image texture.
const MAX_IMAGE_BYTES: u32 = 1 << 30;

#[derive(Debug, Clone)]
pub enum Texture {
    Constant(Color),
    Checker(CheckerTexture),
    Noise(NoiseTexture),
    Image(ImageTexture),
}

impl Texture {
    pub const CONSTANT_TAG: i32 = 1;
    pub const CHECKER_TAG: i32 = 2;
    pub const NOISE_TAG: i32 = 3;
    pub const IMAGE_TAG: i32 = 4;

    pub fn constant(color: Color) -> Self {
        Texture::Constant(color)
    }

    pub fn checker(even: Texture, odd: Texture) -> Self {
        Texture::Checker(CheckerTexture::new(even, odd, CHECKER_SCALE))
    }

    pub fn noise(scale: f32, seed: u64) -> Self {
        Texture::Noise(NoiseTexture::new(scale, seed))
    }

    /// Colour at surface coordinates `(u, v)` and world position `p`.
    pub fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        match self {
            Texture::Constant(color) => *color,
            Texture::Checker(checker) => checker.value(u, v, p),
            Texture::Noise(noise) => noise.value(p),
            Texture::Image(image) => image.value(u, v),
        }
    }

    /// Read a type tag and decode the texture it names.
    pub fn create(stream: &mut Stream) -> Result<Texture> {
        stream.nested(Self::decode_tagged)
    }

    fn decode_tagged(stream: &mut Stream) -> Result<Texture> {
        let tag = wire::read_tag(stream)?;
        match tag {
            Self::CONSTANT_TAG => Ok(Texture::Constant(Vec3::decode(stream)?)),
            Self::CHECKER_TAG => {
                let scale = f32::decode(stream)?;
                let even = Texture::create(stream)?;
                let odd = Texture::create(stream)?;
                Ok(Texture::Checker(CheckerTexture::new(even, odd, scale)))
            }
            Self::NOISE_TAG => {
                let scale = f32::decode(stream)?;
                let seed = u64::decode(stream)?;
                Ok(Texture::noise(scale, seed))
            }
            Self::IMAGE_TAG => Ok(Texture::Image(ImageTexture::deserialize(stream)?)),
            NULL_TAG => Err(Error::UnexpectedNull("texture")),
            _ => Err(Error::UnknownTypeTag {
                kind: "texture",
                tag,
            }),
        }
    }
}

impl From<Color> for Texture {
    fn from(color: Color) -> Self {
        Texture::Constant(color)
    }
}

impl Persist for Texture {
    fn type_tag(&self) -> i32 {
        match self {
            Texture::Constant(_) => Self::CONSTANT_TAG,
            Texture::Checker(_) => Self::CHECKER_TAG,
            Texture::Noise(_) => Self::NOISE_TAG,
            Texture::Image(_) => Self::IMAGE_TAG,
        }
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        match self {
            Texture::Constant(color) => color.encode(stream),
            Texture::Checker(checker) => {
                checker.scale.encode(stream)?;
                checker.even.serialize(stream)?;
                checker.odd.serialize(stream)
            }
            Texture::Noise(noise) => {
                noise.scale.encode(stream)?;
                noise.perlin.seed().encode(stream)
            }
            Texture::Image(image) => image.serialize_payload(stream),
        }
    }
}

/// 3D checker pattern alternating between two sub-textures.
#[derive(Debug, Clone)]
pub struct CheckerTexture {
    even: Box<Texture>,
    odd: Box<Texture>,
    scale: f32,
}

impl CheckerTexture {
    pub fn new(even: Texture, odd: Texture, scale: f32) -> Self {
        Self {
            even: Box::new(even),
            odd: Box::new(odd),
            scale,
        }
    }

    fn value(&self, u: f32, v: f32, p: Vec3) -> Color {
        let sines = (self.scale * p.x).sin() * (self.scale * p.y).sin() * (self.scale * p.z).sin();
        if sines < 0.0 {
            self.odd.value(u, v, p)
        } else {
            self.even.value(u, v, p)
        }
    }
}

/// Marble-like Perlin turbulence.
#[derive(Debug, Clone)]
pub struct NoiseTexture {
    perlin: Perlin,
    scale: f32,
}

impl NoiseTexture {
    pub fn new(scale: f32, seed: u64) -> Self {
        Self {
            perlin: Perlin::new(seed),
            scale,
        }
    }

    fn value(&self, p: Vec3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.perlin.turbulence(p, TURBULENCE_DEPTH);
        Vec3::ONE * 0.5 * (1.0 + phase.sin())
    }
}

/// Nearest-pixel lookup into a raw RGB8 buffer, row 0 at the top.
#[derive(Debug, Clone, Default)]
pub struct ImageTexture {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl ImageTexture {
    /// Wrap `width * height` RGB8 pixels.
    ///
    /// A buffer of the wrong size is rejected.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(Error::invalid(format!(
                "image {width}x{height} needs {expected} bytes, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn value(&self, u: f32, v: f32) -> Color {
        if self.data.is_empty() || self.width == 0 || self.height == 0 {
            return MISSING_TEXTURE_COLOR;
        }
        let nx = self.width as f32;
        let ny = self.height as f32;
        let i = ((u * nx) as i64).clamp(0, self.width as i64 - 1) as usize;
        let j = (((1.0 - v) * ny - 0.001) as i64).clamp(0, self.height as i64 - 1) as usize;

        let index = 3 * (i + self.width as usize * j);
        let r = self.data[index] as f32 / 255.0;
        let g = self.data[index + 1] as f32 / 255.0;
        let b = self.data[index + 2] as f32 / 255.0;
        Vec3::new(r, g, b)
    }

    fn serialize_payload(&self, stream: &mut Stream) -> Result<()> {
        self.width.encode(stream)?;
        self.height.encode(stream)?;
        let len = u32::try_from(self.data.len())
            .map_err(|_| Error::invalid("image buffer too large"))?;
        len.encode(stream)?;
        stream.write(&self.data)
    }

    fn deserialize(stream: &mut Stream) -> Result<Self> {
        let width = u32::decode(stream)?;
        let height = u32::decode(stream)?;
        let len = u32::decode(stream)?;
        if len > MAX_IMAGE_BYTES {
            return Err(Error::invalid(format!("image buffer of {len} bytes exceeds limit")));
        }
        if len as usize > stream.remaining() {
            return Err(Error::StreamOverrun {
                offset: stream.read_offset(),
                requested: len as usize,
                available: stream.remaining(),
            });
        }
        let mut data = vec![0u8; len as usize];
        stream.read(&mut data)?;
        if data.is_empty() {
            return Ok(Self {
                width,
                height,
                data,
            });
        }
        Self::new(width, height, data)
    }
}

impl From<ImageTexture> for Texture {
    fn from(image: ImageTexture) -> Self {
        Texture::Image(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::persist::to_stream;

    #[test]
    fn test_constant() {
        let tex = Texture::constant(Vec3::new(0.1, 0.2, 0.3));
        assert_eq!(tex.value(0.5, 0.5, Vec3::ZERO), Vec3::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_checker_alternates() {
        let tex = Texture::checker(Texture::constant(Vec3::ONE), Texture::constant(Vec3::ZERO));
        let even = tex.value(0.0, 0.0, Vec3::splat(0.05));
        // One coordinate shifted into the next cell flips the sign
        let odd = tex.value(0.0, 0.0, Vec3::new(0.05 + 0.314, 0.05, 0.05));
        assert_eq!(even, Vec3::ONE);
        assert_eq!(odd, Vec3::ZERO);
    }

    #[test]
    fn test_noise_in_unit_range() {
        let tex = Texture::noise(4.0, 99);
        for i in 0..200 {
            let p = Vec3::new(i as f32 * 0.11, 0.3, i as f32 * 0.05);
            let c = tex.value(0.0, 0.0, p);
            assert!(c.x >= 0.0 && c.x <= 1.0);
            assert_eq!(c.x, c.y);
        }
    }

    #[test]
    fn test_image_nearest_pixel() {
        // 2x2: top row red, green; bottom row blue, white
        let data = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        let tex: Texture = ImageTexture::new(2, 2, data).unwrap().into();
        assert_eq!(tex.value(0.25, 0.75, Vec3::ZERO), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(tex.value(0.75, 0.75, Vec3::ZERO), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(tex.value(0.25, 0.25, Vec3::ZERO), Vec3::new(0.0, 0.0, 1.0));
        // Out of range coordinates clamp to the border
        assert_eq!(tex.value(1.5, -0.5, Vec3::ZERO), Vec3::ONE);
    }

    #[test]
    fn test_empty_image_is_cyan() {
        let tex = Texture::Image(ImageTexture::default());
        assert_eq!(tex.value(0.5, 0.5, Vec3::ZERO), MISSING_TEXTURE_COLOR);
    }

    #[test]
    fn test_image_size_mismatch() {
        assert!(ImageTexture::new(2, 2, vec![0; 5]).is_err());
    }

    #[test]
    fn test_textures_survive_the_stream() {
        let textures = [
            Texture::constant(Vec3::new(0.2, 0.4, 0.6)),
            Texture::checker(Texture::constant(Vec3::ONE), Texture::noise(2.0, 5)),
            Texture::noise(3.0, 11),
            ImageTexture::new(1, 1, vec![10, 20, 30]).unwrap().into(),
        ];
        let p = Vec3::new(0.3, 0.7, -0.2);
        for tex in textures {
            let mut stream = to_stream(&tex, 1024).unwrap();
            let decoded = Texture::create(&mut stream).unwrap();
            assert_eq!(decoded.type_tag(), tex.type_tag());
            assert_eq!(decoded.value(0.4, 0.6, p), tex.value(0.4, 0.6, p));
            assert_eq!(stream.remaining(), 0);
        }
    }

    #[test]
    fn test_unknown_texture_tag() {
        let mut stream = Stream::create(8);
        42i32.encode(&mut stream).unwrap();
        assert!(matches!(
            Texture::create(&mut stream),
            Err(Error::UnknownTypeTag { kind: "texture", tag: 42 })
        ));
    }

    #[test]
    fn test_deeply_nested_checkers_are_rejected() {
        let levels = 10_000;
        let mut stream = Stream::create(levels * 8);
        for _ in 0..levels {
            Texture::CHECKER_TAG.encode(&mut stream).unwrap();
            1.0f32.encode(&mut stream).unwrap();
        }
        assert!(matches!(
            Texture::create(&mut stream),
            Err(Error::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_image_length_past_stream_end() {
        let mut stream = Stream::create(64);
        Texture::IMAGE_TAG.encode(&mut stream).unwrap();
        4u32.encode(&mut stream).unwrap();
        4u32.encode(&mut stream).unwrap();
        (1u32 << 29).encode(&mut stream).unwrap();
        stream.write(&[0; 12]).unwrap();
        assert!(matches!(
            Texture::create(&mut stream),
            Err(Error::StreamOverrun { requested, available: 12, .. }) if requested == 1 << 29
        ));
    }
}
