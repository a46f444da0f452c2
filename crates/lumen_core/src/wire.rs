//! Fixed-layout encoding of plain values.
//!
//! Everything is little-endian regardless of the host so a scene written on
//! one machine can be read on another (or on a device).

use byteorder::{ByteOrder, LittleEndian};
use lumen_math::{Aabb, Vec2, Vec3};

use crate::{Error, Result, Stream};

/// Tag written in place of an absent optional child, in every node hierarchy.
pub const NULL_TAG: i32 = -1;

/// Largest element count accepted when decoding a length-prefixed sequence.
const MAX_SEQUENCE_LEN: u32 = 1 << 28;

/// A value with a fixed binary layout.
pub trait Wire: Sized {
    fn encode(&self, stream: &mut Stream) -> Result<()>;
    fn decode(stream: &mut Stream) -> Result<Self>;
}

macro_rules! wire_scalar {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl Wire for $ty {
            fn encode(&self, stream: &mut Stream) -> Result<()> {
                let mut buf = [0u8; $size];
                LittleEndian::$write(&mut buf, *self);
                stream.write(&buf)
            }

            fn decode(stream: &mut Stream) -> Result<Self> {
                let mut buf = [0u8; $size];
                stream.read(&mut buf)?;
                Ok(LittleEndian::$read(&buf))
            }
        }
    };
}

wire_scalar!(i32, 4, write_i32, read_i32);
wire_scalar!(u32, 4, write_u32, read_u32);
wire_scalar!(f32, 4, write_f32, read_f32);
wire_scalar!(u64, 8, write_u64, read_u64);

impl Wire for u8 {
    fn encode(&self, stream: &mut Stream) -> Result<()> {
        stream.write(&[*self])
    }

    fn decode(stream: &mut Stream) -> Result<Self> {
        let mut buf = [0u8; 1];
        stream.read(&mut buf)?;
        Ok(buf[0])
    }
}

impl Wire for Vec2 {
    fn encode(&self, stream: &mut Stream) -> Result<()> {
        self.x.encode(stream)?;
        self.y.encode(stream)
    }

    fn decode(stream: &mut Stream) -> Result<Self> {
        Ok(Vec2::new(f32::decode(stream)?, f32::decode(stream)?))
    }
}

impl Wire for Vec3 {
    fn encode(&self, stream: &mut Stream) -> Result<()> {
        self.x.encode(stream)?;
        self.y.encode(stream)?;
        self.z.encode(stream)
    }

    fn decode(stream: &mut Stream) -> Result<Self> {
        Ok(Vec3::new(
            f32::decode(stream)?,
            f32::decode(stream)?,
            f32::decode(stream)?,
        ))
    }
}

impl Wire for Aabb {
    fn encode(&self, stream: &mut Stream) -> Result<()> {
        self.min.encode(stream)?;
        self.max.encode(stream)
    }

    fn decode(stream: &mut Stream) -> Result<Self> {
        let min = Vec3::decode(stream)?;
        let max = Vec3::decode(stream)?;
        Ok(Aabb::new(min, max))
    }
}

/// Write a `u32` element count followed by each element.
pub fn encode_slice<T: Wire>(items: &[T], stream: &mut Stream) -> Result<()> {
    let len = u32::try_from(items.len())
        .map_err(|_| Error::invalid(format!("sequence of {} elements is too long", items.len())))?;
    len.encode(stream)?;
    items.iter().try_for_each(|item| item.encode(stream))
}

/// Read a sequence written by [`encode_slice`].
pub fn decode_vec<T: Wire>(stream: &mut Stream) -> Result<Vec<T>> {
    let len = u32::decode(stream)?;
    if len > MAX_SEQUENCE_LEN {
        return Err(Error::invalid(format!("sequence length {len} exceeds limit")));
    }
    (0..len).map(|_| T::decode(stream)).collect()
}

/// Read a leading type tag.
pub fn read_tag(stream: &mut Stream) -> Result<i32> {
    i32::decode(stream)
}
