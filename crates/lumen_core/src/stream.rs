//! In-memory byte stream for scene (de)serialization.
//!
//! One contiguous buffer with a write cursor and an independent read cursor.
//! The buffer is either owned (allocated by [`Stream::create`]) or borrowed
//! from the caller, e.g. a staging buffer shared with a device.

use crate::{Error, Result};

/// Deepest node nesting a decoder will follow before giving up.
pub const MAX_DECODE_DEPTH: usize = 64;

enum Buffer<'a> {
    Owned(Vec<u8>),
    Borrowed(&'a mut [u8]),
}

impl Buffer<'_> {
    fn bytes(&self) -> &[u8] {
        match self {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s,
        }
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        match self {
            Buffer::Owned(v) => v,
            Buffer::Borrowed(s) => s,
        }
    }
}

/// Sequential byte stream with independent read and write cursors.
///
/// Every call either transfers all requested bytes or fails with
/// [`Error::StreamOverrun`] and leaves both cursors where they were.
/// Reads never go past the write cursor.
pub struct Stream<'a> {
    buffer: Buffer<'a>,
    write_offset: usize,
    read_offset: usize,
    depth: usize,
}

impl Stream<'static> {
    /// Allocate an owned, zero-filled stream of `size` bytes.
    pub fn create(size: usize) -> Self {
        Self {
            buffer: Buffer::Owned(vec![0; size]),
            write_offset: 0,
            read_offset: 0,
            depth: 0,
        }
    }
}

impl<'a> Stream<'a> {
    /// Wrap an external buffer for writing; both cursors start at zero.
    pub fn borrowed(buffer: &'a mut [u8]) -> Self {
        Self {
            buffer: Buffer::Borrowed(buffer),
            write_offset: 0,
            read_offset: 0,
            depth: 0,
        }
    }

    /// Wrap an external buffer that already holds serialized data.
    ///
    /// The whole slice is readable; nothing more can be written.
    pub fn filled(buffer: &'a mut [u8]) -> Self {
        let len = buffer.len();
        Self {
            buffer: Buffer::Borrowed(buffer),
            write_offset: len,
            read_offset: 0,
            depth: 0,
        }
    }

    /// Append `data` at the write cursor.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        let capacity = self.capacity();
        let end = self.write_offset.checked_add(data.len());
        match end {
            Some(end) if end <= capacity => {
                self.buffer.bytes_mut()[self.write_offset..end].copy_from_slice(data);
                self.write_offset = end;
                Ok(())
            }
            _ => Err(Error::StreamOverrun {
                offset: self.write_offset,
                requested: data.len(),
                available: capacity - self.write_offset,
            }),
        }
    }

    /// Fill `out` from the read cursor.
    pub fn read(&mut self, out: &mut [u8]) -> Result<()> {
        let end = self.read_offset.checked_add(out.len());
        match end {
            Some(end) if end <= self.write_offset => {
                out.copy_from_slice(&self.buffer.bytes()[self.read_offset..end]);
                self.read_offset = end;
                Ok(())
            }
            _ => Err(Error::StreamOverrun {
                offset: self.read_offset,
                requested: out.len(),
                available: self.write_offset - self.read_offset,
            }),
        }
    }

    /// Total size of the underlying buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.bytes().len()
    }

    pub fn write_offset(&self) -> usize {
        self.write_offset
    }

    pub fn read_offset(&self) -> usize {
        self.read_offset
    }

    /// Bytes written but not yet read.
    pub fn remaining(&self) -> usize {
        self.write_offset - self.read_offset
    }

    /// The written prefix of the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer.bytes()[..self.write_offset]
    }

    /// Run `decode` one nesting level deeper.
    ///
    /// Factories for recursive node types decode through this so a corrupt
    /// stream of nested tags fails with [`Error::InvalidPayload`] instead of
    /// exhausting the call stack.
    pub fn nested<T>(&mut self, decode: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DECODE_DEPTH {
            return Err(Error::invalid(format!(
                "nesting deeper than {MAX_DECODE_DEPTH} at offset {}",
                self.read_offset
            )));
        }
        self.depth += 1;
        let result = decode(self);
        self.depth -= 1;
        result
    }

    /// Move the read cursor back to the start.
    pub fn rewind(&mut self) {
        self.read_offset = 0;
    }

    /// Forget everything written so far.
    pub fn clear(&mut self) {
        self.write_offset = 0;
        self.read_offset = 0;
    }

    /// Consume the stream, returning the written bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        let written = self.write_offset;
        match self.buffer {
            Buffer::Owned(mut v) => {
                v.truncate(written);
                v
            }
            Buffer::Borrowed(s) => s[..written].to_vec(),
        }
    }
}

impl std::fmt::Debug for Stream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stream")
            .field("capacity", &self.capacity())
            .field("write_offset", &self.write_offset)
            .field("read_offset", &self.read_offset)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_write_then_read() {
        let mut stream = Stream::create(8);
        stream.write(&[1, 2, 3]).unwrap();
        stream.write(&[4]).unwrap();

        let mut out = [0u8; 4];
        stream.read(&mut out).unwrap();
        assert_eq!(out, [1, 2, 3, 4]);
        assert_eq!(stream.remaining(), 0);
    }

    #[test]
    fn test_stream_write_overrun_keeps_cursor() {
        let mut stream = Stream::create(4);
        stream.write(&[1, 2, 3]).unwrap();

        let err = stream.write(&[4, 5]).unwrap_err();
        assert!(matches!(
            err,
            Error::StreamOverrun {
                offset: 3,
                requested: 2,
                available: 1
            }
        ));
        assert_eq!(stream.write_offset(), 3);

        // The remaining byte is still usable
        stream.write(&[4]).unwrap();
        assert_eq!(stream.as_bytes(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_stream_read_stops_at_write_cursor() {
        let mut stream = Stream::create(16);
        stream.write(&[9, 9]).unwrap();

        let mut out = [0u8; 3];
        assert!(stream.read(&mut out).is_err());
        assert_eq!(stream.read_offset(), 0);

        let mut out = [0u8; 2];
        stream.read(&mut out).unwrap();
        assert_eq!(out, [9, 9]);
    }

    #[test]
    fn test_stream_borrowed_buffer() {
        let mut backing = [0u8; 4];
        {
            let mut stream = Stream::borrowed(&mut backing);
            stream.write(&[7, 8]).unwrap();
            assert_eq!(stream.capacity(), 4);
        }
        assert_eq!(backing, [7, 8, 0, 0]);

        let mut stream = Stream::filled(&mut backing);
        assert!(stream.write(&[1]).is_err());
        let mut out = [0u8; 4];
        stream.read(&mut out).unwrap();
        assert_eq!(out, [7, 8, 0, 0]);
    }

    #[test]
    fn test_stream_rewind_and_into_bytes() {
        let mut stream = Stream::create(8);
        stream.write(&[1, 2]).unwrap();

        let mut out = [0u8; 2];
        stream.read(&mut out).unwrap();
        stream.rewind();
        stream.read(&mut out).unwrap();
        assert_eq!(out, [1, 2]);

        assert_eq!(stream.into_bytes(), vec![1, 2]);
    }

    #[test]
    fn test_stream_zero_sized() {
        let mut stream = Stream::create(0);
        assert!(stream.write(&[]).is_ok());
        assert!(stream.write(&[1]).is_err());
    }

    fn decode_chain(stream: &mut Stream, levels: usize) -> Result<usize> {
        if levels == 0 {
            return Ok(0);
        }
        stream.nested(|s| decode_chain(s, levels - 1).map(|n| n + 1))
    }

    #[test]
    fn test_stream_nesting_limit() {
        let mut stream = Stream::create(0);
        assert_eq!(decode_chain(&mut stream, MAX_DECODE_DEPTH).unwrap(), MAX_DECODE_DEPTH);
        assert!(matches!(
            decode_chain(&mut stream, MAX_DECODE_DEPTH + 1),
            Err(Error::InvalidPayload(_))
        ));

        // Depth unwinds after a failure
        assert_eq!(decode_chain(&mut stream, 3).unwrap(), 3);
    }
}
