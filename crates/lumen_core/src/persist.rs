//! Node-level encoding for the scene graph.
//!
//! A node is written as `[i32 type tag][payload][owned children]`. Decoding is
//! done by per-hierarchy factories that read the tag and dispatch, so this
//! trait only covers the write side.

use crate::{Result, Stream, Wire, NULL_TAG};

/// A scene-graph node that can be written to a [`Stream`].
pub trait Persist {
    /// Stable identifier of the concrete node kind within its hierarchy.
    fn type_tag(&self) -> i32;

    /// Write the tag, the node's own fields, then its owned children.
    fn serialize(&self, stream: &mut Stream) -> Result<()>;

    fn write_tag(&self, stream: &mut Stream) -> Result<()> {
        self.type_tag().encode(stream)
    }
}

/// Write `node`, or the null tag when it is absent.
pub fn serialize_optional<T: Persist>(node: Option<&T>, stream: &mut Stream) -> Result<()> {
    match node {
        Some(node) => node.serialize(stream),
        None => NULL_TAG.encode(stream),
    }
}

/// Serialize `node` into an owned stream of `capacity` bytes.
pub fn to_stream<T: Persist>(node: &T, capacity: usize) -> Result<Stream<'static>> {
    let mut stream = Stream::create(capacity);
    node.serialize(&mut stream)?;
    Ok(stream)
}
