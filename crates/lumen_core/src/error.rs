//! Error types for lumen.

use thiserror::Error;

/// Main error type for scene construction and (de)serialization.
///
/// Ray misses are not errors; intersection code reports them as `false`.
#[derive(Error, Debug)]
pub enum Error {
    /// A read or write would run past the end of the stream buffer
    #[error("Stream overrun: {requested} bytes requested at offset {offset}, {available} available")]
    StreamOverrun {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// Factory dispatch found a tag it does not know
    #[error("Unknown {kind} type tag: {tag}")]
    UnknownTypeTag { kind: &'static str, tag: i32 },

    /// The null tag appeared where a node is required
    #[error("Unexpected null {0} in stream")]
    UnexpectedNull(&'static str),

    /// Decoded values violate an invariant of the node being rebuilt
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// A light-sampling PDF was decoded without a primitive to point at
    #[error("Hitable PDF has no target primitive to bind")]
    UnboundPdfTarget,

    /// A BVH was requested over zero primitives
    #[error("Cannot build a BVH over an empty primitive list")]
    EmptyBvh,

    /// A primitive without a bounding box was handed to a BVH
    #[error("Primitive has no bounding box")]
    Unbounded,
}

impl Error {
    /// Create an invalid payload error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}

/// Result type alias for lumen operations.
pub type Result<T> = std::result::Result<T, Error>;
