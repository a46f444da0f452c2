//! Lumen Core - error types and the binary stream used to move scene graphs.
//!
//! This crate provides:
//!
//! - **`Error` / `Result`**: the failure taxonomy shared by every lumen crate
//! - **`Stream`**: a byte buffer with independent read and write cursors
//! - **`Wire`**: fixed little-endian encoding of scalars, vectors and boxes
//! - **`Persist`**: tagged encoding of scene-graph nodes
//!
//! # Example
//!
//! ```
//! use lumen_core::{Stream, Wire};
//! use lumen_math::Vec3;
//!
//! let mut stream = Stream::create(64);
//! Vec3::new(1.0, 2.0, 3.0).encode(&mut stream)?;
//! assert_eq!(Vec3::decode(&mut stream)?, Vec3::new(1.0, 2.0, 3.0));
//! # Ok::<(), lumen_core::Error>(())
//! ```

pub mod error;
pub mod persist;
pub mod stream;
pub mod wire;

// Re-export commonly used types
pub use error::{Error, Result};
pub use persist::Persist;
pub use stream::{Stream, MAX_DECODE_DEPTH};
pub use wire::{Wire, NULL_TAG};
