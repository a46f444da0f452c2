//! Lumen math - vector, ray and bounding-volume types shared by the tracer.
//!
//! Vector arithmetic comes straight from `glam`; this crate adds the
//! ray-tracing specific types on top of it.

// Re-export glam for convenience
pub use glam::*;

// Lumen math types
mod aabb;
mod interval;
mod onb;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;
pub use transform::Mat4Ext;
