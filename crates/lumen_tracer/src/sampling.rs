//! Direction and point sampling routines built on [`UniformRng`].

use crate::UniformRng;
use lumen_math::Vec3;
use std::f32::consts::PI;

/// Uniformly distributed direction on the unit sphere.
pub fn random_in_unit_sphere(rng: &mut dyn UniformRng) -> Vec3 {
    let phi = rng.rand() * 2.0 * PI;
    let z = 1.0 - 2.0 * rng.rand();
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * phi.cos(), r * phi.sin(), z)
}

/// Uniformly distributed point in the unit disk on the `z = 0` plane.
pub fn random_in_unit_disk(rng: &mut dyn UniformRng) -> Vec3 {
    let r = rng.rand().sqrt();
    let theta = rng.rand() * 2.0 * PI;
    Vec3::new(r * theta.cos(), r * theta.sin(), 0.0)
}

/// Cosine-weighted direction on the `+z` hemisphere.
pub fn random_cosine_direction(rng: &mut dyn UniformRng) -> Vec3 {
    let r1 = rng.rand();
    let r2 = rng.rand();
    let z = (1.0 - r2).sqrt();
    let phi = 2.0 * PI * r1;
    let x = phi.cos() * r2.sqrt();
    let y = phi.sin() * r2.sqrt();
    Vec3::new(x, y, z)
}

/// Direction inside the cone subtended by a sphere of `radius` seen from
/// `dist_squared` away, around `+z`.
pub fn random_to_sphere(radius: f32, dist_squared: f32, rng: &mut dyn UniformRng) -> Vec3 {
    let r1 = rng.rand();
    let r2 = rng.rand();
    let cos_theta_max = (1.0 - radius * radius / dist_squared).max(0.0).sqrt();
    let z = 1.0 + r2 * (cos_theta_max - 1.0);
    let phi = 2.0 * PI * r1;
    let sin_theta = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(phi.cos() * sin_theta, phi.sin() * sin_theta, z)
}

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract `v` through a surface with normal `n` (pointing to the incident
/// side). Returns `None` on total internal reflection.
#[inline]
pub fn refract(v: Vec3, n: Vec3, ni_over_nt: f32) -> Option<Vec3> {
    let uv = v.normalize();
    let dt = uv.dot(n);
    let discriminant = 1.0 - ni_over_nt * ni_over_nt * (1.0 - dt * dt);
    if discriminant > 0.0 {
        Some(ni_over_nt * (uv - n * dt) - n * discriminant.sqrt())
    } else {
        None
    }
}

/// Schlick's approximation for reflectance
#[inline]
pub fn schlick(cosine: f32, ref_idx: f32) -> f32 {
    let r0 = ((1.0 - ref_idx) / (1.0 + ref_idx)).powi(2);
    r0 + (1.0 - r0) * (1.0 - cosine).powi(5)
}
