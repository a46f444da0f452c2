// Transform utilities for Mat4
//
// Extends glam::Mat4 with the bounding-box helper the instancing wrappers need.
// glam::Mat4 already provides transform_point3(), transform_vector3() and inverse().

use crate::Aabb;
use glam::{Mat4, Vec3};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        aabb.corners()
            .iter()
            .map(|&corner| self.transform_point3(corner))
            .fold(
                Aabb::new(Vec3::splat(f32::MAX), Vec3::splat(-f32::MAX)),
                |acc, p| Aabb::new(acc.min.min(p), acc.max.max(p)),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_transform_aabb_identity() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let transformed = Mat4::IDENTITY.transform_aabb(&aabb);

        assert!((transformed.min - aabb.min).length() < 0.001);
        assert!((transformed.max - aabb.max).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let mat = Mat4::from_translation(Vec3::new(5.0, 5.0, 5.0));
        let transformed = mat.transform_aabb(&Aabb::new(Vec3::ZERO, Vec3::ONE));

        assert!((transformed.min - Vec3::splat(5.0)).length() < 0.001);
        assert!((transformed.max - Vec3::splat(6.0)).length() < 0.001);
    }

    #[test]
    fn test_transform_aabb_rotation_y() {
        // A unit cube rotated 45 degrees about Y widens to sqrt(2) in x and z
        let mat = Mat4::from_rotation_y(PI / 4.0);
        let transformed = mat.transform_aabb(&Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)));
        let half_diag = 0.5 * 2.0f32.sqrt();

        assert!((transformed.max.x - half_diag).abs() < 0.001);
        assert!((transformed.max.z - half_diag).abs() < 0.001);
        assert!((transformed.max.y - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_mat4_rotation_inverse() {
        let mat = Mat4::from_rotation_y(PI / 4.0);
        let inv = mat.inverse();

        let point = Vec3::new(5.0, 3.0, 2.0);
        let back = inv.transform_point3(mat.transform_point3(point));

        assert!((back - point).length() < 0.001);
    }
}
