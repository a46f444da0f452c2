use crate::Vec3;
use glam::Mat4;

/// A ray in 3D space with origin, direction, and time.
///
/// The direction is not normalized; the parametric distance `t` returned by
/// intersection queries is measured in units of `direction`. The `time`
/// field selects the instant of a motion-blurred scene the ray samples.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    pub time: f32,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Get the point along the ray at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The same ray with its origin shifted by `-offset`.
    ///
    /// Used to move a world-space ray into the space of a translated child.
    pub fn shifted(&self, offset: Vec3) -> Ray {
        Ray::new(self.origin - offset, self.direction, self.time)
    }

    /// Transform origin (as a point) and direction (as a vector) by `m`.
    pub fn transformed(&self, m: &Mat4) -> Ray {
        Ray::new(
            m.transform_point3(self.origin),
            m.transform_vector3(self.direction),
            self.time,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_shifted_keeps_direction_and_time() {
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::Y, 0.25);
        let moved = ray.shifted(Vec3::new(1.0, 1.0, 1.0));

        assert_eq!(moved.origin, Vec3::new(0.0, 1.0, 2.0));
        assert_eq!(moved.direction, Vec3::Y);
        assert_eq!(moved.time, 0.25);
    }

    #[test]
    fn test_ray_transformed_ignores_translation_for_direction() {
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z, 0.0).transformed(&m);

        assert_eq!(ray.origin, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(ray.direction, Vec3::Z);
    }
}
