use crate::Vec3;

/// Orthonormal basis `(u, v, w)` built around a single direction.
///
/// Used to carry samples drawn in a canonical frame (`+z` up) onto a surface
/// normal or towards a light.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Onb {
    axis: [Vec3; 3],
}

impl Onb {
    /// Build a basis whose `w` axis is `n` normalized.
    ///
    /// The helper axis is `Y` when `n` is close to `X`, otherwise `X`.
    pub fn build_from_w(n: Vec3) -> Self {
        let w = n.normalize();
        let a = if w.x.abs() > 0.9 { Vec3::Y } else { Vec3::X };
        let v = w.cross(a).normalize();
        let u = w.cross(v);
        Self { axis: [u, v, w] }
    }

    #[inline]
    pub fn u(&self) -> Vec3 {
        self.axis[0]
    }

    #[inline]
    pub fn v(&self) -> Vec3 {
        self.axis[1]
    }

    #[inline]
    pub fn w(&self) -> Vec3 {
        self.axis[2]
    }

    /// Map local coordinates `(a.x, a.y, a.z)` to world space.
    #[inline]
    pub fn local(&self, a: Vec3) -> Vec3 {
        a.x * self.u() + a.y * self.v() + a.z * self.w()
    }
}

impl std::ops::Index<usize> for Onb {
    type Output = Vec3;

    fn index(&self, i: usize) -> &Vec3 {
        &self.axis[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_orthonormal(onb: &Onb) {
        for i in 0..3 {
            assert!((onb[i].length() - 1.0).abs() < 1e-5);
            for j in (i + 1)..3 {
                assert!(onb[i].dot(onb[j]).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_onb_orthonormal() {
        for n in [
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.3, -2.0, 0.7),
            Vec3::new(-0.95, 0.1, 0.0),
        ] {
            let onb = Onb::build_from_w(n);
            assert_orthonormal(&onb);
            assert!((onb.w() - n.normalize()).length() < 1e-6);
        }
    }

    #[test]
    fn test_onb_local_maps_z_to_w() {
        let onb = Onb::build_from_w(Vec3::new(0.0, 3.0, 0.0));
        let mapped = onb.local(Vec3::Z);
        assert!((mapped - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_onb_u_cross_v_is_along_w() {
        let onb = Onb::build_from_w(Vec3::new(0.2, 0.4, -0.9));
        assert!((onb.u().cross(onb.v()).dot(onb.w()).abs() - 1.0).abs() < 1e-5);
    }
}
