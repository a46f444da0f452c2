//! Perlin gradient noise with turbulence.
//!
//! Tables are generated from a seed so a noise texture can be rebuilt
//! identically from its serialized parameters.

use crate::{rng::PcgRng, sampling::random_in_unit_sphere, UniformRng};
use lumen_math::Vec3;

const POINT_COUNT: usize = 256;

/// Default octave count for [`Perlin::turbulence`].
pub const TURBULENCE_DEPTH: u32 = 7;

#[derive(Debug, Clone)]
pub struct Perlin {
    seed: u64,
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(seed: u64) -> Self {
        let mut rng = PcgRng::new(seed, 0x5eed);
        let gradients = (0..POINT_COUNT)
            .map(|_| random_in_unit_sphere(&mut rng))
            .collect();
        let perm_x = Self::generate_perm(&mut rng);
        let perm_y = Self::generate_perm(&mut rng);
        let perm_z = Self::generate_perm(&mut rng);
        Self {
            seed,
            gradients,
            perm_x,
            perm_y,
            perm_z,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fisher-Yates shuffle of `0..POINT_COUNT`.
    fn generate_perm(rng: &mut dyn UniformRng) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..POINT_COUNT).collect();
        for i in (1..POINT_COUNT).rev() {
            let target = ((rng.rand() * (i + 1) as f32) as usize).min(i);
            perm.swap(i, target);
        }
        perm
    }

    /// Smoothed gradient noise in roughly `[-1, 1]`.
    pub fn noise(&self, p: Vec3) -> f32 {
        let f = p - p.floor();
        let cell = p.floor();

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, value) in row.iter_mut().enumerate() {
                    let ix = self.perm_x[(cell.x as i64 + di as i64) as usize & 255];
                    let iy = self.perm_y[(cell.y as i64 + dj as i64) as usize & 255];
                    let iz = self.perm_z[(cell.z as i64 + dk as i64) as usize & 255];
                    *value = self.gradients[ix ^ iy ^ iz];
                }
            }
        }

        perlin_interp(&c, f)
    }

    /// Sum of `depth` noise octaves with halving weight.
    pub fn turbulence(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

/// Trilinear blend of corner gradients with Hermite smoothing.
fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], f: Vec3) -> f32 {
    let s = f * f * (Vec3::splat(3.0) - 2.0 * f);
    let mut accum = 0.0;

    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight = f - Vec3::new(fi, fj, fk);
                accum += (fi * s.x + (1.0 - fi) * (1.0 - s.x))
                    * (fj * s.y + (1.0 - fj) * (1.0 - s.y))
                    * (fk * s.z + (1.0 - fk) * (1.0 - s.z))
                    * gradient.dot(weight);
            }
        }
    }

    accum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_noise() {
        let a = Perlin::new(17);
        let b = Perlin::new(17);
        let p = Vec3::new(1.3, -2.7, 0.4);
        assert_eq!(a.noise(p), b.noise(p));
        assert_eq!(a.turbulence(p, TURBULENCE_DEPTH), b.turbulence(p, TURBULENCE_DEPTH));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = Perlin::new(1);
        let b = Perlin::new(2);
        let differs = (0..16).any(|i| {
            let p = Vec3::new(i as f32 * 0.37, 0.5, 0.25);
            a.noise(p) != b.noise(p)
        });
        assert!(differs);
    }

    #[test]
    fn test_noise_is_bounded() {
        let perlin = Perlin::new(3);
        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.13, i as f32 * -0.07, i as f32 * 0.29);
            let n = perlin.noise(p);
            assert!(n.abs() <= 1.8, "noise {n} at {p}");
            assert!(perlin.turbulence(p, TURBULENCE_DEPTH) >= 0.0);
        }
    }

    #[test]
    fn test_noise_vanishes_on_lattice() {
        let perlin = Perlin::new(4);
        assert!(perlin.noise(Vec3::new(3.0, -2.0, 5.0)).abs() < 1e-6);
    }

    #[test]
    fn test_permutations_are_permutations() {
        let perlin = Perlin::new(5);
        let mut sorted = perlin.perm_x.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..POINT_COUNT).collect::<Vec<_>>());
    }
}
