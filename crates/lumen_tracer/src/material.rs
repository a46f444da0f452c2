//! Materials: how light scatters from and is emitted by surfaces.

use crate::{
    hittable::HitRecord,
    sampling::{random_in_unit_sphere, reflect, refract, schlick},
    Pdf, Texture, UniformRng,
};
use lumen_core::{wire, Error, Persist, Result, Stream, Wire, NULL_TAG};
use lumen_math::{Ray, Vec3};
use std::f32::consts::PI;

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// How a scattered ray continues.
#[derive(Debug, Clone)]
pub enum ScatterKind {
    /// A single deterministic continuation (mirror, glass)
    Specular(Ray),
    /// A direction density to sample, possibly mixed with light sampling
    Diffuse(Pdf<'static>),
}

#[derive(Debug, Clone)]
pub struct ScatterRecord {
    pub attenuation: Color,
    pub kind: ScatterKind,
}

/// Lambertian (diffuse) material.
#[derive(Debug, Clone)]
pub struct Lambertian {
    pub albedo: Texture,
}

/// Metal (specular) material.
#[derive(Debug, Clone)]
pub struct Metal {
    pub albedo: Color,
    /// Roughness, 0.0 = perfect mirror, 1.0 = very rough
    pub fuzz: f32,
}

/// Dielectric (glass) material.
#[derive(Debug, Clone)]
pub struct Dielectric {
    /// Index of refraction
    pub ref_idx: f32,
}

/// Diffuse light emitter, visible from the side its normal points to.
#[derive(Debug, Clone)]
pub struct DiffuseLight {
    pub emit: Texture,
}

/// Phase function of a participating medium.
#[derive(Debug, Clone)]
pub struct Isotropic {
    pub albedo: Texture,
}

#[derive(Debug, Clone)]
pub enum Material {
    Lambertian(Lambertian),
    Metal(Metal),
    Dielectric(Dielectric),
    DiffuseLight(DiffuseLight),
    Isotropic(Isotropic),
}

impl Material {
    pub const LAMBERTIAN_TAG: i32 = 1;
    pub const METAL_TAG: i32 = 2;
    pub const DIELECTRIC_TAG: i32 = 3;
    pub const DIFFUSE_LIGHT_TAG: i32 = 4;
    pub const ISOTROPIC_TAG: i32 = 5;

    pub fn lambertian(albedo: impl Into<Texture>) -> Self {
        Material::Lambertian(Lambertian {
            albedo: albedo.into(),
        })
    }

    /// Fuzz values above 1 are clamped to 1.
    pub fn metal(albedo: Color, fuzz: f32) -> Self {
        Material::Metal(Metal {
            albedo,
            fuzz: fuzz.min(1.0),
        })
    }

    pub fn dielectric(ref_idx: f32) -> Self {
        Material::Dielectric(Dielectric { ref_idx })
    }

    pub fn diffuse_light(emit: impl Into<Texture>) -> Self {
        Material::DiffuseLight(DiffuseLight { emit: emit.into() })
    }

    pub fn isotropic(albedo: impl Into<Texture>) -> Self {
        Material::Isotropic(Isotropic {
            albedo: albedo.into(),
        })
    }

    /// Scatter an incoming ray.
    ///
    /// Returns `None` if the ray is absorbed.
    pub fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn UniformRng) -> Option<ScatterRecord> {
        match self {
            Material::Lambertian(m) => Some(ScatterRecord {
                attenuation: m.albedo.value(rec.u, rec.v, rec.p),
                kind: ScatterKind::Diffuse(Pdf::cosine(rec.normal)),
            }),
            Material::Metal(m) => {
                let reflected = reflect(ray_in.direction().normalize(), rec.normal);
                let direction = reflected + m.fuzz * random_in_unit_sphere(rng);
                if direction.dot(rec.normal) > 0.0 {
                    Some(ScatterRecord {
                        attenuation: m.albedo,
                        kind: ScatterKind::Specular(Ray::new(rec.p, direction, ray_in.time())),
                    })
                } else {
                    None
                }
            }
            Material::Dielectric(m) => Some(m.scatter(ray_in, rec, rng)),
            Material::DiffuseLight(_) => None,
            Material::Isotropic(m) => Some(ScatterRecord {
                attenuation: m.albedo.value(rec.u, rec.v, rec.p),
                kind: ScatterKind::Diffuse(Pdf::Uniform),
            }),
        }
    }

    /// Density this material assigns to the `scattered` direction.
    pub fn scattering_pdf(&self, _ray_in: &Ray, rec: &HitRecord, scattered: &Ray) -> f32 {
        match self {
            Material::Lambertian(_) => {
                let cosine = rec.normal.dot(scattered.direction().normalize());
                cosine.max(0.0) / PI
            }
            Material::Isotropic(_) => 1.0 / (4.0 * PI),
            _ => 0.0,
        }
    }

    /// Get emitted light from this material.
    ///
    /// Most materials return black (no emission).
    pub fn emitted(&self, ray_in: &Ray, rec: &HitRecord) -> Color {
        match self {
            Material::DiffuseLight(light) if rec.normal.dot(ray_in.direction()) < 0.0 => {
                light.emit.value(rec.u, rec.v, rec.p)
            }
            _ => Color::ZERO,
        }
    }

    pub fn is_emissive(&self) -> bool {
        matches!(self, Material::DiffuseLight(_))
    }

    /// Read a type tag and decode the material it names.
    pub fn create(stream: &mut Stream) -> Result<Material> {
        let tag = wire::read_tag(stream)?;
        match tag {
            Self::LAMBERTIAN_TAG => Ok(Material::lambertian(Texture::create(stream)?)),
            Self::METAL_TAG => {
                let albedo = Color::decode(stream)?;
                let fuzz = f32::decode(stream)?;
                Ok(Material::metal(albedo, fuzz))
            }
            Self::DIELECTRIC_TAG => Ok(Material::dielectric(f32::decode(stream)?)),
            Self::DIFFUSE_LIGHT_TAG => Ok(Material::diffuse_light(Texture::create(stream)?)),
            Self::ISOTROPIC_TAG => Ok(Material::isotropic(Texture::create(stream)?)),
            NULL_TAG => Err(Error::UnexpectedNull("material")),
            _ => Err(Error::UnknownTypeTag {
                kind: "material",
                tag,
            }),
        }
    }
}

impl Dielectric {
    fn scatter(&self, ray_in: &Ray, rec: &HitRecord, rng: &mut dyn UniformRng) -> ScatterRecord {
        let direction = ray_in.direction();
        let reflected = reflect(direction, rec.normal);
        let d_dot_n = direction.dot(rec.normal);

        let (outward_normal, ni_over_nt, cosine) = if d_dot_n > 0.0 {
            (-rec.normal, self.ref_idx, self.ref_idx * d_dot_n / direction.length())
        } else {
            (rec.normal, 1.0 / self.ref_idx, -d_dot_n / direction.length())
        };

        let next = match refract(direction, outward_normal, ni_over_nt) {
            Some(refracted) if rng.rand() >= schlick(cosine, self.ref_idx) => refracted,
            _ => reflected,
        };

        ScatterRecord {
            attenuation: Color::ONE,
            kind: ScatterKind::Specular(Ray::new(rec.p, next, ray_in.time())),
        }
    }
}

impl Persist for Material {
    fn type_tag(&self) -> i32 {
        match self {
            Material::Lambertian(_) => Self::LAMBERTIAN_TAG,
            Material::Metal(_) => Self::METAL_TAG,
            Material::Dielectric(_) => Self::DIELECTRIC_TAG,
            Material::DiffuseLight(_) => Self::DIFFUSE_LIGHT_TAG,
            Material::Isotropic(_) => Self::ISOTROPIC_TAG,
        }
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        match self {
            Material::Lambertian(m) => m.albedo.serialize(stream),
            Material::Metal(m) => {
                m.albedo.encode(stream)?;
                m.fuzz.encode(stream)
            }
            Material::Dielectric(m) => m.ref_idx.encode(stream),
            Material::DiffuseLight(m) => m.emit.serialize(stream),
            Material::Isotropic(m) => m.albedo.serialize(stream),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PcgRng;
    use lumen_core::persist::to_stream;

    fn record(normal: Vec3) -> HitRecord<'static> {
        HitRecord {
            t: 1.0,
            p: Vec3::ZERO,
            normal,
            material: None,
            u: 0.5,
            v: 0.5,
        }
    }

    #[test]
    fn test_lambertian_scatters_diffuse() {
        let mat = Material::lambertian(Vec3::new(0.2, 0.4, 0.6));
        let ray = Ray::new(Vec3::Y, -Vec3::Y, 0.0);
        let rec = record(Vec3::Y);
        let scatter = mat.scatter(&ray, &rec, &mut PcgRng::new(0, 0)).unwrap();
        assert_eq!(scatter.attenuation, Vec3::new(0.2, 0.4, 0.6));
        assert!(matches!(scatter.kind, ScatterKind::Diffuse(Pdf::Cosine(_))));

        let up = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        assert!((mat.scattering_pdf(&ray, &rec, &up) - 1.0 / PI).abs() < 1e-6);
        let down = Ray::new(Vec3::ZERO, -Vec3::Y, 0.0);
        assert_eq!(mat.scattering_pdf(&ray, &rec, &down), 0.0);
    }

    #[test]
    fn test_metal_mirror() {
        let mat = Material::metal(Vec3::ONE, 0.0);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), 0.25);
        let scatter = mat.scatter(&ray, &record(Vec3::Y), &mut PcgRng::new(0, 0)).unwrap();
        match scatter.kind {
            ScatterKind::Specular(out) => {
                let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
                assert!((out.direction() - expected).length() < 1e-5);
                assert_eq!(out.time(), 0.25);
            }
            other => panic!("expected specular, got {other:?}"),
        }
    }

    #[test]
    fn test_metal_fuzz_is_clamped() {
        match Material::metal(Vec3::ONE, 3.0) {
            Material::Metal(m) => assert_eq!(m.fuzz, 1.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_metal_absorbs_into_surface() {
        let mat = Material::metal(Vec3::ONE, 0.0);
        // Ray leaving the surface reflects into it
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), 0.0);
        assert!(mat.scatter(&ray, &record(Vec3::Y), &mut PcgRng::new(0, 0)).is_none());
    }

    #[test]
    fn test_dielectric_always_scatters_white() {
        let mat = Material::dielectric(1.5);
        let mut rng = PcgRng::new(8, 8);
        let ray = Ray::new(Vec3::Y, Vec3::new(0.3, -1.0, 0.0), 0.0);
        for _ in 0..100 {
            let scatter = mat.scatter(&ray, &record(Vec3::Y), &mut rng).unwrap();
            assert_eq!(scatter.attenuation, Vec3::ONE);
            assert!(matches!(scatter.kind, ScatterKind::Specular(_)));
        }
    }

    #[test]
    fn test_dielectric_total_internal_reflection() {
        let mat = Material::dielectric(1.5);
        // Grazing ray inside the glass: d.n > 0
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 0.1, 0.0), 0.0);
        let mut rng = PcgRng::new(2, 2);
        for _ in 0..20 {
            let scatter = mat.scatter(&ray, &record(Vec3::Y), &mut rng).unwrap();
            match scatter.kind {
                ScatterKind::Specular(out) => assert!(out.direction().y < 0.0),
                other => panic!("expected specular, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_diffuse_light_is_one_sided() {
        let light = Material::diffuse_light(Vec3::splat(4.0));
        let rec = record(-Vec3::Y);
        let from_below = Ray::new(-Vec3::Y, Vec3::Y, 0.0);
        let from_above = Ray::new(Vec3::Y, -Vec3::Y, 0.0);
        assert_eq!(light.emitted(&from_below, &rec), Vec3::splat(4.0));
        assert_eq!(light.emitted(&from_above, &rec), Vec3::ZERO);
        assert!(light.scatter(&from_below, &rec, &mut PcgRng::new(0, 0)).is_none());
    }

    #[test]
    fn test_isotropic_density() {
        let mat = Material::isotropic(Vec3::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);
        let rec = record(Vec3::X);
        let scatter = mat.scatter(&ray, &rec, &mut PcgRng::new(0, 0)).unwrap();
        assert!(matches!(scatter.kind, ScatterKind::Diffuse(Pdf::Uniform)));
        assert!((mat.scattering_pdf(&ray, &rec, &ray) - 1.0 / (4.0 * PI)).abs() < 1e-7);
    }

    #[test]
    fn test_materials_survive_the_stream() {
        let materials = [
            Material::lambertian(Texture::checker(Vec3::ONE.into(), Vec3::ZERO.into())),
            Material::metal(Vec3::new(0.8, 0.7, 0.6), 0.3),
            Material::dielectric(1.5),
            Material::diffuse_light(Vec3::splat(15.0)),
            Material::isotropic(Vec3::splat(0.5)),
        ];
        for (i, mat) in materials.iter().enumerate() {
            let mut stream = to_stream(mat, 256).unwrap();
            let decoded = Material::create(&mut stream).unwrap();
            assert_eq!(decoded.type_tag(), i as i32 + 1);
            let again = to_stream(&decoded, 256).unwrap();
            assert_eq!(again.as_bytes(), stream.as_bytes());
        }
    }

    #[test]
    fn test_unknown_material_tag() {
        let mut stream = Stream::create(8);
        77i32.encode(&mut stream).unwrap();
        assert!(matches!(
            Material::create(&mut stream),
            Err(Error::UnknownTypeTag { kind: "material", tag: 77 })
        ));
    }
}
