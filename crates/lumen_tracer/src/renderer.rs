//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Recursive ray tracing with configurable depth
//! - Light importance sampling mixed with the material density
//! - Gamma correction
//! - Anti-aliasing via multi-sampling

use crate::{
    bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE},
    Camera, Color, HitRecord, Hittable, PcgRng, Pdf, ScatterKind, Scene, UniformRng,
};
use lumen_math::{Interval, Ray};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Errors surfaced by the rendering front end.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Invalid render config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Scene error: {0}")]
    Scene(#[from] lumen_core::Error),

    #[error("Render cancelled")]
    Cancelled,
}

/// Light arriving along rays that leave the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ambient {
    Constant(Color),
    /// White at the horizon blending to blue overhead
    Sky,
}

impl Ambient {
    pub fn emitted(&self, ray: &Ray) -> Color {
        match self {
            Ambient::Constant(color) => *color,
            Ambient::Sky => sky_gradient(ray),
        }
    }
}

impl Default for Ambient {
    fn default() -> Self {
        Ambient::Constant(Color::ZERO)
    }
}

/// Where pixels are computed.
///
/// A device backend consumes the scene as a serialized stream instead; see
/// [`Scene::serialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Everything on the calling thread
    Serial,
    /// Buckets spread over the rayon thread pool
    #[default]
    Parallel,
}

/// Render configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Samples per pixel for anti-aliasing
    pub samples_per_pixel: u32,
    /// Maximum ray bounce depth
    pub max_depth: u32,
    /// Color of rays that escape the scene
    pub ambient: Ambient,
    /// Base seed; every pixel derives its own stream from it
    pub seed: u64,
    pub backend: Backend,
    pub bucket_size: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 100,
            max_depth: 50,
            ambient: Ambient::default(),
            seed: 0,
            backend: Backend::default(),
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, RenderError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Compute the color seen by a ray.
///
/// Emission plus scattered light. Diffuse bounces sample a 50/50 mixture of
/// the scene lights and the material density when the scene has lights.
pub fn ray_color(
    ray: &Ray,
    scene: &Scene,
    depth: u32,
    config: &RenderConfig,
    rng: &mut dyn UniformRng,
) -> Color {
    // If we've exceeded max depth, return black (no light)
    if depth == 0 {
        return Color::ZERO;
    }

    let mut rec = HitRecord::default();
    if !scene.world.hit(ray, Interval::FORWARD, &mut rec, rng) {
        return config.ambient.emitted(ray);
    }
    let Some(material) = rec.material else {
        return Color::ZERO;
    };

    let emitted = material.emitted(ray, &rec);
    let Some(scatter) = material.scatter(ray, &rec, rng) else {
        return emitted;
    };

    match scatter.kind {
        ScatterKind::Specular(specular) => {
            emitted + scatter.attenuation * ray_color(&specular, scene, depth - 1, config, rng)
        }
        ScatterKind::Diffuse(material_pdf) => {
            let pdf = match &scene.lights {
                Some(lights) => Pdf::mixture(Pdf::hitable(lights, rec.p), material_pdf),
                None => material_pdf,
            };
            let direction = pdf.generate(rng);
            let pdf_value = pdf.value(direction, rng);
            if pdf_value <= 0.0 {
                return emitted;
            }

            let scattered = Ray::new(rec.p, direction, ray.time());
            let scattering_pdf = material.scattering_pdf(ray, &rec, &scattered);
            let incoming = ray_color(&scattered, scene, depth - 1, config, rng);
            emitted + scatter.attenuation * scattering_pdf * incoming / pdf_value
        }
    }
}

/// Compute sky gradient background.
fn sky_gradient(ray: &Ray) -> Color {
    let unit_direction = ray.direction().normalize();
    let a = 0.5 * (unit_direction.y + 1.0);
    let white = Color::new(1.0, 1.0, 1.0);
    let blue = Color::new(0.5, 0.7, 1.0);
    white * (1.0 - a) + blue * a
}

/// Replace NaN channels so one bad sample cannot poison a pixel.
#[inline]
fn de_nan(color: Color) -> Color {
    Color::new(
        if color.x.is_nan() { 0.0 } else { color.x },
        if color.y.is_nan() { 0.0 } else { color.y },
        if color.z.is_nan() { 0.0 } else { color.z },
    )
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    // Apply gamma correction and convert to 0-255
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Render a single pixel with multi-sampling.
///
/// The pixel owns its random stream, so the result does not depend on
/// which thread renders it or in what order.
pub fn render_pixel(camera: &Camera, scene: &Scene, x: u32, y: u32, config: &RenderConfig) -> Color {
    let pixel_index = y as u64 * camera.image_width as u64 + x as u64;
    let mut rng = PcgRng::new(config.seed, pixel_index);
    let samples = config.samples_per_pixel.max(1);

    let mut pixel_color = Color::ZERO;
    for _ in 0..samples {
        let ray = camera.get_pixel_ray(x, y, &mut rng);
        pixel_color += de_nan(ray_color(&ray, scene, config.max_depth, config, &mut rng));
    }

    // Average the samples
    pixel_color / samples as f32
}

/// Simple image buffer for storing render output.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Copy a finished bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (i, color) in result.pixels.iter().enumerate() {
            let local_x = i as u32 % bucket.width;
            let local_y = i as u32 / bucket.width;
            self.set(bucket.x + local_x, bucket.y + local_y, *color);
        }
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|color| color_to_rgba(*color))
            .collect()
    }

    /// Encode as a binary PPM (P6).
    pub fn to_ppm(&self) -> Vec<u8> {
        let mut bytes = format!("P6\n{} {}\n255\n", self.width, self.height).into_bytes();
        bytes.reserve(self.pixels.len() * 3);
        for color in &self.pixels {
            let [r, g, b, _] = color_to_rgba(*color);
            bytes.extend_from_slice(&[r, g, b]);
        }
        bytes
    }
}

/// Render the entire scene to an image buffer.
///
/// `cancel` is polled before each bucket; once set, remaining buckets are
/// skipped and the render fails with [`RenderError::Cancelled`].
pub fn render(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    cancel: &AtomicBool,
) -> Result<ImageBuffer, RenderError> {
    let buckets = generate_buckets(camera.image_width, camera.image_height, config.bucket_size.max(1));
    log::info!(
        "Rendering {}x{} at {} spp, {} buckets ({:?})",
        camera.image_width,
        camera.image_height,
        config.samples_per_pixel,
        buckets.len(),
        config.backend
    );
    let start = std::time::Instant::now();

    let render_one = |bucket: &Bucket| -> Option<BucketResult> {
        if cancel.load(Ordering::Relaxed) {
            return None;
        }
        Some(BucketResult::new(*bucket, render_bucket(bucket, camera, scene, config)))
    };

    let results: Option<Vec<BucketResult>> = match config.backend {
        Backend::Serial => buckets.iter().map(render_one).collect(),
        Backend::Parallel => buckets.par_iter().map(render_one).collect(),
    };
    let Some(results) = results else {
        log::info!("Render cancelled after {:.2?}", start.elapsed());
        return Err(RenderError::Cancelled);
    };

    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
    for result in &results {
        image.write_bucket(result);
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Material, Sphere};
    use lumen_math::Vec3;

    fn small_config() -> RenderConfig {
        RenderConfig {
            samples_per_pixel: 4,
            max_depth: 5,
            ambient: Ambient::Constant(Color::new(0.5, 0.7, 1.0)),
            seed: 7,
            backend: Backend::Serial,
            bucket_size: 4,
        }
    }

    fn sphere_scene() -> Scene {
        Scene::new(
            Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, Material::lambertian(Color::splat(0.5))),
            None,
        )
    }

    #[test]
    fn test_sky_gradient() {
        // Ray pointing up should be more blue (less red than white)
        let up_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), 0.0);
        let up_color = sky_gradient(&up_ray);

        // Ray pointing down should be white
        let down_ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, -1.0, 0.0), 0.0);
        let down_color = sky_gradient(&down_ray);

        assert!(
            up_color.x < down_color.x,
            "up_color.x={} should be < down_color.x={}",
            up_color.x,
            down_color.x
        );
    }

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(4.0, -1.0, 0.25)), [255, 0, 127, 255]);
    }

    #[test]
    fn test_escaping_ray_sees_ambient() {
        let scene = sphere_scene();
        let config = small_config();
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        let color = ray_color(&ray, &scene, 5, &config, &mut PcgRng::new(0, 0));
        assert_eq!(color, Color::new(0.5, 0.7, 1.0));
    }

    #[test]
    fn test_depth_zero_is_black() {
        let scene = sphere_scene();
        let ray = Ray::new(Vec3::ZERO, Vec3::Y, 0.0);
        let color = ray_color(&ray, &scene, 0, &small_config(), &mut PcgRng::new(0, 0));
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_render_pixel() {
        let scene = sphere_scene();
        let camera = Camera::new().with_resolution(10, 10);
        let config = small_config();

        // Center pixel hits the sphere: darker than the sky behind it
        let color = render_pixel(&camera, &scene, 5, 5, &config);
        assert!(color.length() > 0.0);
        assert!(color.z < 1.0);
    }

    #[test]
    fn test_render_is_deterministic_across_backends() {
        let scene = sphere_scene();
        let camera = Camera::new().with_resolution(12, 8);
        let serial = small_config();
        let parallel = RenderConfig {
            backend: Backend::Parallel,
            bucket_size: 5,
            ..serial.clone()
        };
        let cancel = AtomicBool::new(false);

        let a = render(&scene, &camera, &serial, &cancel).unwrap();
        let b = render(&scene, &camera, &parallel, &cancel).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancelled_render() {
        let scene = sphere_scene();
        let camera = Camera::new().with_resolution(8, 8);
        let cancel = AtomicBool::new(true);
        assert!(matches!(
            render(&scene, &camera, &small_config(), &cancel),
            Err(RenderError::Cancelled)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let config = RenderConfig::from_json(
            r#"{"samples_per_pixel": 16, "ambient": {"constant": [0.1, 0.2, 0.3]}, "backend": "serial"}"#,
        )
        .unwrap();
        assert_eq!(config.samples_per_pixel, 16);
        assert_eq!(config.max_depth, 50);
        assert_eq!(config.ambient, Ambient::Constant(Color::new(0.1, 0.2, 0.3)));
        assert_eq!(config.backend, Backend::Serial);

        let sky = RenderConfig::from_json(r#"{"ambient": "sky"}"#).unwrap();
        assert_eq!(sky.ambient, Ambient::Sky);
    }

    #[test]
    fn test_bad_config_json() {
        assert!(matches!(
            RenderConfig::from_json(r#"{"samples_per_pixel": "lots"}"#),
            Err(RenderError::Config(_))
        ));
    }

    #[test]
    fn test_ppm_header() {
        let image = ImageBuffer::new(3, 2);
        let ppm = image.to_ppm();
        assert!(ppm.starts_with(b"P6\n3 2\n255\n"));
        assert_eq!(ppm.len(), b"P6\n3 2\n255\n".len() + 3 * 2 * 3);
    }
}
