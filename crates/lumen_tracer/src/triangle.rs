//! Triangle and indexed triangle mesh primitives.
//!
//! Intersection uses a precomputed projection onto the plane of the
//! triangle's dominant normal axis (Wald's accelerated triangle test):
//! one division for the plane crossing, then two 2D edge equations.

use crate::{
    hittable::{HitRecord, Hittable},
    Material, UniformRng,
};
use lumen_core::{wire, Error, Persist, Result, Stream, Wire};
use lumen_math::{Aabb, Interval, Ray, Vec2, Vec3};

/// Padding applied to triangle bounds so flat boxes stay hittable.
const BOUNDS_DELTA: f32 = 0.0001;

/// Precomputed intersection data for one triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TriAccel {
    a: Vec3,
    /// Plane coefficients in the projection frame
    nu: f32,
    nv: f32,
    nd: f32,
    /// Dominant normal axis
    k: usize,
    /// Edge equations
    bnu: f32,
    bnv: f32,
    cnu: f32,
    cnv: f32,
    degenerate: bool,
}

impl TriAccel {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        let ab = b - a;
        let ac = c - a;
        let n = ab.cross(ac);

        let abs_n = n.abs();
        let k = if abs_n.x >= abs_n.y && abs_n.x >= abs_n.z {
            0
        } else if abs_n.y >= abs_n.z {
            1
        } else {
            2
        };
        let u = (k + 1) % 3;
        let v = (k + 2) % 3;

        let denom = ac[u] * ab[v] - ac[v] * ab[u];
        if n[k] == 0.0 || denom == 0.0 || !denom.is_finite() {
            return Self {
                a,
                k,
                degenerate: true,
                ..Default::default()
            };
        }

        let reci = 1.0 / denom;
        Self {
            a,
            nu: n[u] / n[k],
            nv: n[v] / n[k],
            nd: n.dot(a) / n[k],
            k,
            bnu: ac[u] * reci,
            bnv: -ac[v] * reci,
            cnu: ab[v] * reci,
            cnv: -ab[u] * reci,
            degenerate: false,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Ray parameter and barycentric weights `(lambda, mue)` of the second
    /// and third vertex.
    pub fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<(f32, f32, f32)> {
        if self.degenerate {
            return None;
        }
        let k = self.k;
        let u = (k + 1) % 3;
        let v = (k + 2) % 3;
        let o = ray.origin();
        let d = ray.direction();

        let nd = 1.0 / (d[k] + self.nu * d[u] + self.nv * d[v]);
        let f = (self.nd - o[k] - self.nu * o[u] - self.nv * o[v]) * nd;
        if !ray_t.surrounds(f) {
            return None;
        }

        let hu = o[u] + f * d[u] - self.a[u];
        let hv = o[v] + f * d[v] - self.a[v];

        let lambda = hv * self.bnu + hu * self.bnv;
        if lambda < 0.0 {
            return None;
        }
        let mue = hu * self.cnu + hv * self.cnv;
        if mue < 0.0 || lambda + mue > 1.0 {
            return None;
        }
        Some((f, lambda, mue))
    }
}

fn padded_bounds(points: impl IntoIterator<Item = Vec3>) -> Option<Aabb> {
    let mut points = points.into_iter();
    let first = points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
    let delta = Vec3::splat(BOUNDS_DELTA);
    Some(Aabb::new(min - delta, max + delta))
}

/// A single triangle with per-vertex texture coordinates.
#[derive(Debug)]
pub struct Triangle {
    vertices: [Vec3; 3],
    tex_coords: [Vec2; 3],
    /// Unit geometric normal
    normal: Vec3,
    accel: TriAccel,
    material: Material,
}

impl Triangle {
    pub const TYPE_TAG: i32 = 7;

    pub fn new(vertices: [Vec3; 3], tex_coords: [Vec2; 3], material: Material) -> Self {
        let [v0, v1, v2] = vertices;
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            vertices,
            tex_coords,
            normal,
            accel: TriAccel::new(v0, v1, v2),
            material,
        }
    }

    /// Triangle with all texture coordinates at the origin.
    pub fn untextured(v0: Vec3, v1: Vec3, v2: Vec3, material: Material) -> Self {
        Self::new([v0, v1, v2], [Vec2::ZERO; 3], material)
    }

    pub fn area(&self) -> f32 {
        let [v0, v1, v2] = self.vertices;
        0.5 * (v1 - v0).cross(v2 - v0).length()
    }

    pub fn is_degenerate(&self) -> bool {
        self.accel.is_degenerate()
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let mut vertices = [Vec3::ZERO; 3];
        for v in &mut vertices {
            *v = Vec3::decode(stream)?;
        }
        let mut tex_coords = [Vec2::ZERO; 3];
        for t in &mut tex_coords {
            *t = Vec2::decode(stream)?;
        }
        let material = Material::create(stream)?;
        Ok(Self::new(vertices, tex_coords, material))
    }
}

impl Hittable for Triangle {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn UniformRng,
    ) -> bool {
        let Some((t, lambda, mue)) = self.accel.intersect(ray, ray_t) else {
            return false;
        };
        let [t0, t1, t2] = self.tex_coords;
        let uv = (1.0 - lambda - mue) * t0 + lambda * t1 + mue * t2;

        rec.t = t;
        rec.p = ray.at(t);
        rec.normal = self.normal;
        rec.u = uv.x;
        rec.v = uv.y;
        rec.material = Some(&self.material);
        true
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        padded_bounds(self.vertices)
    }
}

impl Persist for Triangle {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        self.vertices.iter().try_for_each(|v| v.encode(stream))?;
        self.tex_coords.iter().try_for_each(|t| t.encode(stream))?;
        self.material.serialize(stream)
    }
}

/// Vertex indices of one mesh triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriIndex {
    pub i0: u32,
    pub i1: u32,
    pub i2: u32,
}

impl TriIndex {
    pub fn new(i0: u32, i1: u32, i2: u32) -> Self {
        Self { i0, i1, i2 }
    }

    fn as_array(self) -> [usize; 3] {
        [self.i0 as usize, self.i1 as usize, self.i2 as usize]
    }
}

impl Wire for TriIndex {
    fn encode(&self, stream: &mut Stream) -> Result<()> {
        self.i0.encode(stream)?;
        self.i1.encode(stream)?;
        self.i2.encode(stream)
    }

    fn decode(stream: &mut Stream) -> Result<Self> {
        Ok(Self::new(
            u32::decode(stream)?,
            u32::decode(stream)?,
            u32::decode(stream)?,
        ))
    }
}

/// Indexed triangle mesh with per-vertex normals and texture coordinates.
///
/// Build with [`add_vertex`](Self::add_vertex) and
/// [`add_triangle`](Self::add_triangle), then call
/// [`complete`](Self::complete) before tracing.
#[derive(Debug)]
pub struct TriangleMesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    triangles: Vec<TriIndex>,
    accel: Vec<TriAccel>,
    bbox: Option<Aabb>,
    material: Material,
}

impl TriangleMesh {
    pub const TYPE_TAG: i32 = 8;

    pub fn new(material: Material) -> Self {
        Self {
            vertices: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            triangles: Vec::new(),
            accel: Vec::new(),
            bbox: None,
            material,
        }
    }

    pub fn add_vertex(&mut self, p: Vec3, n: Vec3, uv: Vec2) {
        self.vertices.push(p);
        self.normals.push(n);
        self.tex_coords.push(uv);
    }

    pub fn add_triangle(&mut self, tri: TriIndex) {
        self.triangles.push(tri);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Build the per-triangle acceleration data and the mesh bounds.
    ///
    /// Fails if a triangle references a vertex that was never added.
    pub fn complete(&mut self) -> Result<()> {
        let vertex_count = self.vertices.len();
        let mut accel = Vec::with_capacity(self.triangles.len());
        let mut degenerate = 0usize;

        for (i, tri) in self.triangles.iter().enumerate() {
            let [a, b, c] = tri.as_array();
            if a >= vertex_count || b >= vertex_count || c >= vertex_count {
                return Err(Error::invalid(format!(
                    "triangle {i} indexes past {vertex_count} vertices"
                )));
            }
            let fast = TriAccel::new(self.vertices[a], self.vertices[b], self.vertices[c]);
            if fast.is_degenerate() {
                degenerate += 1;
            }
            accel.push(fast);
        }

        if degenerate > 0 {
            log::warn!(
                "Mesh has {} degenerate triangles out of {}",
                degenerate,
                self.triangles.len()
            );
        }

        self.accel = accel;
        self.bbox = padded_bounds(
            self.triangles
                .iter()
                .flat_map(|tri| tri.as_array())
                .map(|i| self.vertices[i]),
        );
        Ok(())
    }

    pub fn deserialize(stream: &mut Stream) -> Result<Self> {
        let vertices: Vec<Vec3> = wire::decode_vec(stream)?;
        let normals: Vec<Vec3> = wire::decode_vec(stream)?;
        let tex_coords: Vec<Vec2> = wire::decode_vec(stream)?;
        if normals.len() != vertices.len() || tex_coords.len() != vertices.len() {
            return Err(Error::invalid(format!(
                "mesh attribute counts differ: {} vertices, {} normals, {} texcoords",
                vertices.len(),
                normals.len(),
                tex_coords.len()
            )));
        }
        let triangles: Vec<TriIndex> = wire::decode_vec(stream)?;
        let material = Material::create(stream)?;

        let mut mesh = Self {
            vertices,
            normals,
            tex_coords,
            triangles,
            accel: Vec::new(),
            bbox: None,
            material,
        };
        mesh.complete()?;
        Ok(mesh)
    }
}

impl Hittable for TriangleMesh {
    fn hit<'a>(
        &'a self,
        ray: &Ray,
        ray_t: Interval,
        rec: &mut HitRecord<'a>,
        _rng: &mut dyn UniformRng,
    ) -> bool {
        let mut closest: Option<(usize, f32, f32, f32)> = None;
        let mut interval = ray_t;

        for (i, fast) in self.accel.iter().enumerate() {
            if let Some((t, lambda, mue)) = fast.intersect(ray, interval) {
                closest = Some((i, t, lambda, mue));
                interval = interval.with_max(t);
            }
        }

        let Some((i, t, lambda, mue)) = closest else {
            return false;
        };
        let [a, b, c] = self.triangles[i].as_array();
        let w = 1.0 - lambda - mue;
        let normal = w * self.normals[a] + lambda * self.normals[b] + mue * self.normals[c];
        let uv = w * self.tex_coords[a] + lambda * self.tex_coords[b] + mue * self.tex_coords[c];

        rec.t = t;
        rec.p = ray.at(t);
        rec.normal = normal.normalize_or_zero();
        rec.u = uv.x;
        rec.v = uv.y;
        rec.material = Some(&self.material);
        true
    }

    fn bounds(&self, _t0: f32, _t1: f32) -> Option<Aabb> {
        self.bbox
    }
}

impl Persist for TriangleMesh {
    fn type_tag(&self) -> i32 {
        Self::TYPE_TAG
    }

    fn serialize(&self, stream: &mut Stream) -> Result<()> {
        self.write_tag(stream)?;
        wire::encode_slice(&self.vertices, stream)?;
        wire::encode_slice(&self.normals, stream)?;
        wire::encode_slice(&self.tex_coords, stream)?;
        wire::encode_slice(&self.triangles, stream)?;
        self.material.serialize(stream)
    }
}
