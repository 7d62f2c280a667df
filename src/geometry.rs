//! Procedural geometry for the demo scene.
//!
//! Everything here is plain CPU data. Upload with [`Mesh::from_geometry`].
//!
//! ```
//! use strata::{RawGeometry, TorusKnot};
//!
//! let knot: RawGeometry = TorusKnot::default().build();
//! assert_eq!(knot.vertices.len(), 129 * 65);
//! ```
//!
//! [`Mesh::from_geometry`]: crate::Mesh::from_geometry

use std::f32::consts::TAU;

use glam::{EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::mesh::{Transform, Vertex3d};

/// Indexed triangle geometry before GPU upload.
#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub vertices: Vec<Vertex3d>,
    pub indices: Vec<u32>,
}

impl RawGeometry {
    pub fn new(vertices: Vec<Vertex3d>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Axis-aligned `(min, max)` corners.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        self.vertices.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), v| {
                let p = Vec3::from(v.position);
                (min.min(p), max.max(p))
            },
        )
    }

    pub fn center(&self) -> Vec3 {
        let (min, max) = self.bounds();
        (min + max) * 0.5
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A (p, q) torus knot tube, laid out the same way as three.js' `TorusKnotGeometry`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TorusKnot {
    pub radius: f32,
    pub tube: f32,
    pub tubular_segments: u32,
    pub radial_segments: u32,
    /// Times the knot winds around its axis of rotational symmetry.
    pub p: u32,
    /// Times the knot winds around the interior circle of the torus.
    pub q: u32,
}

impl Default for TorusKnot {
    fn default() -> Self {
        Self {
            radius: 1.0,
            tube: 0.3,
            tubular_segments: 128,
            radial_segments: 64,
            p: 2,
            q: 3,
        }
    }
}

impl TorusKnot {
    pub fn new(radius: f32, tube: f32, tubular_segments: u32, radial_segments: u32) -> Self {
        Self {
            radius,
            tube,
            tubular_segments: tubular_segments.max(3),
            radial_segments: radial_segments.max(3),
            ..Self::default()
        }
    }

    pub fn build(&self) -> RawGeometry {
        let tubular = self.tubular_segments;
        let radial = self.radial_segments;
        let mut vertices = Vec::with_capacity(((tubular + 1) * (radial + 1)) as usize);

        for i in 0..=tubular {
            let u = i as f32 / tubular as f32 * self.p as f32 * TAU;
            let p1 = self.curve(u);
            let p2 = self.curve(u + 0.01);

            // Frenet-style frame around the centre line.
            let tangent = p2 - p1;
            let binormal = tangent.cross(p2 + p1);
            let normal = binormal.cross(tangent).normalize_or_zero();
            let binormal = binormal.normalize_or_zero();

            for j in 0..=radial {
                let v = j as f32 / radial as f32 * TAU;
                let cx = -self.tube * v.cos();
                let cy = self.tube * v.sin();
                let position = p1 + cx * normal + cy * binormal;
                let surface_normal = (position - p1).normalize_or_zero();
                vertices.push(Vertex3d::new(position.into(), surface_normal.into()));
            }
        }

        let mut indices = Vec::with_capacity((tubular * radial * 6) as usize);
        let row = radial + 1;
        for j in 1..=tubular {
            for i in 1..=radial {
                let a = row * (j - 1) + (i - 1);
                let b = row * j + (i - 1);
                let c = row * j + i;
                let d = row * (j - 1) + i;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }

        RawGeometry::new(vertices, indices)
    }

    fn curve(&self, u: f32) -> Vec3 {
        let qu_over_p = self.q as f32 / self.p as f32 * u;
        let cs = qu_over_p.cos();
        Vec3::new(
            self.radius * (2.0 + cs) * 0.5 * u.cos(),
            self.radius * (2.0 + cs) * 0.5 * u.sin(),
            self.radius * qu_over_p.sin() * 0.5,
        )
    }
}

/// Places `count` instances uniformly on a sphere of `radius`, each with a random
/// rotation. The same seed always gives the same layout.
pub fn scatter_on_sphere(count: usize, radius: f32, seed: u64) -> Vec<Transform> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let angle = rng.gen_range(0.0..TAU);
            let z: f32 = rng.gen_range(-1.0..1.0);
            let ring = (1.0 - z * z).sqrt() * radius;
            let position = Vec3::new(angle.cos() * ring, angle.sin() * ring, z * radius);
            let rotation = Quat::from_euler(EulerRot::XYZ, rng.r#gen(), rng.r#gen(), rng.r#gen());
            Transform::from_position(position).rotation(rotation)
        })
        .collect()
}

/// Everything the scene renderer draws: one mesh, many instances, one base colour.
#[derive(Clone, Debug)]
pub struct SceneContent {
    pub geometry: RawGeometry,
    pub instances: Vec<Transform>,
    /// Linear RGB.
    pub base_color: Vec3,
}

impl SceneContent {
    /// `count` torus knots (radius 1, tube 0.3, 128x64) scattered on a sphere of `radius`.
    pub fn torus_knots(count: usize, radius: f32, seed: u64) -> Self {
        Self {
            geometry: TorusKnot::default().build(),
            instances: scatter_on_sphere(count, radius, seed),
            // 0xAABBCC
            base_color: Vec3::new(0.402, 0.497, 0.604),
        }
    }
}
