/// Procedural triangle-list meshes
///
/// Flat, non-indexed vertex lists ready for `RasterEngine::draw`. All meshes
/// wind counter-clockwise when viewed from outside in a right-handed frame.
use crate::rendering::vertex::Vertex;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vertex>,
}

impl Mesh {
    pub fn from_vertices(vertices: Vec<Vertex>) -> Self {
        Self { vertices }
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Set the same vertex color on every vertex
    pub fn with_color(mut self, color: Vec3) -> Self {
        for vertex in &mut self.vertices {
            vertex.color = color;
        }
        self
    }

    /// Axis-aligned cube centred on the origin, two triangles per face, with
    /// per-face normals and a full [0, 1] texture square on every face.
    pub fn cube(half_extent: f32) -> Self {
        // (normal, u axis, v axis) with u × v = normal
        const FACES: [(Vec3, Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut vertices = Vec::with_capacity(36);
        for (normal, u, v) in FACES {
            let center = normal * half_extent;
            let (u, v) = (u * half_extent, v * half_extent);
            let corners = [
                (center - u - v, Vec2::new(0.0, 0.0)),
                (center + u - v, Vec2::new(1.0, 0.0)),
                (center + u + v, Vec2::new(1.0, 1.0)),
                (center - u + v, Vec2::new(0.0, 1.0)),
            ];
            for i in [0, 1, 2, 0, 2, 3] {
                let (position, uv) = corners[i];
                vertices.push(Vertex::with_normal(position, normal).tex_coord(uv));
            }
        }
        Self { vertices }
    }

    /// Latitude/longitude sphere. Poles use single triangles.
    pub fn uv_sphere(radius: f32, rings: usize, segments: usize) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);

        let point = |ring: usize, segment: usize| {
            let theta = PI * ring as f32 / rings as f32;
            let phi = TAU * segment as f32 / segments as f32;
            let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
            let uv = Vec2::new(segment as f32 / segments as f32, ring as f32 / rings as f32);
            Vertex::with_normal(normal * radius, normal).tex_coord(uv)
        };

        let mut vertices = Vec::with_capacity(rings * segments * 6);
        for i in 0..rings {
            for j in 0..segments {
                let a = point(i, j);
                let b = point(i + 1, j);
                let c = point(i + 1, j + 1);
                let d = point(i, j + 1);

                if i + 1 < rings {
                    vertices.extend([a, c, b]);
                }
                if i > 0 {
                    vertices.extend([a, d, c]);
                }
            }
        }
        Self { vertices }
    }

    /// Rectangle in the z = `z` plane facing +z
    pub fn quad(min: Vec2, max: Vec2, z: f32) -> Self {
        let corners = [
            (Vec3::new(min.x, min.y, z), Vec2::new(0.0, 0.0)),
            (Vec3::new(max.x, min.y, z), Vec2::new(1.0, 0.0)),
            (Vec3::new(max.x, max.y, z), Vec2::new(1.0, 1.0)),
            (Vec3::new(min.x, max.y, z), Vec2::new(0.0, 1.0)),
        ];
        let vertices = [0, 1, 2, 0, 2, 3]
            .into_iter()
            .map(|i| {
                let (position, uv) = corners[i];
                Vertex::with_normal(position, Vec3::Z).tex_coord(uv)
            })
            .collect();
        Self { vertices }
    }
}
