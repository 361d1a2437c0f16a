use glam::{Vec2, Vec3, Vec4};

/// Pipeline vertex.
///
/// `position` changes meaning as the vertex moves through the pipeline:
/// object space on submission, clip space after the vertex shader, NDC after
/// the perspective divide, and finally screen space with `z` holding the
/// reciprocal NDC depth.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec4,
    pub normal: Vec3,
    pub color: Vec3,
    pub tex_coord: Vec2,
}

impl Vertex {
    /// Vertex at `position` with w = 1 and zeroed attributes
    #[inline]
    pub fn new(position: Vec3) -> Self {
        Self {
            position: position.extend(1.0),
            ..Self::default()
        }
    }

    #[inline]
    pub fn with_normal(position: Vec3, normal: Vec3) -> Self {
        Self {
            normal,
            ..Self::new(position)
        }
    }

    #[inline]
    pub fn with_color_uv(position: Vec3, color: Vec3, tex_coord: Vec2) -> Self {
        Self {
            color,
            tex_coord,
            ..Self::new(position)
        }
    }

    /// Builder-style setters, used by the procedural meshes
    #[inline]
    pub fn normal(mut self, normal: Vec3) -> Self {
        self.normal = normal;
        self
    }

    #[inline]
    pub fn color(mut self, color: Vec3) -> Self {
        self.color = color;
        self
    }

    #[inline]
    pub fn tex_coord(mut self, tex_coord: Vec2) -> Self {
        self.tex_coord = tex_coord;
        self
    }
}

/// Three vertices of an implicit triangle list. Ephemeral: lives for one draw.
pub type Triangle = [Vertex; 3];
