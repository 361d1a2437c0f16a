/// Programmable shading stages
///
/// Shaders are capabilities with a single call operation. Any type implementing
/// the trait can be bound, and plain closures with the matching signature
/// implement it automatically. Both traits require `Send + Sync` because
/// tiles are shaded on pool workers.
use super::vertex::Vertex;
use glam::{Mat4, Vec4};

/// Per-draw transform data forwarded to the vertex shader
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transforms {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
}

impl Transforms {
    pub const IDENTITY: Self = Self {
        model: Mat4::IDENTITY,
        view: Mat4::IDENTITY,
        projection: Mat4::IDENTITY,
    };

    pub fn new(model: Mat4, view: Mat4, projection: Mat4) -> Self {
        Self {
            model,
            view,
            projection,
        }
    }

    #[inline]
    pub fn model_view_projection(&self) -> Mat4 {
        self.projection * self.view * self.model
    }
}

impl Default for Transforms {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Maps a submitted vertex to a homogeneous clip-space position
pub trait VertexShader: Send + Sync {
    fn shade(&self, vertex: &Vertex, transforms: &Transforms) -> Vec4;
}

/// Maps interpolated fragment attributes to an RGBA color in [0, 1].
///
/// The fragment's `position` is (pixel x + 0.5, pixel y + 0.5, depth, 1).
pub trait PixelShader: Send + Sync {
    fn shade(&self, fragment: &Vertex) -> Vec4;
}

impl<F> VertexShader for F
where
    F: Fn(&Vertex, &Transforms) -> Vec4 + Send + Sync,
{
    #[inline]
    fn shade(&self, vertex: &Vertex, transforms: &Transforms) -> Vec4 {
        self(vertex, transforms)
    }
}

impl<F> PixelShader for F
where
    F: Fn(&Vertex) -> Vec4 + Send + Sync,
{
    #[inline]
    fn shade(&self, fragment: &Vertex) -> Vec4 {
        self(fragment)
    }
}

/// Returns the submitted position unchanged (input already in clip space)
#[derive(Copy, Clone, Debug, Default)]
pub struct PassThrough;

impl VertexShader for PassThrough {
    #[inline]
    fn shade(&self, vertex: &Vertex, _transforms: &Transforms) -> Vec4 {
        vertex.position
    }
}

/// projection × view × model × position
#[derive(Copy, Clone, Debug, Default)]
pub struct MvpVertexShader;

impl VertexShader for MvpVertexShader {
    #[inline]
    fn shade(&self, vertex: &Vertex, transforms: &Transforms) -> Vec4 {
        transforms.model_view_projection() * vertex.position
    }
}

/// Flat color for every covered pixel
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SolidColor(pub Vec4);

impl PixelShader for SolidColor {
    #[inline]
    fn shade(&self, _fragment: &Vertex) -> Vec4 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn mvp_applies_model_first() {
        let transforms = Transforms::new(
            Mat4::from_translation(Vec3::X),
            Mat4::from_scale(Vec3::splat(2.0)),
            Mat4::IDENTITY,
        );
        let clip = MvpVertexShader.shade(&Vertex::new(Vec3::ZERO), &transforms);
        assert_eq!(clip, Vec4::new(2.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn closures_are_shaders() {
        let vs = |v: &Vertex, _: &Transforms| v.position * 2.0;
        let ps = |f: &Vertex| f.color.extend(1.0);

        let vertex = Vertex::new(Vec3::ONE).color(Vec3::new(0.25, 0.5, 0.75));
        assert_eq!(
            VertexShader::shade(&vs, &vertex, &Transforms::IDENTITY),
            Vec4::new(2.0, 2.0, 2.0, 2.0)
        );
        assert_eq!(PixelShader::shade(&ps, &vertex), Vec4::new(0.25, 0.5, 0.75, 1.0));
    }
}
