/// Built-in pixel shaders.
/// Kept separate from the rasterizer so lighting models
/// can evolve independently of the rasterization pipeline.
use super::shader::PixelShader;
use super::vertex::Vertex;
use glam::{Vec3, Vec4};

/// Simple directional + ambient shading configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadingConfig {
    /// Direction towards the light. Not required to be normalized.
    pub light_dir: Vec3,
    /// Constant ambient term added to all fragments.
    pub ambient: f32,
    /// Strength of the directional (Lambert) term.
    pub diffuse: f32,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            // Slightly from +X/+Z and above
            light_dir: Vec3::new(0.4, 1.0, 0.3).normalize(),
            ambient: 0.35,
            diffuse: 0.65,
        }
    }
}

impl ShadingConfig {
    /// Scalar light intensity for an interpolated normal, in [0, 1].
    /// Interpolated normals are not unit length, so they are renormalized.
    #[inline]
    pub fn light(&self, normal: Vec3) -> f32 {
        let lambert = normal.normalize_or_zero().dot(self.light_dir).max(0.0);
        (self.ambient + self.diffuse * lambert).clamp(0.0, 1.0)
    }
}

/// Vertex color modulated by `ShadingConfig` lighting
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Lambert(pub ShadingConfig);

impl PixelShader for Lambert {
    #[inline]
    fn shade(&self, fragment: &Vertex) -> Vec4 {
        (fragment.color * self.0.light(fragment.normal)).extend(1.0)
    }
}

/// Interpolated vertex color, opaque
#[derive(Copy, Clone, Debug, Default)]
pub struct VertexColor;

impl PixelShader for VertexColor {
    #[inline]
    fn shade(&self, fragment: &Vertex) -> Vec4 {
        fragment.color.extend(1.0)
    }
}

/// Black and white texture-space checkerboard lit by an unnormalized
/// directional light, with the light factor clamped to [0.1, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Checkerboard {
    /// Squares per unit of texture coordinate
    pub squares: f32,
    pub light_dir: Vec3,
}

impl Default for Checkerboard {
    fn default() -> Self {
        Self {
            squares: 20.0,
            light_dir: Vec3::new(1.0, 0.5, 0.0),
        }
    }
}

impl PixelShader for Checkerboard {
    fn shade(&self, fragment: &Vertex) -> Vec4 {
        let n_dot_l = fragment
            .normal
            .normalize_or_zero()
            .dot(self.light_dir)
            .clamp(0.1, 1.0);

        let u = (fragment.tex_coord.x * self.squares).rem_euclid(1.0) > 0.5;
        let v = (fragment.tex_coord.y * self.squares).rem_euclid(1.0) < 0.5;
        let lit = if u ^ v { n_dot_l } else { 0.0 };

        Vec3::splat(lit).extend(1.0)
    }
}

/// Maps the interpolated normal from [-1, 1] to an RGB color
#[derive(Copy, Clone, Debug, Default)]
pub struct NormalDebug;

impl PixelShader for NormalDebug {
    #[inline]
    fn shade(&self, fragment: &Vertex) -> Vec4 {
        (fragment.normal.normalize_or_zero() * 0.5 + Vec3::splat(0.5)).extend(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn light_is_clamped_and_renormalized() {
        let config = ShadingConfig {
            light_dir: Vec3::Y,
            ambient: 0.5,
            diffuse: 1.0,
        };
        assert_eq!(config.light(Vec3::Y * 0.25), 1.0);
        assert_eq!(config.light(Vec3::NEG_Y), 0.5);
    }

    #[test]
    fn checkerboard_alternates() {
        let shader = Checkerboard {
            squares: 2.0,
            light_dir: Vec3::Z,
        };
        let at = |u: f32, v: f32| {
            let fragment = Vertex::default().normal(Vec3::Z).tex_coord(Vec2::new(u, v));
            shader.shade(&fragment)
        };

        let dark = Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(at(0.1, 0.1), Vec4::ONE);
        assert_eq!(at(0.35, 0.1), dark);
        assert_eq!(at(0.1, 0.35), dark);
        assert_eq!(at(0.35, 0.35), Vec4::ONE);
    }

    #[test]
    fn checkerboard_keeps_minimum_light() {
        let shader = Checkerboard {
            squares: 2.0,
            light_dir: Vec3::Z,
        };
        let fragment = Vertex::default()
            .normal(Vec3::NEG_Z)
            .tex_coord(Vec2::new(0.1, 0.1));
        assert_eq!(shader.shade(&fragment), Vec4::new(0.1, 0.1, 0.1, 1.0));
    }

    #[test]
    fn lambert_modulates_vertex_color() {
        let shader = Lambert(ShadingConfig {
            light_dir: Vec3::Y,
            ambient: 0.0,
            diffuse: 1.0,
        });
        let fragment = Vertex::default().normal(Vec3::Y).color(Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(shader.shade(&fragment), Vec4::new(1.0, 0.5, 0.0, 1.0));
    }
}
