/// Edge-function triangle rasterizer
///
/// Scan-converts one screen-space triangle inside a target rectangle with
/// perspective-correct attribute interpolation, a less-than depth test and a
/// programmable pixel shader.
use super::framebuffer::{FrameTile, FrameView, PixelRgba32};
use super::shader::PixelShader;
use super::vertex::{Triangle, Vertex};
use super::viewport::PixelRect;
use crate::count_call;
use glam::{Vec2, Vec4};

/// Abstraction over a render target that supports depth-tested pixel writes.
pub trait PixelTarget {
    /// Pixels outside this rectangle are never touched.
    fn rect(&self) -> PixelRect;
    /// Depth test at (x, y). On pass the new depth is stored and the pixel's
    /// buffer index is returned.
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize>;
    fn write_color(&mut self, index: usize, color: PixelRgba32);
}

impl<'a> PixelTarget for FrameView<'a> {
    #[inline]
    fn rect(&self) -> PixelRect {
        self.rect
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        FrameView::test_depth_and_get_index(self, x, y, depth)
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: PixelRgba32) {
        FrameView::write_color(self, index, color);
    }
}

impl<'a> PixelTarget for FrameTile<'a> {
    #[inline]
    fn rect(&self) -> PixelRect {
        FrameTile::rect(self)
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        FrameTile::test_depth_and_get_index(self, x, y, depth)
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: PixelRgba32) {
        FrameTile::write_color(self, index, color);
    }
}

/// What happened to a triangle handed to `rasterize_triangle`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TriangleResult {
    /// Negative signed area: clockwise on screen
    BackFacing,
    /// Zero or non-finite signed area
    Degenerate,
    /// Bounding box misses the target rectangle
    Outside,
    Rasterized { pixels_written: usize },
}

/// Edge function: twice the signed area of (a, b, c). Positive when c lies
/// on the inner side of the directed edge a -> b for a front-facing triangle.
#[inline]
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// A pixel is covered only when every edge weight is a number >= 0.
#[inline]
fn is_covered(w0: f32, w1: f32, w2: f32) -> bool {
    w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0
}

#[inline]
fn screen_xy(vertex: &Vertex) -> Vec2 {
    vertex.position.truncate().truncate()
}

/// Signed area (×2) of a screen-space triangle
#[inline]
pub fn signed_area(triangle: &Triangle) -> f32 {
    edge_function(
        screen_xy(&triangle[0]),
        screen_xy(&triangle[1]),
        screen_xy(&triangle[2]),
    )
}

/// Classify a screen-space triangle without rasterizing it
#[inline]
pub fn classify(triangle: &Triangle) -> Option<TriangleResult> {
    let area = signed_area(triangle);
    if !area.is_finite() || area == 0.0 {
        Some(TriangleResult::Degenerate)
    } else if area < 0.0 {
        Some(TriangleResult::BackFacing)
    } else {
        None
    }
}

/// Integer pixel bounds of a screen-space triangle (floor of the minimum,
/// ceil of the maximum, inclusive) clipped to `clip`.
pub fn pixel_bounds(triangle: &Triangle, clip: PixelRect) -> Option<PixelRect> {
    let [p0, p1, p2] = [
        screen_xy(&triangle[0]),
        screen_xy(&triangle[1]),
        screen_xy(&triangle[2]),
    ];
    let min = p0.min(p1).min(p2).floor();
    let max = p0.max(p1).max(p2).ceil();
    if !min.is_finite() || !max.is_finite() {
        return None;
    }

    // Float-to-int casts saturate, negative coordinates clamp to the clip edge.
    let x0 = (min.x as i64).max(clip.x0 as i64);
    let y0 = (min.y as i64).max(clip.y0 as i64);
    let x1 = (max.x as i64).saturating_add(1).min(clip.x1 as i64);
    let y1 = (max.y as i64).saturating_add(1).min(clip.y1 as i64);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(PixelRect::new(x0 as usize, y0 as usize, x1 as usize, y1 as usize))
}

/// Rasterize one screen-space triangle into `target`.
///
/// Each vertex's `position` must be (screen x, screen y, 1 / NDC z, _). Only
/// pixels inside `target.rect()` are visited, so a triangle binned into
/// several tiles is drawn exactly once per pixel.
pub fn rasterize_triangle<T: PixelTarget + ?Sized>(
    triangle: &Triangle,
    shader: &dyn PixelShader,
    target: &mut T,
) -> TriangleResult {
    count_call!(crate::perf::FUNCTION_COUNTERS.rasterize_triangle_calls);

    if let Some(rejected) = classify(triangle) {
        count_call!(crate::perf::FUNCTION_COUNTERS.triangles_culled);
        return rejected;
    }

    let Some(bounds) = pixel_bounds(triangle, target.rect()) else {
        return TriangleResult::Outside;
    };

    let [v0, v1, v2] = triangle;
    let (p0, p1, p2) = (screen_xy(v0), screen_xy(v1), screen_xy(v2));
    let inv_area = 1.0 / edge_function(p0, p1, p2);

    // Reciprocal depths interpolate linearly in screen space.
    let (iz0, iz1, iz2) = (v0.position.z, v1.position.z, v2.position.z);

    // Attributes divided by depth (multiplied by its reciprocal) so they can
    // be interpolated linearly and corrected per pixel.
    let normals = [v0.normal * iz0, v1.normal * iz1, v2.normal * iz2];
    let colors = [v0.color * iz0, v1.color * iz1, v2.color * iz2];
    let tex_coords = [v0.tex_coord * iz0, v1.tex_coord * iz1, v2.tex_coord * iz2];

    let mut pixels_written = 0usize;

    for y in bounds.y0..bounds.y1 {
        let py = y as f32 + 0.5;
        for x in bounds.x0..bounds.x1 {
            let p = Vec2::new(x as f32 + 0.5, py);

            // Evaluated per pixel rather than stepped, so coverage does not
            // depend on which rectangle is being walked.
            let w0 = edge_function(p1, p2, p);
            let w1 = edge_function(p2, p0, p);
            let w2 = edge_function(p0, p1, p);
            if !is_covered(w0, w1, w2) {
                continue;
            }

            count_call!(crate::perf::FUNCTION_COUNTERS.pixels_tested);

            let b0 = w0 * inv_area;
            let b1 = w1 * inv_area;
            let b2 = w2 * inv_area;

            let depth = 1.0 / (b0 * iz0 + b1 * iz1 + b2 * iz2);

            let Some(index) = target.test_depth_and_get_index(x, y, depth) else {
                count_call!(crate::perf::FUNCTION_COUNTERS.depth_failed);
                continue;
            };
            count_call!(crate::perf::FUNCTION_COUNTERS.depth_passed);

            let fragment = Vertex {
                position: Vec4::new(p.x, p.y, depth, 1.0),
                normal: (normals[0] * b0 + normals[1] * b1 + normals[2] * b2) * depth,
                color: (colors[0] * b0 + colors[1] * b1 + colors[2] * b2) * depth,
                tex_coord: (tex_coords[0] * b0 + tex_coords[1] * b1 + tex_coords[2] * b2) * depth,
            };

            let color = shader.shade(&fragment);
            target.write_color(index, PixelRgba32::from_rgba(color));
            pixels_written += 1;
        }
    }

    TriangleResult::Rasterized { pixels_written }
}
