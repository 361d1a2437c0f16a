/// Viewport and screen mapping (clip -> NDC -> pixel space)
use super::vertex::Vertex;
use glam::{Vec2, Vec4};

/// Half-open pixel rectangle [x0, x1) × [y0, y1)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelRect {
    #[inline]
    pub const fn new(x0: usize, y0: usize, x1: usize, y1: usize) -> Self {
        Self { x0, y0, x1, y1 }
    }

    #[inline]
    pub const fn width(&self) -> usize {
        self.x1.saturating_sub(self.x0)
    }

    #[inline]
    pub const fn height(&self) -> usize {
        self.y1.saturating_sub(self.y0)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    #[inline]
    pub const fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Overlap of two rectangles, `None` when they do not overlap
    #[inline]
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let rect = PixelRect::new(
            self.x0.max(other.x0),
            self.y0.max(other.y0),
            self.x1.min(other.x1),
            self.y1.min(other.y1),
        );
        (!rect.is_empty()).then_some(rect)
    }
}

/// Target rectangle inside the bound buffers.
///
/// Buffers are addressed with stride `x + width` and hold
/// `(x + width) * (y + height)` elements.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Viewport {
    #[inline]
    pub const fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Row stride of the bound buffers
    #[inline]
    pub const fn stride(&self) -> usize {
        self.x + self.width
    }

    /// Element count the bound buffers must have
    #[inline]
    pub const fn pixel_count(&self) -> usize {
        self.stride() * (self.y + self.height)
    }

    #[inline]
    pub const fn rect(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    /// NDC x,y in [-1, 1] to pixel space; NDC +y maps to smaller rows
    #[inline]
    pub fn ndc_to_screen(&self, ndc: Vec2) -> Vec2 {
        Vec2::new(
            self.x as f32 + (ndc.x * 0.5 + 0.5) * self.width as f32,
            self.y as f32 + (1.0 - (ndc.y * 0.5 + 0.5)) * self.height as f32,
        )
    }
}

/// Divide a clip-space position by its w. `None` when w is zero or the result
/// is not finite.
#[inline]
pub fn perspective_divide(clip: Vec4) -> Option<Vec4> {
    if clip.w == 0.0 || !clip.w.is_finite() {
        return None;
    }
    let ndc = clip / clip.w;
    ndc.is_finite().then_some(ndc)
}

/// Move a shaded vertex from clip space to screen space in place.
///
/// After the call `position` holds (screen x, screen y, NDC z, 1). Returns
/// false, leaving the vertex untouched, if the perspective divide is undefined.
#[inline]
pub fn map_to_screen(vertex: &mut Vertex, viewport: &Viewport) -> bool {
    let Some(ndc) = perspective_divide(vertex.position) else {
        return false;
    };
    let screen = viewport.ndc_to_screen(ndc.truncate().truncate());
    vertex.position = Vec4::new(screen.x, screen.y, ndc.z, 1.0);
    true
}
