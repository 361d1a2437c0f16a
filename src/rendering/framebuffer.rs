/// Render target storage and views
///
/// Color and depth live in two separately bound buffers addressed row-major
/// with a shared stride. Workers never see the buffers directly: they get a
/// `FrameView` (safe slices, one writer) or a `FrameTile` (pointer view of one
/// tile rectangle, many writers on disjoint tiles).
use super::binning::TileGrid;
use super::viewport::PixelRect;
use bytemuck::{Pod, Zeroable};
use glam::Vec4;
use std::marker::PhantomData;

/// Depth buffer clear value; smaller values are closer
pub const DEPTH_FAR: f32 = 1.0;

/// Packed 32-bit pixel stored in {A, B, G, R} byte order.
///
/// Read as a little-endian `u32` this is `0xRRGGBBAA`, the packed RGBA8888
/// layout texture uploads expect.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct PixelRgba32 {
    pub a: u8,
    pub b: u8,
    pub g: u8,
    pub r: u8,
}

impl PixelRgba32 {
    pub const BLACK: Self = Self::new(0, 0, 0, 0xFF);
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { a, b, g, r }
    }

    /// Quantize a shader color: each channel clamped to [0, 1], then `round(c * 255)`
    #[inline]
    pub fn from_rgba(color: Vec4) -> Self {
        #[inline(always)]
        fn quantize(c: f32) -> u8 {
            (c.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Self::new(
            quantize(color.x),
            quantize(color.y),
            quantize(color.z),
            quantize(color.w),
        )
    }

    #[inline]
    pub fn to_rgba(self) -> Vec4 {
        Vec4::new(
            self.r as f32,
            self.g as f32,
            self.b as f32,
            self.a as f32,
        ) / 255.0
    }

    /// Packed `0xRRGGBBAA`
    #[inline]
    pub const fn to_u32(self) -> u32 {
        u32::from_le_bytes([self.a, self.b, self.g, self.r])
    }

    #[inline]
    pub const fn from_u32(packed: u32) -> Self {
        let [a, b, g, r] = packed.to_le_bytes();
        Self { a, b, g, r }
    }
}

/// Raw byte view of a color buffer, for texture upload
#[inline]
pub fn as_bytes(pixels: &[PixelRgba32]) -> &[u8] {
    bytemuck::cast_slice(pixels)
}

#[inline]
pub fn clear_color(pixels: &mut [PixelRgba32], clear: PixelRgba32) {
    pixels.fill(clear);
}

#[inline]
pub fn clear_depth(depth: &mut [f32]) {
    depth.fill(DEPTH_FAR);
}

/// Visualise a depth buffer in the red channel; `scale` stretches the
/// typically narrow depth range.
pub fn depth_to_debug_pixels(depth: &[f32], scale: f32) -> Vec<PixelRgba32> {
    depth
        .iter()
        .map(|&d| {
            let red = (d * scale).clamp(0.0, 1.0);
            PixelRgba32::new((red * 255.0) as u8, 0, 0, 0xFF)
        })
        .collect()
}

/// Draw a one-pixel outline of `rect` (used for the tile-grid overlay)
pub fn outline_rect(
    pixels: &mut [PixelRgba32],
    stride: usize,
    rect: PixelRect,
    color: PixelRgba32,
) {
    if rect.is_empty() || stride == 0 {
        return;
    }
    let rows = pixels.len() / stride;
    let x1 = rect.x1.min(stride);
    let y1 = rect.y1.min(rows);
    if rect.x0 >= x1 || rect.y0 >= y1 {
        return;
    }

    for x in rect.x0..x1 {
        pixels[rect.y0 * stride + x] = color;
        pixels[(y1 - 1) * stride + x] = color;
    }
    for y in rect.y0..y1 {
        pixels[y * stride + rect.x0] = color;
        pixels[y * stride + x1 - 1] = color;
    }
}

/// Exclusive view over the color and depth buffers, restricted to `rect`.
/// Used by the single-threaded paths.
pub struct FrameView<'a> {
    pub stride: usize,
    pub rect: PixelRect,
    pub color: &'a mut [PixelRgba32],
    pub depth: &'a mut [f32],
}

impl<'a> FrameView<'a> {
    pub fn new(
        color: &'a mut [PixelRgba32],
        depth: &'a mut [f32],
        stride: usize,
        rect: PixelRect,
    ) -> Self {
        Self {
            stride,
            rect,
            color,
            depth,
        }
    }

    /// Depth test at (x, y); on pass stores `depth` and returns the pixel index.
    /// Pixels outside `rect` never pass.
    #[inline]
    pub fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let index = y * self.stride + x;
        let stored = self.depth.get_mut(index)?;
        if depth < *stored {
            *stored = depth;
            Some(index)
        } else {
            None
        }
    }

    #[inline]
    pub fn write_color(&mut self, index: usize, color: PixelRgba32) {
        self.color[index] = color;
    }
}

/// View of one tile rectangle of the shared buffers.
///
/// Built only by `split_into_tiles`, which hands out at most one view per
/// grid tile. Grid tiles are disjoint, and every access is bounds-checked
/// against the tile rectangle, so views on different threads never touch
/// the same pixel.
pub struct FrameTile<'a> {
    index: usize,
    stride: usize,
    rect: PixelRect,
    color_ptr: *mut PixelRgba32,
    depth_ptr: *mut f32,
    _buffers: PhantomData<(&'a mut [PixelRgba32], &'a mut [f32])>,
}

// Safety: a FrameTile only dereferences pixels inside its own rectangle, and
// split_into_tiles never produces two views of the same tile.
unsafe impl Send for FrameTile<'_> {}

impl<'a> FrameTile<'a> {
    /// Grid index of the tile this view covers
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn test_depth_and_get_index(&mut self, x: usize, y: usize, depth: f32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        let index = y * self.stride + x;
        // Safety: (x, y) lies in this tile's rectangle, which split_into_tiles
        // checked against the buffer length, and no other view covers it.
        let stored = unsafe { &mut *self.depth_ptr.add(index) };
        if depth < *stored {
            *stored = depth;
            Some(index)
        } else {
            None
        }
    }

    /// Write a pixel previously returned by `test_depth_and_get_index`
    #[inline]
    pub fn write_color(&mut self, index: usize, color: PixelRgba32) {
        let (x, y) = (index % self.stride, index / self.stride);
        if self.rect.contains(x, y) {
            // Safety: same argument as the depth access above.
            unsafe {
                *self.color_ptr.add(index) = color;
            }
        }
    }
}

/// Split the bound buffers into per-tile views for the tiles `keep` accepts.
///
/// # Panics
/// If either buffer is shorter than the grid's viewport extent. The pipeline
/// validates buffer sizes before it gets here.
pub fn split_into_tiles<'a>(
    color: &'a mut [PixelRgba32],
    depth: &'a mut [f32],
    grid: &TileGrid,
    mut keep: impl FnMut(usize) -> bool,
) -> Vec<FrameTile<'a>> {
    let viewport = grid.viewport();
    let required = viewport.pixel_count();
    assert!(
        color.len() >= required && depth.len() >= required,
        "buffers smaller than the tile grid's viewport extent"
    );

    let stride = viewport.stride();
    let color_ptr = color.as_mut_ptr();
    let depth_ptr = depth.as_mut_ptr();

    (0..grid.tile_count())
        .filter(|&index| keep(index))
        .map(|index| FrameTile {
            index,
            stride,
            rect: grid.tile_rect(index),
            color_ptr,
            depth_ptr,
            _buffers: PhantomData,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::viewport::Viewport;

    #[test]
    fn pixel_layout_is_abgr() {
        let pixel = PixelRgba32::new(0x11, 0x22, 0x33, 0x44);
        assert_eq!(as_bytes(&[pixel]), &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(pixel.to_u32(), 0x1122_3344);
        assert_eq!(PixelRgba32::from_u32(0x1122_3344), pixel);
        assert_eq!(std::mem::size_of::<PixelRgba32>(), 4);
    }

    #[test]
    fn shader_colors_are_rounded_and_clamped() {
        let pixel = PixelRgba32::from_rgba(Vec4::new(0.5, 1.5, -0.2, 1.0));
        // 0.5 * 255 = 127.5 rounds away from zero
        assert_eq!(pixel, PixelRgba32::new(128, 255, 0, 255));
        assert_eq!(PixelRgba32::from_rgba(Vec4::ONE), PixelRgba32::WHITE);
    }

    #[test]
    fn frame_view_depth_test_is_less_than() {
        let mut color = vec![PixelRgba32::BLACK; 16];
        let mut depth = vec![DEPTH_FAR; 16];
        let mut view = FrameView::new(&mut color, &mut depth, 4, PixelRect::new(0, 0, 4, 4));

        assert_eq!(view.test_depth_and_get_index(1, 2, 0.5), Some(9));
        assert_eq!(view.test_depth_and_get_index(1, 2, 0.5), None);
        assert_eq!(view.test_depth_and_get_index(1, 2, 0.7), None);
        assert_eq!(view.test_depth_and_get_index(1, 2, 0.3), Some(9));
        assert_eq!(view.test_depth_and_get_index(1, 2, DEPTH_FAR), None);
    }

    #[test]
    fn frame_view_rejects_pixels_outside_rect() {
        let mut color = vec![PixelRgba32::BLACK; 16];
        let mut depth = vec![DEPTH_FAR; 16];
        let mut view = FrameView::new(&mut color, &mut depth, 4, PixelRect::new(2, 2, 4, 4));

        assert_eq!(view.test_depth_and_get_index(1, 1, 0.1), None);
        assert_eq!(view.test_depth_and_get_index(3, 3, 0.1), Some(15));
        assert_eq!(depth[5], DEPTH_FAR);
    }

    #[test]
    fn tiles_cover_disjoint_rects() {
        let viewport = Viewport::new(0, 0, 10, 6);
        let grid = TileGrid::new(viewport, 3, 2);
        let mut color = vec![PixelRgba32::BLACK; viewport.pixel_count()];
        let mut depth = vec![DEPTH_FAR; viewport.pixel_count()];

        let mut tiles = split_into_tiles(&mut color, &mut depth, &grid, |_| true);
        assert_eq!(tiles.len(), grid.tile_count());

        // Every pixel is claimed by exactly one tile.
        for y in 0..6 {
            for x in 0..10 {
                let owners = tiles
                    .iter_mut()
                    .filter_map(|tile| tile.test_depth_and_get_index(x, y, 0.5))
                    .count();
                assert_eq!(owners, 1, "pixel ({x}, {y})");
            }
        }
        drop(tiles);
        assert!(depth.iter().all(|&d| d == 0.5));
    }

    #[test]
    fn outline_marks_rect_border_only() {
        let mut pixels = vec![PixelRgba32::BLACK; 25];
        outline_rect(&mut pixels, 5, PixelRect::new(1, 1, 4, 4), PixelRgba32::WHITE);

        let white = pixels.iter().filter(|&&p| p == PixelRgba32::WHITE).count();
        assert_eq!(white, 8);
        assert_eq!(pixels[2 * 5 + 2], PixelRgba32::BLACK);
    }

    #[test]
    fn depth_debug_uses_red_channel() {
        let pixels = depth_to_debug_pixels(&[0.0, 0.25, 1.0], 2.0);
        assert_eq!(pixels[0].r, 0);
        assert_eq!(pixels[1].r, 127);
        assert_eq!(pixels[2].r, 255);
        assert!(pixels.iter().all(|p| p.g == 0 && p.b == 0 && p.a == 255));
    }
}
