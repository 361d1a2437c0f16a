/// Tile binning for parallel rasterization
///
/// The viewport is cut into a fixed grid of tiles. Each screen-space triangle
/// is appended to the bin of every tile its pixel bounding box overlaps, so
/// tiles can later be rasterized independently.
///
/// Bins are cleared and refilled once per draw call; their allocations are
/// kept between draws.
use super::rasterizer::pixel_bounds;
use super::vertex::Triangle;
use super::viewport::{PixelRect, Viewport};
use crate::count_call;
use std::ops::Range;

/// Grid of equally sized tiles covering a viewport. Edge tiles may be
/// narrower or shorter; no tile is empty.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TileGrid {
    viewport: Viewport,
    tiles_x: usize,
    tiles_y: usize,
    tile_width: usize,
    tile_height: usize,
}

impl TileGrid {
    /// Grid of at most `cols` × `rows` tiles. Tile size is rounded up, then
    /// the tile counts are recomputed so trailing tiles are never empty.
    pub fn new(viewport: Viewport, cols: usize, rows: usize) -> Self {
        let (tiles_x, tile_width) = split_axis(viewport.width, cols);
        let (tiles_y, tile_height) = split_axis(viewport.height, rows);
        Self {
            viewport,
            tiles_x,
            tiles_y,
            tile_width,
            tile_height,
        }
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[inline]
    pub fn tiles_x(&self) -> usize {
        self.tiles_x
    }

    #[inline]
    pub fn tiles_y(&self) -> usize {
        self.tiles_y
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles_x * self.tiles_y
    }

    /// Nominal tile size in pixels (width, height)
    #[inline]
    pub fn tile_size(&self) -> (usize, usize) {
        (self.tile_width, self.tile_height)
    }

    /// Pixel rectangle of the tile at row-major `index`
    pub fn tile_rect(&self, index: usize) -> PixelRect {
        debug_assert!(index < self.tile_count());
        let tx = index % self.tiles_x.max(1);
        let ty = index / self.tiles_x.max(1);
        let vp = self.viewport.rect();

        let x0 = vp.x0 + tx * self.tile_width;
        let y0 = vp.y0 + ty * self.tile_height;
        PixelRect::new(
            x0,
            y0,
            (x0 + self.tile_width).min(vp.x1),
            (y0 + self.tile_height).min(vp.y1),
        )
    }

    /// Tile column and row ranges overlapped by a pixel rectangle
    pub fn tile_span(&self, bounds: PixelRect) -> Option<(Range<usize>, Range<usize>)> {
        if self.tile_count() == 0 {
            return None;
        }
        let vp = self.viewport.rect();
        let clipped = bounds.intersect(&vp)?;

        let tx0 = (clipped.x0 - vp.x0) / self.tile_width;
        let ty0 = (clipped.y0 - vp.y0) / self.tile_height;
        let tx1 = ((clipped.x1 - 1 - vp.x0) / self.tile_width).min(self.tiles_x - 1);
        let ty1 = ((clipped.y1 - 1 - vp.y0) / self.tile_height).min(self.tiles_y - 1);

        Some((tx0..tx1 + 1, ty0..ty1 + 1))
    }
}

/// Tile count and tile size along one axis
fn split_axis(extent: usize, parts: usize) -> (usize, usize) {
    if extent == 0 {
        return (0, 1);
    }
    let parts = parts.clamp(1, extent);
    let size = extent.div_ceil(parts);
    (extent.div_ceil(size), size)
}

/// A screen-space triangle copied into a bin
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BinnedTriangle {
    pub triangle: Triangle,
    /// Smallest NDC depth of the three vertices
    pub min_depth: f32,
}

/// Per-tile triangle lists for one draw call
#[derive(Debug, Default)]
pub struct TileBins {
    grid: TileGrid,
    bins: Vec<Vec<BinnedTriangle>>,
}

impl TileBins {
    pub fn new(grid: TileGrid) -> Self {
        Self {
            grid,
            bins: vec![Vec::new(); grid.tile_count()],
        }
    }

    /// Switch to a new grid, clearing all bins. Existing bin allocations are
    /// reused where the tile count allows.
    pub fn reconfigure(&mut self, grid: TileGrid) {
        self.grid = grid;
        self.bins.resize_with(grid.tile_count(), Vec::new);
        self.clear();
    }

    /// Drop all binned triangles, keeping capacity
    pub fn clear(&mut self) {
        for bin in &mut self.bins {
            bin.clear();
        }
    }

    #[inline]
    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    /// Append `triangle` to every tile its bounding box overlaps.
    ///
    /// Returns the number of tiles it was added to; zero means it lies
    /// entirely outside the viewport and will not be drawn.
    pub fn add_triangle(&mut self, triangle: &Triangle, min_depth: f32) -> usize {
        let Some(bounds) = pixel_bounds(triangle, self.grid.viewport().rect()) else {
            return 0;
        };
        let Some((cols, rows)) = self.grid.tile_span(bounds) else {
            return 0;
        };

        count_call!(crate::perf::FUNCTION_COUNTERS.triangles_binned);

        let entry = BinnedTriangle {
            triangle: *triangle,
            min_depth,
        };
        let tiles_x = self.grid.tiles_x();
        let mut added = 0;
        for ty in rows {
            for tx in cols.clone() {
                self.bins[ty * tiles_x + tx].push(entry);
                added += 1;
            }
        }
        added
    }

    /// Triangles binned to the tile at row-major `index`
    #[inline]
    pub fn bin(&self, index: usize) -> &[BinnedTriangle] {
        &self.bins[index]
    }

    #[inline]
    pub fn get_bin(&self, tile_x: usize, tile_y: usize) -> &[BinnedTriangle] {
        self.bin(tile_y * self.grid.tiles_x() + tile_x)
    }

    /// Indices of tiles with at least one triangle
    pub fn non_empty_tiles(&self) -> impl Iterator<Item = usize> + '_ {
        self.bins
            .iter()
            .enumerate()
            .filter(|(_, bin)| !bin.is_empty())
            .map(|(index, _)| index)
    }

    /// Sum of all bin lengths
    pub fn total_entries(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }
}
