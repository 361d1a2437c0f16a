/// Tile dispatch: runs the rasterizer over every non-empty bin
///
/// Each tile only writes pixels inside its own rectangle, so a triangle
/// binned into several tiles is drawn once per pixel and parallel output is
/// byte-identical to the serial path.
use super::binning::{BinnedTriangle, TileBins};
use super::framebuffer::{split_into_tiles, FrameView, PixelRgba32};
use super::rasterizer::{rasterize_triangle, PixelTarget, TriangleResult};
use super::shader::PixelShader;
use crate::count_add;
use rayon::prelude::*;
use rayon::ThreadPool;

/// Work done by one dispatch
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Non-empty tiles that were rasterized
    pub tiles: usize,
    pub pixels_written: usize,
}

/// Rasterize every triangle of one bin into `target`, in binning order
pub fn rasterize_tile<T: PixelTarget + ?Sized>(
    bin: &[BinnedTriangle],
    shader: &dyn PixelShader,
    target: &mut T,
) -> usize {
    bin.iter()
        .map(|entry| match rasterize_triangle(&entry.triangle, shader, target) {
            TriangleResult::Rasterized { pixels_written } => pixels_written,
            _ => 0,
        })
        .sum()
}

/// Walk the non-empty tiles one after another on the calling thread
pub fn dispatch_serial(
    bins: &TileBins,
    color: &mut [PixelRgba32],
    depth: &mut [f32],
    shader: &dyn PixelShader,
) -> DispatchStats {
    let grid = bins.grid();
    let stride = grid.viewport().stride();
    let mut stats = DispatchStats::default();

    for index in bins.non_empty_tiles() {
        let mut view = FrameView::new(color, depth, stride, grid.tile_rect(index));
        stats.pixels_written += rasterize_tile(bins.bin(index), shader, &mut view);
        stats.tiles += 1;
    }

    count_add!(crate::perf::FUNCTION_COUNTERS.tiles_dispatched, stats.tiles);
    stats
}

/// One pool task per non-empty tile, all writing into the shared buffers.
/// Returns after every task has finished.
pub fn dispatch_parallel(
    pool: &ThreadPool,
    bins: &TileBins,
    color: &mut [PixelRgba32],
    depth: &mut [f32],
    shader: &dyn PixelShader,
) -> DispatchStats {
    let tiles = split_into_tiles(color, depth, bins.grid(), |index| !bins.bin(index).is_empty());
    let tile_count = tiles.len();

    let pixels_written = pool.install(|| {
        tiles
            .into_par_iter()
            // Bins vary wildly in cost; keep every tile a separate task.
            .with_max_len(1)
            .map(|mut tile| {
                let bin = bins.bin(tile.index());
                rasterize_tile(bin, shader, &mut tile)
            })
            .sum::<usize>()
    });

    count_add!(crate::perf::FUNCTION_COUNTERS.tiles_dispatched, tile_count);
    DispatchStats {
        tiles: tile_count,
        pixels_written,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rendering::binning::TileGrid;
    use crate::rendering::framebuffer::DEPTH_FAR;
    use crate::rendering::shader::SolidColor;
    use crate::rendering::vertex::{Triangle, Vertex};
    use crate::rendering::viewport::Viewport;
    use glam::Vec4;

    fn screen_triangle(points: [(f32, f32); 3], ndc_z: f32) -> Triangle {
        points.map(|(x, y)| Vertex {
            position: Vec4::new(x, y, 1.0 / ndc_z, 1.0),
            ..Vertex::default()
        })
    }

    fn binned(viewport: Viewport, triangles: &[Triangle]) -> TileBins {
        let mut bins = TileBins::new(TileGrid::new(viewport, 4, 3));
        for tri in triangles {
            bins.add_triangle(tri, 0.0);
        }
        bins
    }

    #[test]
    fn straddling_triangle_is_drawn_once_per_pixel() {
        let viewport = Viewport::new(0, 0, 32, 24);
        let tri = screen_triangle([(1.0, 1.0), (1.0, 23.0), (31.0, 23.0)], 0.5);
        let bins = binned(viewport, &[tri]);
        assert!(bins.total_entries() > 1);

        let mut color = vec![PixelRgba32::BLACK; viewport.pixel_count()];
        let mut depth = vec![DEPTH_FAR; viewport.pixel_count()];
        let stats = dispatch_serial(&bins, &mut color, &mut depth, &SolidColor(Vec4::ONE));

        let covered = color.iter().filter(|&&p| p == PixelRgba32::WHITE).count();
        assert_eq!(stats.pixels_written, covered);
        assert_eq!(stats.tiles, bins.non_empty_tiles().count());
    }

    #[test]
    fn parallel_matches_serial() {
        let viewport = Viewport::new(0, 0, 40, 30);
        let triangles = [
            screen_triangle([(0.0, 0.0), (0.0, 30.0), (40.0, 30.0)], 0.6),
            screen_triangle([(5.0, 2.0), (12.0, 28.0), (38.0, 9.0)], 0.3),
            screen_triangle([(20.0, 5.0), (20.0, 25.0), (35.0, 25.0)], 0.45),
        ];
        let bins = binned(viewport, &triangles);
        let shader = |f: &Vertex| {
            Vec4::new(f.position.x / 40.0, f.position.y / 30.0, f.position.z, 1.0)
        };

        let mut serial_color = vec![PixelRgba32::BLACK; viewport.pixel_count()];
        let mut serial_depth = vec![DEPTH_FAR; viewport.pixel_count()];
        let serial = dispatch_serial(&bins, &mut serial_color, &mut serial_depth, &shader);

        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let mut parallel_color = vec![PixelRgba32::BLACK; viewport.pixel_count()];
        let mut parallel_depth = vec![DEPTH_FAR; viewport.pixel_count()];
        let parallel = dispatch_parallel(
            &pool,
            &bins,
            &mut parallel_color,
            &mut parallel_depth,
            &shader,
        );

        assert_eq!(serial, parallel);
        assert_eq!(serial_color, parallel_color);
        assert_eq!(serial_depth, parallel_depth);
    }

    #[test]
    fn empty_bins_dispatch_nothing() {
        let viewport = Viewport::new(0, 0, 16, 16);
        let bins = binned(viewport, &[]);
        let mut color = vec![PixelRgba32::BLACK; viewport.pixel_count()];
        let mut depth = vec![DEPTH_FAR; viewport.pixel_count()];

        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let stats = dispatch_parallel(&pool, &bins, &mut color, &mut depth, &SolidColor(Vec4::ONE));
        assert_eq!(stats, DispatchStats::default());
        assert!(depth.iter().all(|&d| d == DEPTH_FAR));
    }
}
