//! Engine configuration
//! Decides how a draw call is executed; never changes what ends up in the buffers
//! except for `front_face`, which selects the accepted winding.

/// How binned triangles reach the rasterizer
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchMode {
    /// Rasterize each triangle straight into the viewport, no binning
    Immediate,
    /// Bin, then walk the non-empty tiles on the calling thread
    TiledSerial,
    /// Bin, then run one worker-pool task per non-empty tile
    TiledParallel,
}

/// Winding of submitted triangles that counts as front-facing (in NDC, y up)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrontFace {
    /// Vertices are used in submission order
    CounterClockwise,
    /// Vertices 1 and 2 of every triple are swapped before shading
    Clockwise,
}

impl FrontFace {
    /// Submission-order indices to read for one triangle
    #[inline]
    pub const fn vertex_order(self) -> [usize; 3] {
        match self {
            FrontFace::CounterClockwise => [0, 1, 2],
            FrontFace::Clockwise => [0, 2, 1],
        }
    }
}

#[derive(Clone, Debug)]
pub struct RasterConfig {
    pub dispatch: DispatchMode,
    pub front_face: FrontFace,
    /// Worker count; `None` uses the detected hardware concurrency
    pub worker_threads: Option<usize>,
    /// Tile grid (columns, rows); `None` uses 2×workers by workers
    pub tile_grid: Option<(usize, usize)>,
    /// Clock used to turn draw time into an estimated cycle count
    pub cpu_ghz: f32,
    /// Draws slower than this are reported with a warning
    pub slow_draw_ms: f32,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            dispatch: DispatchMode::TiledParallel,
            front_face: FrontFace::CounterClockwise,
            worker_threads: None,
            tile_grid: None,
            cpu_ghz: 3.8,
            slow_draw_ms: 16.0,
        }
    }
}

impl RasterConfig {
    /// Tile grid for a given worker count, honouring the override
    pub fn grid_for_workers(&self, workers: usize) -> (usize, usize) {
        let workers = workers.max(1);
        match self.tile_grid {
            Some((cols, rows)) => (cols.max(1), rows.max(1)),
            None => (workers * 2, workers),
        }
    }
}
