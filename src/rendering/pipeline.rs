/// Draw-call driver
///
/// `RasterEngine` owns the bound buffers, shaders, transforms, tile bins and
/// worker pool. One `draw` runs vertex shading, screen mapping, binning and
/// tile dispatch, and returns only after every pixel of the draw is written.
use super::binning::{TileBins, TileGrid};
use super::dispatch::{dispatch_parallel, dispatch_serial, DispatchStats};
use super::framebuffer::{clear_color, clear_depth, FrameView, PixelRgba32};
use super::rasterizer::{classify, rasterize_triangle, TriangleResult};
use super::shader::{PixelShader, Transforms, VertexShader};
use super::vertex::{Triangle, Vertex};
use super::viewport::{map_to_screen, PixelRect, Viewport};
use crate::config::{DispatchMode, RasterConfig};
use crate::error::{BufferKind, RasterError, RasterResult};
use crate::perf::{PhaseTimings, Profiler};
use crate::{count_add, count_call, perf_scope};
use glam::Mat4;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::Arc;

/// Per-draw statistics
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct DrawStats {
    pub triangles_submitted: usize,
    /// Back-facing after screen mapping
    pub culled: usize,
    /// Zero or non-finite screen-space area
    pub degenerate: usize,
    /// w = 0 or non-finite depth after the perspective divide
    pub rejected: usize,
    /// Entirely outside the viewport
    pub dropped: usize,
    pub bin_entries: usize,
    pub tiles_dispatched: usize,
    pub pixels_written: usize,
    pub timings: PhaseTimings,
    /// Estimated CPU cycles at the configured clock
    pub cycles: u64,
}

impl DrawStats {
    #[inline]
    pub fn elapsed_ms(&self) -> f32 {
        self.timings.total_ms()
    }

    /// Triangles that reached the rasterizer or a bin
    #[inline]
    pub fn triangles_accepted(&self) -> usize {
        self.triangles_submitted - self.culled - self.degenerate - self.rejected
    }
}

/// Result of transforming one submitted triple
#[derive(Copy, Clone, Debug)]
enum Setup {
    Ready { triangle: Triangle, min_depth: f32 },
    Culled,
    Degenerate,
    Rejected,
}

/// Vertex shading, perspective divide, screen mapping and reciprocal depth for
/// one triangle, followed by the winding test.
fn setup_triangle(
    triple: &[Vertex],
    order: [usize; 3],
    vertex_shader: &dyn VertexShader,
    transforms: &Transforms,
    viewport: &Viewport,
) -> Setup {
    let mut triangle = order.map(|i| triple[i]);
    let mut min_depth = f32::INFINITY;

    for vertex in &mut triangle {
        vertex.position = vertex_shader.shade(vertex, transforms);
        if !map_to_screen(vertex, viewport) {
            return Setup::Rejected;
        }
        min_depth = min_depth.min(vertex.position.z);

        let inv_z = 1.0 / vertex.position.z;
        if !inv_z.is_finite() {
            return Setup::Rejected;
        }
        vertex.position.z = inv_z;
    }

    match classify(&triangle) {
        Some(TriangleResult::BackFacing) => Setup::Culled,
        Some(_) => Setup::Degenerate,
        None => Setup::Ready { triangle, min_depth },
    }
}

/// Borrowed handles a draw call runs against, checked up front so every
/// error is reported before the first pixel write
struct DrawBindings<'a> {
    pool: &'a ThreadPool,
    vertex_shader: &'a dyn VertexShader,
    pixel_shader: &'a dyn PixelShader,
    color: &'a mut [PixelRgba32],
    depth: &'a mut [f32],
}

impl<'a> DrawBindings<'a> {
    fn validate(
        vertex_count: usize,
        viewport: &Viewport,
        pool: Option<&'a ThreadPool>,
        vertex_shader: Option<&'a dyn VertexShader>,
        pixel_shader: Option<&'a dyn PixelShader>,
        color: Option<&'a mut [PixelRgba32]>,
        depth: Option<&'a mut [f32]>,
    ) -> RasterResult<Self> {
        if vertex_count % 3 != 0 {
            return Err(RasterError::InvalidVertexCount { count: vertex_count });
        }

        let color = color.ok_or(RasterError::NullBuffer(BufferKind::Color))?;
        let depth = depth.ok_or(RasterError::NullBuffer(BufferKind::Depth))?;

        let expected = viewport.pixel_count();
        for (kind, actual) in [(BufferKind::Color, color.len()), (BufferKind::Depth, depth.len())] {
            if actual != expected {
                return Err(RasterError::BufferSizeMismatch {
                    kind,
                    expected,
                    actual,
                });
            }
        }

        let (Some(vertex_shader), Some(pixel_shader)) = (vertex_shader, pixel_shader) else {
            return Err(RasterError::ShadersNotBound);
        };
        let pool = pool.ok_or(RasterError::NotInitialized)?;
        if viewport.is_empty() {
            return Err(RasterError::EmptyViewport);
        }

        Ok(Self {
            pool,
            vertex_shader,
            pixel_shader,
            color,
            depth,
        })
    }
}

/// CPU triangle rasterizer with tile-binned parallel dispatch
pub struct RasterEngine {
    config: RasterConfig,
    profiler: Profiler,
    pool: Option<ThreadPool>,
    workers: usize,

    viewport: Viewport,
    bins: TileBins,

    color: Option<Vec<PixelRgba32>>,
    depth: Option<Vec<f32>>,
    vertex_shader: Option<Arc<dyn VertexShader>>,
    pixel_shader: Option<Arc<dyn PixelShader>>,
    transforms: Transforms,

    /// Per-draw setup scratch, kept to reuse its allocation
    setup: Vec<Setup>,
}

impl RasterEngine {
    pub fn new(config: RasterConfig) -> Self {
        let profiler = Profiler::new(config.cpu_ghz);
        Self {
            config,
            profiler,
            pool: None,
            workers: 1,
            viewport: Viewport::default(),
            bins: TileBins::default(),
            color: None,
            depth: None,
            vertex_shader: None,
            pixel_shader: None,
            transforms: Transforms::IDENTITY,
            setup: Vec::new(),
        }
    }

    /// Detect hardware parallelism (or use the configured worker count),
    /// build the worker pool and size the tile grid. Must be called before
    /// the first `draw`; calling it again rebuilds the pool.
    pub fn initialize(&mut self) -> RasterResult<()> {
        let workers = self
            .config
            .worker_threads
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
            })
            .max(1);

        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("raster-worker-{i}"))
            .build()?;

        self.pool = Some(pool);
        self.workers = workers;
        self.rebuild_grid();

        log::info!(
            "Raster engine initialized: {} workers, {}x{} tile grid",
            workers,
            self.bins.grid().tiles_x(),
            self.bins.grid().tiles_y()
        );
        Ok(())
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.pool.is_some()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn config(&self) -> &RasterConfig {
        &self.config
    }

    #[inline]
    pub fn set_dispatch_mode(&mut self, mode: DispatchMode) {
        self.config.dispatch = mode;
    }

    /// Set the target rectangle and recompute the tile grid.
    ///
    /// Bound buffers must hold `(x + width) * (y + height)` elements.
    pub fn set_viewport(&mut self, x: usize, y: usize, width: usize, height: usize) {
        self.viewport = Viewport::new(x, y, width, height);
        self.rebuild_grid();
        log::info!(
            "Viewport set to {}x{} at ({}, {}), {}x{} tiles of {:?}",
            width,
            height,
            x,
            y,
            self.bins.grid().tiles_x(),
            self.bins.grid().tiles_y(),
            self.bins.grid().tile_size()
        );
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn rebuild_grid(&mut self) {
        let (cols, rows) = self.config.grid_for_workers(self.workers);
        self.bins.reconfigure(TileGrid::new(self.viewport, cols, rows));
    }

    /// Bind the color buffer, returning the previously bound one
    pub fn set_render_target(&mut self, color: Vec<PixelRgba32>) -> Option<Vec<PixelRgba32>> {
        self.color.replace(color)
    }

    /// Bind the depth buffer, returning the previously bound one
    pub fn set_depth_buffer(&mut self, depth: Vec<f32>) -> Option<Vec<f32>> {
        self.depth.replace(depth)
    }

    pub fn take_render_target(&mut self) -> Option<Vec<PixelRgba32>> {
        self.color.take()
    }

    pub fn take_depth_buffer(&mut self) -> Option<Vec<f32>> {
        self.depth.take()
    }

    #[inline]
    pub fn color_buffer(&self) -> Option<&[PixelRgba32]> {
        self.color.as_deref()
    }

    #[inline]
    pub fn depth_buffer(&self) -> Option<&[f32]> {
        self.depth.as_deref()
    }

    /// Fill the bound color buffer with `color` and reset the bound depth
    /// buffer to far
    pub fn clear(&mut self, color: PixelRgba32) {
        if let Some(pixels) = self.color.as_mut() {
            clear_color(pixels, color);
        }
        if let Some(depth) = self.depth.as_mut() {
            clear_depth(depth);
        }
    }

    pub fn set_shaders<V, P>(&mut self, vertex_shader: V, pixel_shader: P)
    where
        V: VertexShader + 'static,
        P: PixelShader + 'static,
    {
        self.vertex_shader = Some(Arc::new(vertex_shader));
        self.pixel_shader = Some(Arc::new(pixel_shader));
    }

    /// Swap only the pixel shader, keeping the bound vertex shader
    pub fn set_pixel_shader<P: PixelShader + 'static>(&mut self, pixel_shader: P) {
        self.pixel_shader = Some(Arc::new(pixel_shader));
    }

    pub fn set_transforms(&mut self, model: Mat4, view: Mat4, projection: Mat4) {
        self.transforms = Transforms::new(model, view, projection);
    }

    #[inline]
    pub fn transforms(&self) -> &Transforms {
        &self.transforms
    }

    /// Screen rectangles of the current tile grid, row-major
    pub fn tile_rects(&self) -> Vec<PixelRect> {
        let grid = self.bins.grid();
        (0..grid.tile_count()).map(|i| grid.tile_rect(i)).collect()
    }

    /// Bins as filled by the last tiled draw
    #[inline]
    pub fn bins(&self) -> &TileBins {
        &self.bins
    }

    /// Draw an implicit triangle list.
    ///
    /// Every error is reported before any pixel is written. Back-facing,
    /// degenerate, rejected and off-viewport triangles are skipped and
    /// counted in the returned stats.
    pub fn draw(&mut self, vertices: &[Vertex]) -> RasterResult<DrawStats> {
        perf_scope!("RasterEngine::draw");
        let Self {
            config,
            profiler,
            pool,
            viewport,
            bins,
            color,
            depth,
            vertex_shader,
            pixel_shader,
            transforms,
            setup,
            ..
        } = self;
        let DrawBindings {
            pool,
            vertex_shader,
            pixel_shader,
            color,
            depth,
        } = DrawBindings::validate(
            vertices.len(),
            viewport,
            pool.as_ref(),
            vertex_shader.as_deref(),
            pixel_shader.as_deref(),
            color.as_deref_mut(),
            depth.as_deref_mut(),
        )?;

        count_call!(crate::perf::FUNCTION_COUNTERS.draw_calls);
        count_add!(crate::perf::FUNCTION_COUNTERS.vertices_shaded, vertices.len());

        let profiler = *profiler;
        let mut stats = DrawStats {
            triangles_submitted: vertices.len() / 3,
            ..DrawStats::default()
        };

        // Vertex setup
        let t0 = profiler.now();
        let order = config.front_face.vertex_order();
        let viewport = *viewport;
        let transforms = *transforms;
        let shade = |triple: &[Vertex]| {
            setup_triangle(triple, order, vertex_shader, &transforms, &viewport)
        };
        match config.dispatch {
            DispatchMode::TiledParallel => pool.install(|| {
                vertices
                    .par_chunks_exact(3)
                    .map(shade)
                    .collect_into_vec(setup)
            }),
            _ => {
                setup.clear();
                setup.extend(vertices.chunks_exact(3).map(shade));
            }
        }

        for entry in setup.iter() {
            match entry {
                Setup::Ready { .. } => {}
                Setup::Culled => stats.culled += 1,
                Setup::Degenerate => stats.degenerate += 1,
                Setup::Rejected => stats.rejected += 1,
            }
        }
        let t1 = profiler.now();
        stats.timings.setup_ms = profiler.elapsed_ms(t0, t1);

        let ready = setup.iter().filter_map(|entry| match entry {
            Setup::Ready { triangle, min_depth } => Some((triangle, *min_depth)),
            _ => None,
        });

        let dispatch = match config.dispatch {
            DispatchMode::Immediate => {
                let mut view = FrameView::new(color, depth, viewport.stride(), viewport.rect());
                let mut pixels_written = 0;
                for (triangle, _) in ready {
                    match rasterize_triangle(triangle, pixel_shader, &mut view) {
                        TriangleResult::Rasterized { pixels_written: n } => pixels_written += n,
                        TriangleResult::Outside => stats.dropped += 1,
                        _ => {}
                    }
                }
                DispatchStats {
                    tiles: 0,
                    pixels_written,
                }
            }
            mode => {
                bins.clear();
                for (triangle, min_depth) in ready {
                    let added = bins.add_triangle(triangle, min_depth);
                    if added == 0 {
                        log::trace!("triangle outside viewport dropped");
                        stats.dropped += 1;
                    }
                    stats.bin_entries += added;
                }
                let t2 = profiler.now();
                stats.timings.binning_ms = profiler.elapsed_ms(t1, t2);

                if mode == DispatchMode::TiledParallel {
                    dispatch_parallel(pool, bins, color, depth, pixel_shader)
                } else {
                    dispatch_serial(bins, color, depth, pixel_shader)
                }
            }
        };

        stats.tiles_dispatched = dispatch.tiles;
        stats.pixels_written = dispatch.pixels_written;

        let t3 = profiler.now();
        stats.timings.raster_ms =
            (profiler.elapsed_ms(t1, t3) - stats.timings.binning_ms).max(0.0);
        stats.cycles = profiler.ms_to_cycles(stats.elapsed_ms());

        log::debug!(
            "draw: {} tris ({} culled, {} degenerate, {} rejected, {} dropped), {} bin entries, {} tiles, {} px, {:.3}ms (~{} cycles)",
            stats.triangles_submitted,
            stats.culled,
            stats.degenerate,
            stats.rejected,
            stats.dropped,
            stats.bin_entries,
            stats.tiles_dispatched,
            stats.pixels_written,
            stats.elapsed_ms(),
            stats.cycles
        );
        if stats.elapsed_ms() > config.slow_draw_ms {
            log::warn!(
                "Slow draw: {:.2}ms (> {:.1}ms) for {} triangles",
                stats.elapsed_ms(),
                config.slow_draw_ms,
                stats.triangles_submitted
            );
        }

        Ok(stats)
    }
}

impl Default for RasterEngine {
    fn default() -> Self {
        Self::new(RasterConfig::default())
    }
}
