/// Instrumentation: wall-clock profiler and raster call counters
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Wall-clock profiler with a fixed clock rate for cycle estimates
#[derive(Debug, Clone, Copy)]
pub struct Profiler {
    cpu_ghz: f32,
}

impl Profiler {
    pub fn new(cpu_ghz: f32) -> Self {
        Self { cpu_ghz }
    }

    #[inline]
    pub fn now(&self) -> Instant {
        Instant::now()
    }

    /// Milliseconds between two time stamps; zero if `end` precedes `start`
    #[inline]
    pub fn elapsed_ms(&self, start: Instant, end: Instant) -> f32 {
        end.saturating_duration_since(start).as_secs_f64() as f32 * 1000.0
    }

    /// Estimated CPU cycles spent in `elapsed_ms` at the configured clock
    #[inline]
    pub fn ms_to_cycles(&self, elapsed_ms: f32) -> u64 {
        let cycles_per_ms = f64::from(self.cpu_ghz) * 1_000_000.0;
        (f64::from(elapsed_ms.max(0.0)) * cycles_per_ms) as u64
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new(3.8)
    }
}

/// Thread-safe counters for rasterizer hot paths
pub struct FunctionCounters {
    // Pipeline counters
    pub draw_calls: AtomicU64,
    pub vertices_shaded: AtomicU64,
    pub triangles_binned: AtomicU64,
    pub tiles_dispatched: AtomicU64,

    // Rasterization counters
    pub rasterize_triangle_calls: AtomicU64,
    pub triangles_culled: AtomicU64,
    pub pixels_tested: AtomicU64,
    pub depth_passed: AtomicU64,
    pub depth_failed: AtomicU64,
}

impl FunctionCounters {
    pub const fn new() -> Self {
        Self {
            draw_calls: AtomicU64::new(0),
            vertices_shaded: AtomicU64::new(0),
            triangles_binned: AtomicU64::new(0),
            tiles_dispatched: AtomicU64::new(0),
            rasterize_triangle_calls: AtomicU64::new(0),
            triangles_culled: AtomicU64::new(0),
            pixels_tested: AtomicU64::new(0),
            depth_passed: AtomicU64::new(0),
            depth_failed: AtomicU64::new(0),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.draw_calls.store(0, Ordering::Relaxed);
        self.vertices_shaded.store(0, Ordering::Relaxed);
        self.triangles_binned.store(0, Ordering::Relaxed);
        self.tiles_dispatched.store(0, Ordering::Relaxed);
        self.rasterize_triangle_calls.store(0, Ordering::Relaxed);
        self.triangles_culled.store(0, Ordering::Relaxed);
        self.pixels_tested.store(0, Ordering::Relaxed);
        self.depth_passed.store(0, Ordering::Relaxed);
        self.depth_failed.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            draw_calls: self.draw_calls.load(Ordering::Relaxed),
            vertices_shaded: self.vertices_shaded.load(Ordering::Relaxed),
            triangles_binned: self.triangles_binned.load(Ordering::Relaxed),
            tiles_dispatched: self.tiles_dispatched.load(Ordering::Relaxed),
            rasterize_triangle_calls: self.rasterize_triangle_calls.load(Ordering::Relaxed),
            triangles_culled: self.triangles_culled.load(Ordering::Relaxed),
            pixels_tested: self.pixels_tested.load(Ordering::Relaxed),
            depth_passed: self.depth_passed.load(Ordering::Relaxed),
            depth_failed: self.depth_failed.load(Ordering::Relaxed),
        }
    }
}

impl Default for FunctionCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub draw_calls: u64,
    pub vertices_shaded: u64,
    pub triangles_binned: u64,
    pub tiles_dispatched: u64,
    pub rasterize_triangle_calls: u64,
    pub triangles_culled: u64,
    pub pixels_tested: u64,
    pub depth_passed: u64,
    pub depth_failed: u64,
}

impl CounterSnapshot {
    /// Share of depth tests that passed, in percent
    pub fn depth_pass_rate(&self) -> Option<f64> {
        if self.pixels_tested == 0 {
            return None;
        }
        Some(self.depth_passed as f64 / self.pixels_tested as f64 * 100.0)
    }

    /// Log a formatted report at info level
    pub fn log_report(&self) {
        log::info!("=== Raster counters ===");
        log::info!("  draw calls:           {:12}", self.draw_calls);
        log::info!("  vertices shaded:      {:12}", self.vertices_shaded);
        log::info!("  triangles binned:     {:12}", self.triangles_binned);
        log::info!("  tiles dispatched:     {:12}", self.tiles_dispatched);
        log::info!("  rasterize calls:      {:12}", self.rasterize_triangle_calls);
        log::info!("  triangles culled:     {:12}", self.triangles_culled);
        log::info!("  pixels tested:        {:12}", self.pixels_tested);
        log::info!("  depth test passed:    {:12}", self.depth_passed);
        log::info!("  depth test failed:    {:12}", self.depth_failed);
        if let Some(rate) = self.depth_pass_rate() {
            log::info!("  depth pass rate:      {:11.2}%", rate);
        }
    }
}

/// Global function counters instance
pub static FUNCTION_COUNTERS: FunctionCounters = FunctionCounters::new();

/// Increment a counter (only when the profiling feature is enabled)
#[macro_export]
macro_rules! count_call {
    ($counter:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    };
}

/// Add to a counter (only when the profiling feature is enabled)
#[macro_export]
macro_rules! count_add {
    ($counter:expr, $value:expr) => {
        #[cfg(feature = "profiling")]
        {
            $counter.fetch_add($value as u64, std::sync::atomic::Ordering::Relaxed);
        }
    };
}
