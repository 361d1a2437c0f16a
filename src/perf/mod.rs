/// Performance measurement utilities
/// Used for instrumentation only; nothing in the pipeline branches on timings
pub mod profiling;

pub use profiling::{CounterSnapshot, FunctionCounters, Profiler, FUNCTION_COUNTERS};

use std::time::{Duration, Instant};

/// Scope timer that reports its lifetime at debug level when dropped
pub struct PerfTimer {
    name: &'static str,
    start: Instant,
}

impl PerfTimer {
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfTimer {
    fn drop(&mut self) {
        log::debug!("[PERF] {}: {}μs", self.name, self.elapsed().as_micros());
    }
}

/// Per-phase timings of one draw call, in milliseconds
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub setup_ms: f32,
    pub binning_ms: f32,
    pub raster_ms: f32,
}

impl PhaseTimings {
    pub fn total_ms(&self) -> f32 {
        self.setup_ms + self.binning_ms + self.raster_ms
    }
}

/// Macro for timing the rest of the enclosing scope
#[macro_export]
macro_rules! perf_scope {
    ($name:expr) => {
        let _timer = $crate::perf::PerfTimer::new($name);
    };
}
