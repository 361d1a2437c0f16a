//! Raster Engine - tile-binned CPU triangle rasterizer
//! Built with compartmentalized benchmarkable components
pub mod config;
pub mod error;
pub mod logging;
pub mod mesh;
pub mod perf;
pub mod rendering;

pub use config::{DispatchMode, FrontFace, RasterConfig};
pub use error::{BufferKind, RasterError, RasterResult};
pub use logging::{init_logging, LoggingConfig};
pub use mesh::Mesh;
pub use perf::{CounterSnapshot, FunctionCounters, Profiler, FUNCTION_COUNTERS};
pub use rendering::{
    DrawStats, PixelRgba32, PixelShader, RasterEngine, Transforms, Vertex, VertexShader, Viewport,
    DEPTH_FAR,
};
