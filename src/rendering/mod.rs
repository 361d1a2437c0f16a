//! Software rasterization pipeline
pub mod binning;
pub mod dispatch;
pub mod framebuffer;
pub mod pipeline;
pub mod rasterizer;
pub mod shader;
pub mod shading;
pub mod vertex;
pub mod viewport;

pub use binning::{BinnedTriangle, TileBins, TileGrid};
pub use dispatch::DispatchStats;
pub use framebuffer::{PixelRgba32, DEPTH_FAR};
pub use pipeline::{DrawStats, RasterEngine};
pub use rasterizer::{rasterize_triangle, PixelTarget, TriangleResult};
pub use shader::{MvpVertexShader, PassThrough, PixelShader, SolidColor, Transforms, VertexShader};
pub use shading::{Checkerboard, Lambert, NormalDebug, ShadingConfig, VertexColor};
pub use vertex::{Triangle, Vertex};
pub use viewport::{PixelRect, Viewport};
