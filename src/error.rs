//! Error types for the raster pipeline

use std::fmt;
use thiserror::Error;

/// Result type for pipeline operations
pub type RasterResult<T> = Result<T, RasterError>;

/// Which of the two bound buffers an error refers to
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BufferKind {
    Color,
    Depth,
}

impl fmt::Display for BufferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferKind::Color => f.write_str("color buffer"),
            BufferKind::Depth => f.write_str("depth buffer"),
        }
    }
}

/// Errors reported by `RasterEngine`. Every variant is raised before any
/// pixel of the draw is written.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("vertex count {count} is not a multiple of 3")]
    InvalidVertexCount { count: usize },

    #[error("no {0} bound")]
    NullBuffer(BufferKind),

    #[error("{kind} holds {actual} elements, viewport needs {expected}")]
    BufferSizeMismatch {
        kind: BufferKind,
        expected: usize,
        actual: usize,
    },

    #[error("vertex and pixel shaders must be bound before drawing")]
    ShadersNotBound,

    #[error("engine used before initialize()")]
    NotInitialized,

    #[error("viewport has zero width or height")]
    EmptyViewport,

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
