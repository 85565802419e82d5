//! Metavoxel validation and delta errors.

use bitstream::BitError;
use thiserror::Error;

/// Result type for metavoxel operations.
pub type MetavoxelResult<T> = Result<T, MetavoxelError>;

/// Errors that can occur when building metavoxel data or decoding deltas.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum MetavoxelError {
    /// Octree depth beyond the supported maximum.
    #[error("voxel depth {depth} exceeds maximum {max_depth}")]
    DepthTooLarge { depth: u8, max_depth: u8 },

    /// Cell coordinate outside the grid at its depth.
    #[error("voxel coordinate ({x}, {y}, {z}) out of range at depth {depth}")]
    CoordinateOutOfRange { depth: u8, x: u32, y: u32, z: u32 },

    /// Root size must be finite and positive.
    #[error("invalid root size {size}")]
    InvalidSize { size: f32 },

    /// Delta limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: DeltaLimitKind,
        limit: usize,
        actual: usize,
    },

    /// Underlying bitstream failure.
    #[error(transparent)]
    Bitstream(#[from] BitError),
}

/// Specific delta limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeltaLimitKind {
    #[error("changed cells")]
    Changes,
    #[error("octree depth")]
    Depth,
}
