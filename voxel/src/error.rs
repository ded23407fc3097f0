use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoxelError {
    #[error("Object of {width}x{height}x{depth} is too large for a magicavoxel model")]
    TooLarge { width: u32, height: u32, depth: u32 },

    #[error("Object of {width}x{height}x{depth} is too small for a magicavoxel model")]
    TooSmall { width: u32, height: u32, depth: u32 },

    #[error("Object has generated no valid voxels")]
    NoVoxels,

    #[error("Row {row} has no edge intersection")]
    NoIntersection { row: u32 },

    #[error("Row {row} starts after it ends")]
    InconsistentRow { row: u32 },

    #[error("Cannot write `{path}`: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}
