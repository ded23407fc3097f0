use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BspError {
    #[error("Cannot open `{path}`: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("File is too small to be a BSP file")]
    TooSmall,

    #[error("Unsupported BSP version {version}")]
    UnsupportedVersion { version: i32 },

    #[error("Lump {name} is not valid")]
    InvalidLump { name: &'static str },

    #[error("Lump {name} extends beyond end of file")]
    LumpOutOfBounds { name: &'static str },

    #[error("Lump {name} is not aligned for its record type")]
    MisalignedLump { name: &'static str },

    #[error("Index {index} into lump {lump} is out of range")]
    IndexOutOfRange { lump: &'static str, index: usize },

    #[error("Face has {vertex_count} vertices, a polygon needs at least 3")]
    DegenerateFace { vertex_count: usize },

    #[error("Unknown plane type {value}")]
    UnknownPlaneType { value: i32 },

    #[error("Texture header extends beyond end of lump")]
    BadTextureDirectory,

    #[error("Mip texture record is truncated")]
    TruncatedMipTexture,

    #[error("Color palette extends beyond end of texture record")]
    PaletteOutOfBounds,

    #[error("Texture data extends beyond color palette")]
    TexelsOutOfBounds,

    #[error("Cannot parse entity text")]
    ParseEntities,
}
