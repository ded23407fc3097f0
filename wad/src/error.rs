use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WadError {
    #[error("Cannot open `{path}`: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    #[error("File is too small to be a WAD archive")]
    TooSmall,

    #[error("Invalid WAD magic value")]
    BadMagic,

    #[error("Directory extends beyond end of file")]
    BadDirectory,

    #[error("Entry `{name}` extends beyond end of file")]
    EntryOutOfBounds { name: String },

    #[error("Entry `{name}` is compressed, compressed entries are not supported")]
    CompressedEntry { name: String },
}
