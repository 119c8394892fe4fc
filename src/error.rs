use std::path::PathBuf;

use crate::codec::chunk::ChunkType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("read past bounded region: need {need} bytes, have {have}")]
    OutOfBounds { need: usize, have: usize },

    #[error("invalid size field width: {0} (expected 2 or 4)")]
    InvalidSizeWidth(u32),

    #[error("integrity check failed for {chunk:?} {field}: expected {expected}, got {actual}")]
    IntegrityCheck {
        chunk: ChunkType,
        field: &'static str,
        expected: u32,
        actual: u32,
    },

    #[error("{chunk:?} declares {count} records but only {len} payload bytes remain")]
    ItemCount { chunk: ChunkType, count: u32, len: usize },

    #[error("{remaining} trailing bytes at offset {offset} do not form a chunk")]
    TrailingBytes { offset: usize, remaining: usize },

    #[error("missing file: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to load {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid config: {0}")]
    Config(String),
}

impl Error {
    /// Wrap this error with the file it was raised for.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            // Already attributed to a file; keep the innermost path.
            e @ Error::File { .. } => e,
            e => Error::File {
                path: path.into(),
                source: Box::new(e),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
