//! Result and Error types for the mcc module

use std::path::PathBuf;

/// Type alias for `Result<T, mcc::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `mctools-mcc`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// Failure reading or rewriting the cache description
    #[error("failed cache description operation")]
    DescriptionError(#[from] mctools_description::Error),

    /// Structure of a data file does not match the chunk grammar
    #[error("malformed cache data at byte {offset} (expected {expected}, found {found})")]
    MalformedCache {
        expected: String,
        found: String,
        offset: u64,
    },

    /// Only caches of version 2.0 and below can be converted
    #[error("unsupported cache version {0} (must be 2.0 or lower)")]
    UnsupportedVersion(f64),

    /// A data file was not found at the resolved path
    #[error("unable to open cache data file {0:?}")]
    MissingFile(PathBuf),

    /// Cache type is neither `OneFile` nor `OneFilePerFrame`
    #[error("unknown cache type {0:?}")]
    UnknownCacheType(String),

    /// Per-frame file name without a usable `Frame<N>[Tick<M>]` suffix
    #[error("unable to derive a frame time from {0:?}")]
    InvalidFrameName(String),

    /// Two frame files map onto the same converted file name
    #[error("more than one frame file would be written to {0:?}")]
    DuplicateFrameOutput(PathBuf),

    /// Converting would truncate one of the files being read
    #[error("output {0:?} would overwrite the input cache")]
    OutputOverwritesInput(PathBuf),

    /// Converted block no longer fits in a 32-bit length field
    #[error("converted block of {0} bytes exceeds the 32-bit length limit")]
    BlockTooLarge(usize),
}

impl Error {
    /// Shorthand for an [Error::MalformedCache]
    pub(crate) fn malformed(
        expected: impl Into<String>,
        found: impl Into<String>,
        offset: u64,
    ) -> Self {
        Self::MalformedCache {
            expected: expected.into(),
            found: found.into(),
            offset,
        }
    }

    /// True for structural errors in the data files
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedCache { .. })
    }
}
