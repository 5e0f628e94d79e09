//! Result and Error types for the description module

use std::path::PathBuf;

/// Type alias for `Result<T, description::Error>`
pub type Result<T> = core::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
/// The error type for `mctools-description`
pub enum Error {
    /// Underlying file I/O error
    #[error("failure in file I/O")]
    IOError(#[from] std::io::Error),

    /// The description file could not be found at the resolved path
    #[error("unable to find cache description file {0:?}")]
    MissingFile(PathBuf),

    /// Document is not well formed or a value could not be interpreted
    #[error("invalid cache description ({reason})")]
    InvalidDescription { reason: String },

    /// Writing would truncate the document being read
    #[error("output {0:?} would overwrite the input description")]
    OutputOverwritesInput(PathBuf),
}

impl Error {
    /// Shorthand for an [Error::InvalidDescription]
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDescription {
            reason: reason.into(),
        }
    }
}
