use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SopError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("I/O error at {}: {source}", path.display())]
    FileError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

impl SopError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn at(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> SopError {
        let path = path.into();
        move |source| SopError::FileError { path, source }
    }
}
