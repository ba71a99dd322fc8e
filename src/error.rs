//! Error types for the event filter pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// All variants are fatal; nothing is retried. The binary turns any of them
/// into a message on stderr and exit status 1.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The required input path was not supplied.
    #[error("no input file given")]
    Usage,

    /// The input path does not exist.
    #[error("File '{}' does not exist", path.display())]
    NotFound { path: PathBuf },

    /// The input contained a malformed row.
    #[error("malformed CSV input: {source}")]
    Parse {
        #[from]
        source: csv::Error,
    },

    /// An output (or input) file could not be opened or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}
