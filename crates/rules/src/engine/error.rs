//! Errors that abort an engine run for a target file.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The results directory could not be created.
    #[error("cannot create results directory {path}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target path contains characters that would escape its quoting.
    #[error("target path cannot be quoted safely for the shell: {0}")]
    UnsafeTargetPath(PathBuf),

    /// A result file could not be opened for writing.
    #[error("cannot open result file {path}: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias for engine runs.
pub type Result<T> = std::result::Result<T, EngineError>;
