use std::io;
use std::path::PathBuf;

/// Errors that abort an adapter operation.
///
/// A toolchain that exits non-zero is *not* an error here: that outcome is
/// reported through [`BuildOutput::errors`](crate::build::BuildOutput).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not find Cargo.toml in any ancestor of {}", .path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("invalid handler path: {0}")]
    InvalidHandler(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, Error>;
