//! Error types for the CLI

use std::path::PathBuf;

use kssh_common::telemetry::TelemetryError;

/// CLI Result type
pub type Result<T> = std::result::Result<T, Error>;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Provision(#[from] kssh_common::Error),

    #[error("failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0}")]
    Telemetry(#[from] TelemetryError),
}

impl Error {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error
    ///
    /// Failures before the first cluster call exit with 2, everything else
    /// with 1, so scripts can tell "nothing was touched" apart.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Provision(e) if e.is_pre_apply() => 2,
            Error::ReadFile { .. } => 2,
            _ => 1,
        }
    }
}
