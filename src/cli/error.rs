//! CLI-level errors (wraps domain and config errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsError;
use crate::domain::TreeError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Tree(#[from] TreeError),

    #[error("{0}")]
    Settings(#[from] SettingsError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) => crate::exitcode::USAGE,
            CliError::Settings(_) => crate::exitcode::CONFIG,
            CliError::Io { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => crate::exitcode::NOINPUT,
                _ => crate::exitcode::IOERR,
            },
            CliError::Tree(e) => match e {
                TreeError::DuplicateKey { .. }
                | TreeError::InvalidKey { .. }
                | TreeError::NodeNotFound { .. }
                | TreeError::ChildrenNotFound { .. } => crate::exitcode::DATAERR,
                TreeError::ActionNotAllowed { .. } | TreeError::InvalidNode(_) => {
                    crate::exitcode::SOFTWARE
                }
            },
        }
    }
}
