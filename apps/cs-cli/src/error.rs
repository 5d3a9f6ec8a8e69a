//! Error type for the command-line front end.

use std::path::PathBuf;

use cs_process::ProcessError;
use cs_project::ProjectError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        source: ProjectError,
    },

    #[error("Model error: {0}")]
    Model(#[from] ProcessError),

    #[error("No process at path '{0}'")]
    ProcessNotFound(String),

    #[error("Failed to write {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CliResult<T> = Result<T, CliError>;
