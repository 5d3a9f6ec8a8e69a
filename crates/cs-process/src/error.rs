//! Error types for process tree and time-stepping operations.

use cs_core::CsError;
use thiserror::Error;

/// Errors encountered while building, composing or integrating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessError {
    #[error("Invalid timestep: {what} (got {value})")]
    InvalidTimestep { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Process '{process}' referenced unknown state variable '{name}'")]
    UnknownVariable { process: String, name: String },

    #[error("Process '{process}': shape mismatch for '{name}' (expected length {expected}, got {actual})")]
    ShapeMismatch {
        process: String,
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown process: {what}")]
    UnknownProcess { what: String },

    #[error("Duplicate sub-process name '{name}' under '{parent}'")]
    DuplicateName { parent: String, name: String },

    #[error("No convergence after {years} years (last year-over-year change {delta})")]
    NonConvergence { years: usize, delta: f64 },

    #[error("Process '{process}' failed: {message}")]
    Failed { process: String, message: String },

    #[error(transparent)]
    Core(#[from] CsError),
}

pub type ProcessResult<T> = Result<T, ProcessError>;

impl ProcessError {
    /// Attach the offending process name to a container-level error.
    pub(crate) fn in_process(process: &str, err: CsError) -> Self {
        match err {
            CsError::UnknownVariable { name } => ProcessError::UnknownVariable {
                process: process.to_string(),
                name,
            },
            CsError::ShapeMismatch {
                name,
                expected,
                actual,
            } => ProcessError::ShapeMismatch {
                process: process.to_string(),
                name,
                expected,
                actual,
            },
            other => ProcessError::Core(other),
        }
    }
}
