//! Error types for building reference processes.

use cs_process::ProcessError;
use thiserror::Error;

/// Errors raised when a process is constructed with unusable parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}

pub type ParamResult<T> = Result<T, ParamError>;

impl From<ParamError> for ProcessError {
    fn from(e: ParamError) -> Self {
        match e {
            ParamError::NonPhysical { what } => ProcessError::InvalidArg { what },
            ParamError::InvalidArg { what } => ProcessError::InvalidArg { what },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ParamError::NonPhysical {
            what: "heat capacity",
        };
        assert!(err.to_string().contains("heat capacity"));
    }

    #[test]
    fn error_conversion() {
        let err: ProcessError = ParamError::InvalidArg { what: "test" }.into();
        assert!(matches!(err, ProcessError::InvalidArg { what: "test" }));
    }
}
