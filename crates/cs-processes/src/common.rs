//! Common utilities for process calculations.

use cs_core::numeric::{ensure_finite, ensure_positive};
use cs_core::{Field, FieldMap};
use cs_process::{ProcessContext, ProcessError, ProcessResult};

use crate::error::{ParamError, ParamResult};

/// Ensure a value is finite, returning ParamError if not.
pub fn check_finite(value: f64, what: &'static str) -> ParamResult<f64> {
    ensure_finite(value, what).map_err(|_| ParamError::NonPhysical { what })
}

/// Ensure a value is finite and strictly positive.
pub fn check_positive(value: f64, what: &'static str) -> ParamResult<f64> {
    ensure_positive(value, what).map_err(|_| ParamError::NonPhysical { what })
}

/// A per-element parameter: one value everywhere, or a full profile.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Uniform(f64),
    Values(Field),
}

impl Profile {
    pub fn uniform(value: f64) -> ParamResult<Self> {
        Ok(Self::Uniform(check_finite(value, "profile value")?))
    }

    pub fn values(values: Field) -> ParamResult<Self> {
        if values.is_empty() {
            return Err(ParamError::InvalidArg {
                what: "profile must not be empty",
            });
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ParamError::NonPhysical {
                what: "profile value",
            });
        }
        Ok(Self::Values(values))
    }

    /// Expand to a field of length `n` for variable `var` of the calling process.
    pub fn resolve(&self, ctx: &ProcessContext<'_>, var: &str, n: usize) -> ProcessResult<Field> {
        match self {
            Profile::Uniform(v) => Ok(Field::from_element(n, *v)),
            Profile::Values(values) if values.len() == n => Ok(values.clone()),
            Profile::Values(values) => Err(ProcessError::ShapeMismatch {
                process: ctx.name().to_string(),
                name: var.to_string(),
                expected: n,
                actual: values.len(),
            }),
        }
    }
}

impl From<f64> for Profile {
    fn from(value: f64) -> Self {
        Profile::Uniform(value)
    }
}

/// Tendency map with a single entry.
pub fn single(var: &str, tendency: Field) -> FieldMap {
    FieldMap::from_iter([(var.to_string(), tendency)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_finite() {
        assert_eq!(check_finite(1.0, "test"), Ok(1.0));
        assert!(check_finite(f64::INFINITY, "test").is_err());
        assert!(check_finite(f64::NAN, "test").is_err());
    }

    #[test]
    fn test_check_positive() {
        assert!(check_positive(2.0, "tau").is_ok());
        assert!(check_positive(0.0, "tau").is_err());
        assert!(check_positive(-1.0, "tau").is_err());
    }

    #[test]
    fn test_profile_validation() {
        assert!(Profile::values(Field::zeros(0)).is_err());
        assert!(Profile::values(Field::from_vec(vec![1.0, f64::NAN])).is_err());
        assert!(Profile::uniform(f64::INFINITY).is_err());
        assert_eq!(Profile::from(2.5), Profile::Uniform(2.5));
    }
}
