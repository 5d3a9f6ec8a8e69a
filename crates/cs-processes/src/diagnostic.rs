//! Processes that publish or consume diagnostics.

use cs_core::{Field, FieldMap};
use cs_process::{Process, ProcessContext, ProcessError, ProcessResult};

use crate::common::{check_positive, single};
use crate::error::{ParamError, ParamResult};

/// Publishes a fixed field under a diagnostic name every time it runs.
#[derive(Debug, Clone)]
pub struct ConstantDiagnostic {
    name: String,
    values: Field,
}

impl ConstantDiagnostic {
    pub fn new(name: impl Into<String>, values: Field) -> ParamResult<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ParamError::NonPhysical {
                what: "diagnostic value",
            });
        }
        Ok(Self {
            name: name.into(),
            values,
        })
    }

    pub fn diagnostic(&self) -> &str {
        &self.name
    }
}

impl Process for ConstantDiagnostic {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        ctx.set_diagnostic(&self.name, self.values.clone())?;
        Ok(FieldMap::new())
    }
}

/// Heats a variable by a flux published by another process:
/// `tendency = flux / heat_capacity`.
///
/// The flux is named by its qualified path, e.g. `"shortwave/insolation/ASR"`.
#[derive(Debug, Clone)]
pub struct AbsorbedForcing {
    var: String,
    diagnostic: String,
    heat_capacity: f64,
}

impl AbsorbedForcing {
    /// `heat_capacity` is per unit area (J m⁻² K⁻¹) when the flux is in W m⁻².
    pub fn new(
        var: impl Into<String>,
        diagnostic: impl Into<String>,
        heat_capacity: f64,
    ) -> ParamResult<Self> {
        Ok(Self {
            var: var.into(),
            diagnostic: diagnostic.into(),
            heat_capacity: check_positive(heat_capacity, "heat capacity")?,
        })
    }
}

impl Process for AbsorbedForcing {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let n = ctx.state_field(&self.var)?.len();
        let flux = ctx.diagnostic(&self.diagnostic).ok_or_else(|| {
            ctx.fail(format!("diagnostic '{}' has not been published", self.diagnostic))
        })?;
        if flux.len() != n {
            return Err(ProcessError::ShapeMismatch {
                process: ctx.name().to_string(),
                name: self.diagnostic.clone(),
                expected: n,
                actual: flux.len(),
            });
        }
        Ok(single(&self.var, flux / self.heat_capacity))
    }
}
