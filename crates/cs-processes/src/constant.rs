//! Fixed-rate forcing of one state variable.

use cs_core::FieldMap;
use cs_process::{Process, ProcessContext, ProcessResult};

use crate::common::{Profile, single};

/// Adds the same rate (units per second) to a variable every step.
///
/// Meant as an explicit process; tagged as an adjustment the rate is read as
/// a change per step instead.
#[derive(Debug, Clone)]
pub struct ConstantTendency {
    var: String,
    /// Rate per second, uniform or per element.
    pub rate: Profile,
}

impl ConstantTendency {
    pub fn new(var: impl Into<String>, rate: Profile) -> Self {
        Self {
            var: var.into(),
            rate,
        }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Process for ConstantTendency {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let n = ctx.state_field(&self.var)?.len();
        let rate = self.rate.resolve(ctx, &self.var, n)?;
        Ok(single(&self.var, rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::{Field, ProcessId};
    use cs_process::{Model, ProcessError, ProcessSpec, TimeType};

    fn model(n: usize) -> Model {
        Model::new(
            ProcessSpec::coupler("root")
                .timestep(100.0)
                .state("Ts", Field::zeros(n)),
        )
        .unwrap()
    }

    #[test]
    fn uniform_rate_fills_every_element() {
        let mut m = model(3);
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "heat",
                TimeType::Explicit,
                ConstantTendency::new("Ts", Profile::Uniform(0.01)),
            ),
        )
        .unwrap();
        m.step_forward().unwrap();
        let ts = m.state().get("Ts").unwrap();
        assert!(ts.iter().all(|t| (t - 1.0).abs() < 1e-12));
    }

    #[test]
    fn profile_length_must_match_state() {
        let mut m = model(3);
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "heat",
                TimeType::Explicit,
                ConstantTendency::new("Ts", Profile::Values(Field::zeros(2))),
            ),
        )
        .unwrap();
        assert!(matches!(
            m.compute(),
            Err(ProcessError::ShapeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn missing_variable_is_reported() {
        let mut m = model(1);
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "heat",
                TimeType::Explicit,
                ConstantTendency::new("Tatm", Profile::Uniform(1.0)),
            ),
        )
        .unwrap();
        assert!(matches!(
            m.compute(),
            Err(ProcessError::UnknownVariable { ref name, .. }) if name == "Tatm"
        ));
    }
}
