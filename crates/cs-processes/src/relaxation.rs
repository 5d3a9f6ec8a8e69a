//! Newtonian relaxation toward a prescribed profile.

use cs_core::units::{Time, as_seconds};
use cs_core::FieldMap;
use cs_process::{Process, ProcessContext, ProcessResult};

use crate::common::{Profile, check_positive, single};
use crate::error::ParamResult;

/// Tendency `(target - x) / tau` for one variable.
///
/// Works as an explicit or an implicit process. As an implicit process it
/// sees the state after the explicit stage has been applied.
#[derive(Debug, Clone)]
pub struct Relaxation {
    var: String,
    pub target: Profile,
    tau: f64,
}

impl Relaxation {
    /// Relax `var` toward `target` with e-folding time `tau`.
    pub fn new(var: impl Into<String>, target: Profile, tau: Time) -> ParamResult<Self> {
        let tau = check_positive(as_seconds(tau), "relaxation time")?;
        Ok(Self {
            var: var.into(),
            target,
            tau,
        })
    }

    /// Relaxation time in seconds.
    pub fn tau(&self) -> f64 {
        self.tau
    }
}

impl Process for Relaxation {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let x = ctx.state_field(&self.var)?;
        let target = self.target.resolve(ctx, &self.var, x.len())?;
        Ok(single(&self.var, (target - x) / self.tau))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::units::{days, s};
    use cs_core::{Field, ProcessId};
    use cs_process::{Model, ProcessSpec, TimeType};

    #[test]
    fn rejects_non_positive_tau() {
        assert!(Relaxation::new("Ts", Profile::Uniform(0.0), s(0.0)).is_err());
        assert!(Relaxation::new("Ts", Profile::Uniform(0.0), s(-5.0)).is_err());
        assert_eq!(
            Relaxation::new("Ts", Profile::Uniform(0.0), days(1.0))
                .unwrap()
                .tau(),
            86_400.0
        );
    }

    #[test]
    fn tendency_points_at_target() {
        let mut m = Model::new(
            ProcessSpec::coupler("root")
                .timestep(1.0)
                .state("Ts", Field::from_vec(vec![0.0, 20.0])),
        )
        .unwrap();
        let relax = Relaxation::new("Ts", Profile::Uniform(10.0), s(5.0)).unwrap();
        m.add_subprocess(ProcessId::ROOT, ProcessSpec::new("relax", TimeType::Explicit, relax))
            .unwrap();
        let tend = m.compute().unwrap().get("Ts").unwrap().clone();
        assert_eq!(tend.as_slice(), &[2.0, -2.0]);
    }

    #[test]
    fn implicit_relaxation_sees_explicit_update() {
        let mut m = Model::new(
            ProcessSpec::coupler("root")
                .timestep(1.0)
                .state("Ts", Field::zeros(1)),
        )
        .unwrap();
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "push",
                TimeType::Explicit,
                crate::ConstantTendency::new("Ts", Profile::Uniform(4.0)),
            ),
        )
        .unwrap();
        let relax = Relaxation::new("Ts", Profile::Uniform(0.0), s(2.0)).unwrap();
        m.add_subprocess(ProcessId::ROOT, ProcessSpec::new("relax", TimeType::Implicit, relax))
            .unwrap();
        m.compute().unwrap();
        // Implicit stage sees Ts = 4 and relaxes at (0 - 4) / 2.
        assert_eq!(m.stage_tendencies().implicit.get("Ts").unwrap()[0], -2.0);
        assert_eq!(m.tendencies().get("Ts").unwrap()[0], 2.0);
    }
}
