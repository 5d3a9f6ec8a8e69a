//! Clamp a variable from below after the other processes have acted.

use cs_core::FieldMap;
use cs_process::{Process, ProcessContext, ProcessResult};

use crate::common::{check_finite, single};
use crate::error::ParamResult;

/// Adjustment that lifts every value below `floor` up to it.
///
/// Returns the total change over the step; values already at or above the
/// floor are left alone.
#[derive(Debug, Clone)]
pub struct FloorAdjustment {
    var: String,
    floor: f64,
}

impl FloorAdjustment {
    pub fn new(var: impl Into<String>, floor: f64) -> ParamResult<Self> {
        Ok(Self {
            var: var.into(),
            floor: check_finite(floor, "floor")?,
        })
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }
}

impl Process for FloorAdjustment {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let x = ctx.state_field(&self.var)?;
        Ok(single(&self.var, x.map(|v| (self.floor - v).max(0.0))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs_core::{Field, ProcessId};
    use cs_process::{Model, ProcessSpec, TimeType};

    #[test]
    fn clamps_after_explicit_cooling() {
        let mut m = Model::new(
            ProcessSpec::coupler("root")
                .timestep(10.0)
                .state("q", Field::from_vec(vec![5.0, 0.5, -1.0])),
        )
        .unwrap();
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "sink",
                TimeType::Explicit,
                crate::ConstantTendency::new("q", crate::Profile::Uniform(-0.1)),
            ),
        )
        .unwrap();
        m.add_subprocess(
            ProcessId::ROOT,
            ProcessSpec::new(
                "floor",
                TimeType::Adjustment,
                FloorAdjustment::new("q", 0.0).unwrap(),
            ),
        )
        .unwrap();

        m.step_forward().unwrap();
        let q = m.state().get("q").unwrap();
        assert!((q[0] - 4.0).abs() < 1e-12);
        assert!(q[1].abs() < 1e-12);
        assert!(q[2].abs() < 1e-12);
    }

    #[test]
    fn rejects_nan_floor() {
        assert!(FloorAdjustment::new("q", f64::NAN).is_err());
    }
}
