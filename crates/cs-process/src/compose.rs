//! Tendency composition across the four process types.

use cs_core::{FieldMap, ProcessId};
use tracing::trace;

use crate::error::{ProcessError, ProcessResult};
use crate::model::{Model, StageTendencies};
use crate::process::{Coupler, ProcessContext, TimeType};

impl Model {
    /// Compute the net tendency of every state variable for one timestep
    /// without changing the state.
    ///
    /// Stages run in a fixed order, each seeing the state as left by the
    /// previous ones:
    ///
    /// 1. diagnostic processes (tendencies discarded, diagnostics kept);
    /// 2. explicit processes, whose summed rate is then applied to the
    ///    state provisionally (`state += rate * dt`);
    /// 3. implicit processes, evaluated against that state and applied the
    ///    same way;
    /// 4. adjustment processes, whose absolute changes are divided by `dt`.
    ///
    /// The state is then put back exactly as it was on entry, also when a
    /// process fails, and the three contributions are summed. Variables no
    /// process touched get a zero tendency. Diagnostics written along the
    /// way are kept.
    pub fn compute(&mut self) -> ProcessResult<&FieldMap> {
        self.process_types();
        let entry = self.state.clone();
        let staged = self.compose_stages();
        self.state = entry;
        let stages = staged?;

        let mut total = FieldMap::zeros_like(&self.state);
        total.add_assign(&stages.explicit)?;
        total.add_assign(&stages.implicit)?;
        total.add_assign(&stages.adjustment)?;
        self.tendencies = total;
        self.stages = stages;
        Ok(&self.tendencies)
    }

    fn compose_stages(&mut self) -> ProcessResult<StageTendencies> {
        let dt = self.timestep();

        self.run_stage(TimeType::Diagnostic)?;

        let explicit = self.run_stage(TimeType::Explicit)?;
        self.state.add_scaled(&explicit, dt)?;

        let implicit = self.run_stage(TimeType::Implicit)?;
        self.state.add_scaled(&implicit, dt)?;

        let mut adjustment = self.run_stage(TimeType::Adjustment)?;
        adjustment.scale(1.0 / dt);

        Ok(StageTendencies {
            explicit,
            implicit,
            adjustment,
        })
    }

    /// Sum of the outputs of every process of one type, covering every
    /// state variable.
    fn run_stage(&mut self, time_type: TimeType) -> ProcessResult<FieldMap> {
        let ids: Vec<ProcessId> = match &self.process_types {
            Some(list) => list.of(time_type).to_vec(),
            None => Vec::new(),
        };
        let timestep = self.timestep();
        let mut sum = FieldMap::zeros_like(&self.state);

        for id in ids {
            let mut process = {
                let node = self.tree.get_mut(id)?;
                std::mem::replace(&mut node.process, Box::new(Coupler))
            };
            let node = self.tree.get(id)?;
            trace!(process = %node.name, stage = %time_type, "computing");
            let mut ctx = ProcessContext {
                id,
                name: node.name.as_str(),
                time_type,
                time: &node.time,
                timestep,
                state: &self.state,
                attached: node.state_vars.as_slice(),
                tree: &self.tree,
                diagnostics: &mut self.diagnostics,
            };
            let output = process.compute(&mut ctx);
            self.tree.get_mut(id)?.process = process;
            let output = output?;

            let name = &self.tree.get(id)?.name;
            sum.check_covers(&output)
                .map_err(|e| ProcessError::in_process(name, e))?;
            if time_type != TimeType::Diagnostic {
                sum.add_assign(&output)?;
            }
        }
        Ok(sum)
    }
}
