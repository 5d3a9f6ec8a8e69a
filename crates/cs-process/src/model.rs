//! The [`Model`]: a process tree together with the state it advances.

use cs_core::{Field, FieldMap, ProcessId};
use indexmap::IndexMap;
use tracing::debug;

use crate::classify::ProcessTypeList;
use crate::diagnostics::{DiagnosticStore, qualified_name};
use crate::error::{ProcessError, ProcessResult};
use crate::process::{Coupler, Process, StateView, TimeType, Traversal};
use crate::time::TimeRecord;
use crate::tree::{ProcessNode, ProcessTree};

/// Default number of `compute` passes in [`Model::compute_diagnostics`].
pub const DEFAULT_DIAGNOSTIC_ITERATIONS: usize = 3;

#[derive(Clone, Copy, Debug)]
enum Timing {
    Seconds(f64),
    StepsPerYear(f64),
}

impl Timing {
    fn record(self) -> ProcessResult<TimeRecord> {
        match self {
            Timing::Seconds(dt) => TimeRecord::from_timestep(dt),
            Timing::StepsPerYear(n) => TimeRecord::from_steps_per_year(n),
        }
    }
}

/// Description of a process to place in the tree.
///
/// Without an explicit timestep a sub-process inherits its parent's; the
/// root defaults to one day.
pub struct ProcessSpec {
    name: String,
    time_type: TimeType,
    traversal: Traversal,
    timing: Option<Timing>,
    state: Vec<(String, Option<Field>)>,
    process: Box<dyn Process>,
}

impl ProcessSpec {
    pub fn new(name: impl Into<String>, time_type: TimeType, process: impl Process + 'static) -> Self {
        Self {
            name: name.into(),
            time_type,
            traversal: Traversal::default(),
            timing: None,
            state: Vec::new(),
            process: Box::new(process),
        }
    }

    /// An explicit process with no tendencies of its own.
    pub fn coupler(name: impl Into<String>) -> Self {
        Self::new(name, TimeType::Explicit, Coupler)
    }

    pub fn timestep(mut self, seconds: f64) -> Self {
        self.timing = Some(Timing::Seconds(seconds));
        self
    }

    pub fn num_steps_per_year(mut self, n: f64) -> Self {
        self.timing = Some(Timing::StepsPerYear(n));
        self
    }

    pub fn time_type(mut self, time_type: TimeType) -> Self {
        self.time_type = time_type;
        self
    }

    pub fn traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Attach a state variable, creating it with `initial` if the model
    /// does not have it yet. An existing variable keeps its current value
    /// and must have the same length.
    pub fn state(mut self, name: impl Into<String>, initial: Field) -> Self {
        self.state.push((name.into(), Some(initial)));
        self
    }

    /// Attach a state variable that must already exist.
    pub fn attach(mut self, name: impl Into<String>) -> Self {
        self.state.push((name.into(), None));
        self
    }
}

/// Per-stage tendencies from the most recent [`Model::compute`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StageTendencies {
    pub explicit: FieldMap,
    pub implicit: FieldMap,
    /// Already divided by the timestep.
    pub adjustment: FieldMap,
}

/// A process tree and the canonical state it advances.
///
/// The model owns the only copy of every state variable; processes refer to
/// variables by name. See [`Model::compute`] for how tendencies are
/// composed and [`Model::step_forward`] for how they are applied.
pub struct Model {
    pub(crate) tree: ProcessTree,
    pub(crate) state: FieldMap,
    pub(crate) diagnostics: DiagnosticStore,
    pub(crate) tendencies: FieldMap,
    pub(crate) stages: StageTendencies,
    pub(crate) process_types: Option<ProcessTypeList>,
    pub(crate) timeave: FieldMap,
}

impl Model {
    /// Build a model whose root is described by `root`.
    pub fn new(root: ProcessSpec) -> ProcessResult<Self> {
        let time = match root.timing {
            Some(t) => t.record()?,
            None => TimeRecord::default(),
        };
        let node = ProcessNode {
            name: root.name,
            time_type: root.time_type,
            traversal: root.traversal,
            time,
            parent: None,
            children: Vec::new(),
            state_vars: Vec::new(),
            process: root.process,
        };
        let mut model = Self {
            tree: ProcessTree::new(node),
            state: FieldMap::new(),
            diagnostics: DiagnosticStore::new(),
            tendencies: FieldMap::new(),
            stages: StageTendencies::default(),
            process_types: None,
            timeave: FieldMap::new(),
        };
        model.attach_state(ProcessId::ROOT, root.state)?;
        Ok(model)
    }

    fn attach_state(
        &mut self,
        id: ProcessId,
        entries: Vec<(String, Option<Field>)>,
    ) -> ProcessResult<()> {
        let process = self.tree.get(id)?.name.clone();
        // Validate everything first so a failed attach leaves no trace.
        let mut lengths: IndexMap<&str, usize> = IndexMap::new();
        for (name, initial) in &entries {
            let known = self
                .state
                .get(name)
                .map(|f| f.len())
                .or_else(|| lengths.get(name.as_str()).copied());
            match (known, initial) {
                (Some(expected), Some(f)) if expected != f.len() => {
                    return Err(ProcessError::ShapeMismatch {
                        process,
                        name: name.clone(),
                        expected,
                        actual: f.len(),
                    });
                }
                (None, Some(f)) => {
                    lengths.insert(name.as_str(), f.len());
                }
                (None, None) => {
                    return Err(ProcessError::UnknownVariable {
                        process,
                        name: name.clone(),
                    });
                }
                _ => {}
            }
        }
        for (name, initial) in entries {
            if let (false, Some(f)) = (self.state.contains(&name), initial) {
                self.tendencies.insert(name.clone(), Field::zeros(f.len()));
                self.state.insert(name.clone(), f);
            }
            let node = self.tree.get_mut(id)?;
            if !node.state_vars.contains(&name) {
                node.state_vars.push(name);
            }
        }
        Ok(())
    }

    /// Add (or overwrite, keeping the length) a state variable owned by
    /// the root process.
    pub fn add_state(&mut self, name: impl Into<String>, field: Field) -> ProcessResult<()> {
        let name = name.into();
        if self.state.contains(&name) {
            self.set_state(&name, field)?;
            return self.attach_state(ProcessId::ROOT, vec![(name, None)]);
        }
        self.attach_state(ProcessId::ROOT, vec![(name, Some(field))])
    }

    /// Replace the value of an existing state variable.
    pub fn set_state(&mut self, name: &str, field: Field) -> ProcessResult<()> {
        let root = self.tree.root().name.clone();
        let existing = self
            .state
            .get_mut(name)
            .ok_or_else(|| ProcessError::UnknownVariable {
                process: root.clone(),
                name: name.to_string(),
            })?;
        if existing.len() != field.len() {
            return Err(ProcessError::ShapeMismatch {
                process: root,
                name: name.to_string(),
                expected: existing.len(),
                actual: field.len(),
            });
        }
        *existing = field;
        Ok(())
    }

    /// Insert a sub-process below `parent`.
    pub fn add_subprocess(&mut self, parent: ProcessId, spec: ProcessSpec) -> ProcessResult<ProcessId> {
        let time = match spec.timing {
            Some(t) => t.record()?,
            None => TimeRecord::from_steps_per_year(self.tree.get(parent)?.time.num_steps_per_year())?,
        };
        let node = ProcessNode {
            name: spec.name,
            time_type: spec.time_type,
            traversal: spec.traversal,
            time,
            parent: None,
            children: Vec::new(),
            state_vars: Vec::new(),
            process: spec.process,
        };
        let id = self.tree.insert_child(parent, node)?;
        if let Err(e) = self.attach_state(id, spec.state) {
            self.tree.remove_subtree(id)?;
            return Err(e);
        }
        debug!(process = %self.tree.get(id)?.name, id = %id, "added sub-process");
        Ok(id)
    }

    /// Remove a sub-process and everything below it. Diagnostics they
    /// published go with them; state variables stay.
    pub fn remove_subprocess(&mut self, id: ProcessId) -> ProcessResult<()> {
        let removed = self.tree.remove_subtree(id)?;
        self.diagnostics.remove_owned_by(&removed);
        debug!(id = %id, removed = removed.len(), "removed sub-process");
        Ok(())
    }

    pub fn set_time_type(&mut self, id: ProcessId, time_type: TimeType) -> ProcessResult<()> {
        self.tree.set_time_type(id, time_type)
    }

    pub fn set_traversal(&mut self, id: ProcessId, traversal: Traversal) -> ProcessResult<()> {
        self.tree.set_traversal(id, traversal)
    }

    /// The time-type partition, rebuilt if the tree changed since last use.
    pub fn process_types(&mut self) -> &ProcessTypeList {
        let tree = &self.tree;
        let list = match self.process_types.take() {
            Some(list) if list.is_current(tree) => list,
            _ => {
                debug!(version = tree.version(), "rebuilding process type list");
                ProcessTypeList::build(tree)
            }
        };
        self.process_types.insert(list)
    }

    /// Compute tendencies and apply them to the state for one timestep,
    /// then advance the time counters of every process once.
    pub fn step_forward(&mut self) -> ProcessResult<()> {
        self.compute()?;
        let dt = self.timestep();
        self.state.add_scaled(&self.tendencies, dt)?;
        for id in self.tree.walk() {
            let node = self.tree.get_mut(id)?;
            node.time = node.time.advance();
        }
        Ok(())
    }

    /// Run [`compute`](Self::compute) `num_iter` times without stepping, so
    /// mutually dependent diagnostics can settle.
    pub fn compute_diagnostics(&mut self, num_iter: usize) -> ProcessResult<()> {
        for _ in 0..num_iter {
            self.compute()?;
        }
        Ok(())
    }

    // ── timestep ───────────────────────────────────────────────────────

    /// Root timestep in seconds.
    pub fn timestep(&self) -> f64 {
        self.tree.root().time.timestep()
    }

    /// Set the root timestep (seconds). Resets the root's time counters.
    pub fn set_timestep(&mut self, seconds: f64) -> ProcessResult<()> {
        self.set_process_timestep(ProcessId::ROOT, seconds)
    }

    /// Set the root timestep from a step count per calendar year.
    pub fn set_num_steps_per_year(&mut self, n: f64) -> ProcessResult<()> {
        let record = TimeRecord::from_steps_per_year(n)?;
        self.tree.get_mut(ProcessId::ROOT)?.time = record;
        Ok(())
    }

    pub fn set_process_timestep(&mut self, id: ProcessId, seconds: f64) -> ProcessResult<()> {
        let record = TimeRecord::from_timestep(seconds)?;
        self.tree.get_mut(id)?.time = record;
        Ok(())
    }

    // ── read access ────────────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.tree.root().name
    }

    /// Root time counters.
    pub fn time(&self) -> &TimeRecord {
        &self.tree.root().time
    }

    pub fn process_time(&self, id: ProcessId) -> ProcessResult<&TimeRecord> {
        Ok(&self.tree.get(id)?.time)
    }

    /// Net tendencies from the most recent `compute`.
    pub fn tendencies(&self) -> &FieldMap {
        &self.tendencies
    }

    pub fn stage_tendencies(&self) -> &StageTendencies {
        &self.stages
    }

    /// Time means from the most recent integration call.
    pub fn timeave(&self) -> &FieldMap {
        &self.timeave
    }

    pub fn state(&self) -> &FieldMap {
        &self.state
    }

    pub fn diagnostics(&self) -> &DiagnosticStore {
        &self.diagnostics
    }

    /// A diagnostic by qualified name: `path/name` with the publisher's path
    /// below the root, or a bare name for the root's own diagnostics.
    pub fn diagnostic(&self, qualified: &str) -> Option<&Field> {
        self.diagnostics
            .resolve(&self.tree, ProcessId::ROOT, qualified)
    }

    /// Every diagnostic keyed by its qualified name.
    pub fn qualified_diagnostics(&self) -> ProcessResult<FieldMap> {
        self.diagnostics
            .iter()
            .map(|(owner, name, f)| Ok((qualified_name(&self.tree, owner, name)?, f.clone())))
            .collect()
    }

    /// The state variables `id` is attached to.
    pub fn process_state(&self, id: ProcessId) -> ProcessResult<StateView<'_>> {
        Ok(StateView::new(&self.state, &self.tree.get(id)?.state_vars))
    }

    /// Diagnostics published by `id`.
    pub fn process_diagnostics(&self, id: ProcessId) -> ProcessResult<FieldMap> {
        self.tree.get(id)?;
        Ok(self.diagnostics.owned_by(id))
    }

    pub fn process_name(&self, id: ProcessId) -> ProcessResult<&str> {
        Ok(&self.tree.get(id)?.name)
    }

    pub fn time_type(&self, id: ProcessId) -> ProcessResult<TimeType> {
        Ok(self.tree.get(id)?.time_type)
    }

    pub fn traversal(&self, id: ProcessId) -> ProcessResult<Traversal> {
        Ok(self.tree.get(id)?.traversal)
    }

    pub fn parent(&self, id: ProcessId) -> ProcessResult<Option<ProcessId>> {
        Ok(self.tree.get(id)?.parent)
    }

    pub fn children(&self, id: ProcessId) -> ProcessResult<&[ProcessId]> {
        Ok(&self.tree.get(id)?.children)
    }

    /// Look up a process by `/`-separated names below the root.
    pub fn find(&self, path: &str) -> Option<ProcessId> {
        self.tree.find(path)
    }

    pub fn path_of(&self, id: ProcessId) -> ProcessResult<String> {
        self.tree.path_of(id)
    }

    /// Every process, root included, in walk order.
    pub fn walk(&self) -> Vec<ProcessId> {
        self.tree.walk()
    }

    pub fn process_count(&self) -> usize {
        self.tree.len()
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name())
            .field("processes", &self.process_count())
            .field("state", &self.state.names().collect::<Vec<_>>())
            .field("time", self.time())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::process_fn;

    fn field(v: &[f64]) -> Field {
        Field::from_column_slice(v)
    }

    #[test]
    fn subprocess_inherits_parent_timestep() {
        let mut model = Model::new(ProcessSpec::coupler("root").timestep(3600.0)).unwrap();
        let child = model
            .add_subprocess(ProcessId::ROOT, ProcessSpec::coupler("child"))
            .unwrap();
        let inherited = model.process_time(child).unwrap();
        assert!((inherited.timestep() - 3600.0).abs() < 1e-9);
        assert_eq!(
            inherited.num_steps_per_year(),
            model.time().num_steps_per_year()
        );
        let other = model
            .add_subprocess(ProcessId::ROOT, ProcessSpec::coupler("other").timestep(60.0))
            .unwrap();
        assert_eq!(model.process_time(other).unwrap().timestep(), 60.0);
    }

    #[test]
    fn attached_state_aliases_canonical_field() {
        let mut model =
            Model::new(ProcessSpec::coupler("root").state("Ts", field(&[288.0, 280.0]))).unwrap();
        let child = model
            .add_subprocess(
                ProcessId::ROOT,
                ProcessSpec::coupler("child").state("Ts", field(&[0.0, 0.0])),
            )
            .unwrap();
        // Existing value wins: both views see the same field.
        assert_eq!(model.process_state(child).unwrap().get("Ts").unwrap()[0], 288.0);
        model.set_state("Ts", field(&[300.0, 290.0])).unwrap();
        assert_eq!(model.process_state(child).unwrap().get("Ts").unwrap()[0], 300.0);
        assert_eq!(
            model.process_state(ProcessId::ROOT).unwrap().get("Ts").unwrap()[0],
            300.0
        );
    }

    #[test]
    fn failed_attach_leaves_tree_unchanged() {
        let mut model = Model::new(ProcessSpec::coupler("root").state("Ts", field(&[1.0]))).unwrap();
        let err = model
            .add_subprocess(
                ProcessId::ROOT,
                ProcessSpec::coupler("bad").state("Ts", field(&[1.0, 2.0])),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::ShapeMismatch { .. }));
        assert_eq!(model.process_count(), 1);
        assert!(model.find("bad").is_none());

        let err = model
            .add_subprocess(ProcessId::ROOT, ProcessSpec::coupler("ghost").attach("q"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::UnknownVariable { .. }));
    }

    #[test]
    fn repeated_state_in_one_spec_must_agree_in_length() {
        let err = Model::new(
            ProcessSpec::coupler("root")
                .state("x", Field::zeros(1))
                .state("x", Field::zeros(3)),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ProcessError::ShapeMismatch { ref name, expected: 1, actual: 3, .. } if name == "x"
        ));

        let model = Model::new(
            ProcessSpec::coupler("root")
                .state("x", Field::zeros(2))
                .state("x", Field::from_element(2, 7.0)),
        )
        .unwrap();
        // First value wins, as for a variable that already exists.
        assert_eq!(model.state().get("x").unwrap().as_slice(), &[0.0, 0.0]);
        assert_eq!(model.process_state(ProcessId::ROOT).unwrap().len(), 1);

        let mut model = Model::new(ProcessSpec::coupler("root")).unwrap();
        let err = model
            .add_subprocess(
                ProcessId::ROOT,
                ProcessSpec::coupler("child")
                    .state("q", Field::zeros(2))
                    .state("q", Field::zeros(4)),
            )
            .unwrap_err();
        assert!(matches!(err, ProcessError::ShapeMismatch { .. }));
        assert!(!model.state().contains("q"));
        assert_eq!(model.process_count(), 1);
    }

    #[test]
    fn invalid_timesteps_are_rejected() {
        assert!(Model::new(ProcessSpec::coupler("root").timestep(0.0)).is_err());
        let mut model = Model::new(ProcessSpec::coupler("root")).unwrap();
        assert!(model.set_timestep(-1.0).is_err());
        assert!(model.set_num_steps_per_year(f64::NAN).is_err());
        model.set_num_steps_per_year(4.0).unwrap();
        assert_eq!(model.time().num_steps_per_year(), 4.0);
    }

    #[test]
    fn removing_subprocess_drops_its_diagnostics() {
        let mut model = Model::new(ProcessSpec::coupler("root").state("Ts", field(&[1.0]))).unwrap();
        let diag = model
            .add_subprocess(
                ProcessId::ROOT,
                ProcessSpec::new(
                    "albedo",
                    TimeType::Diagnostic,
                    process_fn(|ctx| {
                        ctx.set_diagnostic("albedo", Field::from_element(1, 0.3))?;
                        Ok(FieldMap::new())
                    }),
                ),
            )
            .unwrap();
        model.compute().unwrap();
        assert_eq!(model.process_diagnostics(diag).unwrap().len(), 1);
        assert_eq!(model.diagnostic("albedo/albedo").unwrap()[0], 0.3);
        model.remove_subprocess(diag).unwrap();
        assert!(model.diagnostic("albedo/albedo").is_none());
        assert!(model.process_diagnostics(diag).is_err());
    }
}
