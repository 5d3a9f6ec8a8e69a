//! The [`Process`] trait, its time-type tag, and the per-call context.

use std::fmt;
use std::str::FromStr;

use cs_core::{Field, FieldMap, ProcessId};

use crate::diagnostics::DiagnosticStore;
use crate::error::{ProcessError, ProcessResult};
use crate::time::TimeRecord;
use crate::tree::ProcessTree;

/// How a process's output enters the step.
///
/// Declaration order is the composition order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeType {
    /// Publishes diagnostics only; returned tendencies are discarded.
    Diagnostic,
    /// Rate computed from the state at the start of the step.
    Explicit,
    /// Rate computed from the state already advanced by explicit processes.
    Implicit,
    /// Absolute change over one step, seen after explicit and implicit updates.
    Adjustment,
}

impl TimeType {
    /// All time types in composition order.
    pub const ALL: [TimeType; 4] = [
        TimeType::Diagnostic,
        TimeType::Explicit,
        TimeType::Implicit,
        TimeType::Adjustment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimeType::Diagnostic => "diagnostic",
            TimeType::Explicit => "explicit",
            TimeType::Implicit => "implicit",
            TimeType::Adjustment => "adjustment",
        }
    }

    pub(crate) fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeType {
    type Err = ProcessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or(ProcessError::InvalidArg {
                what: "time type must be diagnostic, explicit, implicit or adjustment",
            })
    }
}

/// Where a process is listed relative to its own sub-processes when the
/// tree is partitioned by time type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Traversal {
    /// Parent before children.
    #[default]
    TopDown,
    /// Children before parent.
    BottomUp,
}

/// One physical mechanism in the process tree.
///
/// `compute` returns a mapping from state variable name to tendency. Keys
/// must name existing state variables and values must have the same length
/// as the state field. Variables left out get a zero tendency. What the
/// values mean depends on the process's [`TimeType`]: a rate per second for
/// explicit and implicit processes, the total change over one step for
/// adjustment processes, and nothing for diagnostic processes.
///
/// Implementations may publish diagnostics through
/// [`ProcessContext::set_diagnostic`] into their own name space; state is
/// read-only here and only the owning [`Model`](crate::Model) ever writes it.
pub trait Process: Send {
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        let _ = ctx;
        Ok(FieldMap::new())
    }
}

/// A process with no tendencies of its own, used to group sub-processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct Coupler;

impl Process for Coupler {}

/// Adapter turning a closure into a [`Process`]; see [`process_fn`].
pub struct FnProcess<F>(F);

/// Wrap a closure as a process, handy for tests and one-off couplings.
pub fn process_fn<F>(f: F) -> FnProcess<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> ProcessResult<FieldMap> + Send,
{
    FnProcess(f)
}

impl<F> Process for FnProcess<F>
where
    F: FnMut(&mut ProcessContext<'_>) -> ProcessResult<FieldMap> + Send,
{
    fn compute(&mut self, ctx: &mut ProcessContext<'_>) -> ProcessResult<FieldMap> {
        (self.0)(ctx)
    }
}

/// Read-only window onto the state variables one process is attached to.
///
/// Holds names, not copies: values always come from the model's canonical
/// store, so two processes attached to the same name see the same field.
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    store: &'a FieldMap,
    names: &'a [String],
}

impl<'a> StateView<'a> {
    pub(crate) fn new(store: &'a FieldMap, names: &'a [String]) -> Self {
        Self { store, names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &'a [String] {
        self.names
    }

    /// `None` if the variable is not attached to this process.
    pub fn get(&self, name: &str) -> Option<&'a Field> {
        if self.names.iter().any(|n| n == name) {
            self.store.get(name)
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Field)> + use<'a> {
        let store = self.store;
        let names = self.names;
        names
            .iter()
            .filter_map(move |n| store.get(n).map(|f| (n.as_str(), f)))
    }

    pub fn to_field_map(&self) -> FieldMap {
        self.iter().map(|(n, f)| (n.to_string(), f.clone())).collect()
    }
}

/// Everything a process can see while it computes.
pub struct ProcessContext<'a> {
    pub(crate) id: ProcessId,
    pub(crate) name: &'a str,
    pub(crate) time_type: TimeType,
    pub(crate) time: &'a TimeRecord,
    pub(crate) timestep: f64,
    pub(crate) state: &'a FieldMap,
    pub(crate) attached: &'a [String],
    pub(crate) tree: &'a ProcessTree,
    pub(crate) diagnostics: &'a mut DiagnosticStore,
}

impl<'a> ProcessContext<'a> {
    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn time_type(&self) -> TimeType {
        self.time_type
    }

    /// This process's own time counters.
    pub fn time(&self) -> &TimeRecord {
        self.time
    }

    /// Timestep (seconds) the tendencies are being composed for.
    pub fn timestep(&self) -> f64 {
        self.timestep
    }

    /// The whole model state, as provisionally advanced for this stage.
    pub fn state(&self) -> &FieldMap {
        self.state
    }

    /// The state variables this process is attached to.
    pub fn attached_state(&self) -> StateView<'_> {
        StateView::new(self.state, self.attached)
    }

    /// A state field that must exist.
    pub fn state_field(&self, name: &str) -> ProcessResult<&Field> {
        self.state
            .get(name)
            .ok_or_else(|| ProcessError::UnknownVariable {
                process: self.name.to_string(),
                name: name.to_string(),
            })
    }

    /// A diagnostic this process published, or another process's given as
    /// `path/name` with the publisher's path below the root.
    pub fn diagnostic(&self, name: &str) -> Option<&Field> {
        self.diagnostics.resolve(self.tree, self.id, name)
    }

    /// A diagnostic published by a known process.
    pub fn diagnostic_of(&self, owner: ProcessId, name: &str) -> Option<&Field> {
        self.diagnostics.get(owner, name)
    }

    pub fn diagnostics(&self) -> &DiagnosticStore {
        self.diagnostics
    }

    /// Publish a diagnostic in this process's own name space.
    pub fn set_diagnostic(&mut self, name: &str, field: Field) -> ProcessResult<()> {
        self.diagnostics.set(self.id, name, field)
    }

    /// Shorthand for a failure raised by a process implementation.
    pub fn fail(&self, message: impl Into<String>) -> ProcessError {
        ProcessError::Failed {
            process: self.name.to_string(),
            message: message.into(),
        }
    }
}
