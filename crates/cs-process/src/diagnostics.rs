//! Per-process diagnostic store.

use cs_core::{Field, FieldMap, ProcessId};
use indexmap::IndexMap;

use crate::error::{ProcessError, ProcessResult};
use crate::tree::ProcessTree;

/// Diagnostics published by the processes of one model.
///
/// Every process has its own name space: two processes may both publish
/// `"OLR"` without interfering. Any process may read any other process's
/// diagnostics by qualifying the name with the publisher's path below the
/// root, e.g. `"column_a/rad/OLR"`.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticStore {
    entries: IndexMap<ProcessId, IndexMap<String, Field>>,
}

impl DiagnosticStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of diagnostics across all processes.
    pub fn len(&self) -> usize {
        self.entries.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, owner: ProcessId, name: &str) -> Option<&Field> {
        self.entries.get(&owner).and_then(|own| own.get(name))
    }

    pub fn contains(&self, owner: ProcessId, name: &str) -> bool {
        self.get(owner, name).is_some()
    }

    /// Every diagnostic with its publisher, in publication order.
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &str, &Field)> {
        self.entries
            .iter()
            .flat_map(|(owner, own)| own.iter().map(move |(n, f)| (*owner, n.as_str(), f)))
    }

    /// Publish or refresh a diagnostic in `owner`'s name space.
    pub(crate) fn set(&mut self, owner: ProcessId, name: &str, field: Field) -> ProcessResult<()> {
        if name.is_empty() || name.contains('/') {
            return Err(ProcessError::InvalidArg {
                what: "diagnostic names must be non-empty and must not contain '/'",
            });
        }
        let own = self.entries.entry(owner).or_default();
        match own.get_mut(name) {
            Some(slot) => *slot = field,
            None => {
                own.insert(name.to_string(), field);
            }
        }
        Ok(())
    }

    /// Diagnostics published by one process.
    pub fn owned_by(&self, owner: ProcessId) -> FieldMap {
        self.entries
            .get(&owner)
            .into_iter()
            .flatten()
            .map(|(n, f)| (n.clone(), f.clone()))
            .collect()
    }

    /// Look a diagnostic up on behalf of `reader`: its own entry first,
    /// then `name` as `path/leaf` with `path` below the root.
    pub(crate) fn resolve(&self, tree: &ProcessTree, reader: ProcessId, name: &str) -> Option<&Field> {
        if let Some(f) = self.get(reader, name) {
            return Some(f);
        }
        let (path, leaf) = name.rsplit_once('/')?;
        self.get(tree.find(path)?, leaf)
    }

    /// Snapshot of every diagnostic keyed by its qualified name. The root's
    /// own diagnostics keep their bare names.
    pub(crate) fn qualified(&self, tree: &ProcessTree) -> ProcessResult<Vec<(String, ProcessId, String)>> {
        let mut out = Vec::with_capacity(self.len());
        for (owner, name, _) in self.iter() {
            out.push((qualified_name(tree, owner, name)?, owner, name.to_string()));
        }
        Ok(out)
    }

    pub(crate) fn remove_owned_by(&mut self, owners: &[ProcessId]) {
        self.entries.retain(|o, _| !owners.contains(o));
    }
}

/// `path/name` for a diagnostic of `owner`; just `name` for the root.
pub(crate) fn qualified_name(tree: &ProcessTree, owner: ProcessId, name: &str) -> ProcessResult<String> {
    let path = tree.path_of(owner)?;
    Ok(if path.is_empty() {
        name.to_string()
    } else {
        format!("{path}/{name}")
    })
}
