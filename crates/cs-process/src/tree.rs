//! Arena-backed process tree.

use cs_core::ProcessId;

use crate::error::{ProcessError, ProcessResult};
use crate::process::{Process, TimeType, Traversal};
use crate::time::TimeRecord;

/// One node of the tree: a process plus its scheduling metadata.
pub(crate) struct ProcessNode {
    pub(crate) name: String,
    pub(crate) time_type: TimeType,
    pub(crate) traversal: Traversal,
    pub(crate) time: TimeRecord,
    pub(crate) parent: Option<ProcessId>,
    pub(crate) children: Vec<ProcessId>,
    pub(crate) state_vars: Vec<String>,
    pub(crate) process: Box<dyn Process>,
}

/// Owner of every [`ProcessNode`].
///
/// `version` changes on every structural edit (insert, remove, re-tag,
/// traversal change). Anything derived from the tree's shape records the
/// version it was built from and is rebuilt when the two differ.
pub(crate) struct ProcessTree {
    nodes: Vec<Option<ProcessNode>>,
    version: u64,
}

impl ProcessTree {
    pub(crate) fn new(root: ProcessNode) -> Self {
        Self {
            nodes: vec![Some(root)],
            version: 1,
        }
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub(crate) fn get(&self, id: ProcessId) -> ProcessResult<&ProcessNode> {
        self.nodes
            .get(id.index())
            .and_then(Option::as_ref)
            .ok_or_else(|| unknown(id))
    }

    /// Mutable access for non-structural edits (time record, process body).
    pub(crate) fn get_mut(&mut self, id: ProcessId) -> ProcessResult<&mut ProcessNode> {
        self.nodes
            .get_mut(id.index())
            .and_then(Option::as_mut)
            .ok_or_else(|| unknown(id))
    }

    pub(crate) fn root(&self) -> &ProcessNode {
        match self.nodes.first() {
            Some(Some(root)) => root,
            _ => unreachable!("root slot is never vacated"),
        }
    }

    pub(crate) fn insert_child(
        &mut self,
        parent: ProcessId,
        mut node: ProcessNode,
    ) -> ProcessResult<ProcessId> {
        let parent_node = self.get(parent)?;
        if parent_node
            .children
            .iter()
            .filter_map(|c| self.get(*c).ok())
            .any(|c| c.name == node.name)
        {
            return Err(ProcessError::DuplicateName {
                parent: parent_node.name.clone(),
                name: node.name,
            });
        }
        let id = ProcessId::from_index(self.nodes.len() as u32);
        node.parent = Some(parent);
        self.nodes.push(Some(node));
        self.get_mut(parent)?.children.push(id);
        self.bump();
        Ok(id)
    }

    /// Remove `id` and its whole subtree; returns every removed id.
    pub(crate) fn remove_subtree(&mut self, id: ProcessId) -> ProcessResult<Vec<ProcessId>> {
        if id.is_root() {
            return Err(ProcessError::InvalidArg {
                what: "the root process cannot be removed",
            });
        }
        let parent = self.get(id)?.parent;
        let removed = self.walk_from(id, Traversal::TopDown);
        if let Some(parent) = parent {
            self.get_mut(parent)?.children.retain(|c| *c != id);
        }
        for r in &removed {
            if let Some(slot) = self.nodes.get_mut(r.index()) {
                *slot = None;
            }
        }
        self.bump();
        Ok(removed)
    }

    pub(crate) fn set_time_type(&mut self, id: ProcessId, time_type: TimeType) -> ProcessResult<()> {
        let node = self.get_mut(id)?;
        if node.time_type != time_type {
            node.time_type = time_type;
            self.bump();
        }
        Ok(())
    }

    pub(crate) fn set_traversal(&mut self, id: ProcessId, traversal: Traversal) -> ProcessResult<()> {
        let node = self.get_mut(id)?;
        if node.traversal != traversal {
            node.traversal = traversal;
            self.bump();
        }
        Ok(())
    }

    /// Every live node below and including the root, honouring each node's
    /// own [`Traversal`].
    pub(crate) fn walk(&self) -> Vec<ProcessId> {
        self.walk_from(ProcessId::ROOT, self.root().traversal)
    }

    fn walk_from(&self, start: ProcessId, traversal: Traversal) -> Vec<ProcessId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.visit(start, traversal, &mut out);
        out
    }

    fn visit(&self, id: ProcessId, traversal: Traversal, out: &mut Vec<ProcessId>) {
        let Ok(node) = self.get(id) else {
            return;
        };
        if traversal == Traversal::TopDown {
            out.push(id);
        }
        for child in &node.children {
            if let Ok(c) = self.get(*child) {
                self.visit(*child, c.traversal, out);
            }
        }
        if traversal == Traversal::BottomUp {
            out.push(id);
        }
    }

    /// Look up a node by `/`-separated sub-process names below the root.
    /// The empty path is the root.
    pub(crate) fn find(&self, path: &str) -> Option<ProcessId> {
        let mut current = ProcessId::ROOT;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let node = self.get(current).ok()?;
            current = node
                .children
                .iter()
                .copied()
                .find(|c| self.get(*c).is_ok_and(|n| n.name == segment))?;
        }
        Some(current)
    }

    /// `/`-separated path of `id` below the root (empty for the root).
    pub(crate) fn path_of(&self, id: ProcessId) -> ProcessResult<String> {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.get(current)?.parent {
            segments.push(self.get(current)?.name.as_str());
            current = parent;
        }
        segments.reverse();
        Ok(segments.join("/"))
    }
}

fn unknown(id: ProcessId) -> ProcessError {
    ProcessError::UnknownProcess {
        what: format!("no live process with id {id}"),
    }
}
