//! Partition of the process tree by time type.

use cs_core::ProcessId;

use crate::process::TimeType;
use crate::tree::ProcessTree;

/// The four ordered process lists the compositor works through.
///
/// Order within a list is the tree walk order (see
/// [`Traversal`](crate::Traversal)); it decides evaluation order among
/// processes of the same type and is kept stable for reproducibility.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessTypeList {
    version: u64,
    lists: [Vec<ProcessId>; 4],
}

impl ProcessTypeList {
    pub(crate) fn build(tree: &ProcessTree) -> Self {
        let mut lists: [Vec<ProcessId>; 4] = Default::default();
        for id in tree.walk() {
            if let Ok(node) = tree.get(id) {
                lists[node.time_type.slot()].push(id);
            }
        }
        Self {
            version: tree.version(),
            lists,
        }
    }

    /// Whether this partition still describes `tree`.
    pub(crate) fn is_current(&self, tree: &ProcessTree) -> bool {
        self.version == tree.version()
    }

    /// Processes of one type, in evaluation order.
    pub fn of(&self, time_type: TimeType) -> &[ProcessId] {
        &self.lists[time_type.slot()]
    }

    /// Total number of processes across all four lists.
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Traversal;
    use crate::tree::tests::node;

    #[test]
    fn partitions_every_node_once() {
        let mut tree = ProcessTree::new(node("root", TimeType::Explicit));
        let rad = tree
            .insert_child(ProcessId::ROOT, node("rad", TimeType::Explicit))
            .unwrap();
        let sw = tree.insert_child(rad, node("sw", TimeType::Diagnostic)).unwrap();
        let diff = tree
            .insert_child(ProcessId::ROOT, node("diff", TimeType::Implicit))
            .unwrap();

        let list = ProcessTypeList::build(&tree);
        assert_eq!(list.len(), 4);
        assert_eq!(list.of(TimeType::Diagnostic), &[sw]);
        assert_eq!(list.of(TimeType::Explicit), &[ProcessId::ROOT, rad]);
        assert_eq!(list.of(TimeType::Implicit), &[diff]);
        assert!(list.of(TimeType::Adjustment).is_empty());
    }

    #[test]
    fn bottom_up_reverses_parent_child_order() {
        let mut tree = ProcessTree::new(node("root", TimeType::Explicit));
        let child = tree
            .insert_child(ProcessId::ROOT, node("child", TimeType::Explicit))
            .unwrap();
        tree.set_traversal(ProcessId::ROOT, Traversal::BottomUp).unwrap();
        let list = ProcessTypeList::build(&tree);
        assert_eq!(list.of(TimeType::Explicit), &[child, ProcessId::ROOT]);
    }

    #[test]
    fn goes_stale_after_structural_change() {
        let mut tree = ProcessTree::new(node("root", TimeType::Explicit));
        let list = ProcessTypeList::build(&tree);
        assert!(list.is_current(&tree));
        tree.insert_child(ProcessId::ROOT, node("late", TimeType::Adjustment))
            .unwrap();
        assert!(!list.is_current(&tree));
        assert_eq!(ProcessTypeList::build(&tree).of(TimeType::Adjustment).len(), 1);
    }
}
