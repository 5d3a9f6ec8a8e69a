use core::fmt;
use core::num::NonZeroU32;

/// Compact, stable identifier for a node in the process tree.
///
/// - `u32` keeps memory small
/// - `NonZero` enables `Option<ProcessId>` to be pointer-optimized
///
/// Ids are never reused: a removed process leaves a tombstone so that ids
/// held by callers stay unambiguous.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProcessId(NonZeroU32);

impl ProcessId {
    /// The root of every process tree.
    pub const ROOT: ProcessId = ProcessId(NonZeroU32::MIN);

    /// Create an id from a 0-based arena slot by storing slot+1.
    pub fn from_index(index: u32) -> Self {
        Self(NonZeroU32::MIN.saturating_add(index))
    }

    /// Recover the 0-based arena slot.
    pub fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Debug for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProcessId({})", self.index())
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip_index() {
        for i in [0_u32, 1, 2, 42, 10_000] {
            let id = ProcessId::from_index(i);
            assert_eq!(id.index(), i as usize);
        }
    }

    #[test]
    fn root_is_slot_zero() {
        assert_eq!(ProcessId::ROOT, ProcessId::from_index(0));
        assert!(ProcessId::ROOT.is_root());
        assert!(!ProcessId::from_index(3).is_root());
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<ProcessId>(),
            core::mem::size_of::<Option<ProcessId>>()
        );
    }
}
