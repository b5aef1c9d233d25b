use indexmap::IndexSet as _IndexSet;
use rustc_hash::FxBuildHasher;

/// `IndexSet` with a fast hasher.
///
/// Successor sets use insertion order for iteration, which keeps
/// child-enqueue order stable within a process.
pub(crate) type IndexSet<T> = _IndexSet<T, FxBuildHasher>;

/// Index of a node within its graph's node table. The root always has
/// key zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub(crate) struct NodeKey(pub(crate) u32);

impl NodeKey {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}
