//! # Depth-First Search
//!
//! Pre-order walks over a [CfgRegion], run with an explicit stack so deeply
//! nested generated control flow cannot overflow the call stack.

use rustc_hash::FxHashSet;

use super::cfg::{CfgNode, CfgRegion};

/// The nodes reachable from the entry of a region, in DFS pre-order.
///
/// Successors are explored in terminator order, so the first target of a
/// branch comes right after the branching node.
pub struct PreOrder<'a, N>
where
    N: CfgNode,
{
    arena: &'a N::A,
    /// Nodes still to enter, the next one on top.
    pending: Vec<N>,
    seen: FxHashSet<N>,
}

impl<'a, N> PreOrder<'a, N>
where
    N: CfgNode,
{
    pub fn new(arena: &'a N::A, region: N::Region) -> Self {
        Self {
            arena,
            pending: region.entry_node(arena).into_iter().collect(),
            seen: FxHashSet::default(),
        }
    }
}

impl<N> Iterator for PreOrder<'_, N>
where
    N: CfgNode,
{
    type Item = N;

    fn next(&mut self) -> Option<N> {
        let node = loop {
            let node = self.pending.pop()?;
            if self.seen.insert(node) {
                break node;
            }
        };

        let succs = node.succs(self.arena);
        self.pending.extend(
            succs
                .into_iter()
                .rev()
                .filter(|succ| !self.seen.contains(succ)),
        );
        Some(node)
    }
}
