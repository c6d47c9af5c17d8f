use std::hash::Hash;

use crate::collections::storage::ArenaPtr;

/// A node in a control flow graph.
pub trait CfgNode: ArenaPtr + Hash {
    /// The region type associated with the node.
    type Region: CfgRegion<A = Self::A, Node = Self>;

    /// Get the successors of the node, in terminator order.
    ///
    /// Successors are easy to get from the terminators. Predecessors need a
    /// pass over the whole region, see
    /// [ComputePreds](crate::ir::passes::ComputePreds).
    fn succs(self, arena: &Self::A) -> Vec<Self>;
}

/// A region of nodes with a distinguished entry, i.e. a function.
pub trait CfgRegion: ArenaPtr {
    /// The node type associated with the region.
    type Node: CfgNode<A = Self::A, Region = Self>;

    /// Get the entry node of the region, `None` if the region is empty.
    fn entry_node(self, arena: &Self::A) -> Option<Self::Node>;
}
