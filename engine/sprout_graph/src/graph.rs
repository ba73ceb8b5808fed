//! The linked expression graph.

use crate::node::{Node, NodeId, NodeRange};

/// A fully linked grammar: a flat node arena plus the flattened child list
/// N-ary operators index into.
///
/// Immutable once built. A graph may be shared across any number of
/// sequential parses; recursive rules are id back-references inside the
/// arena, so cloning a graph never duplicates subtrees.
///
/// Only [`GraphBuilder`](crate::GraphBuilder) constructs graphs; its link
/// pass guarantees that every `Reference` points at a real node.
#[derive(Clone, Debug)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) root: NodeId,
}

impl Graph {
    /// The entry node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Look up a node.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this graph. Ids are only minted by
    /// the builder of the same graph, so an out-of-range id is a caller bug.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Child ids of an N-ary operator.
    #[inline]
    pub fn children(&self, range: NodeRange) -> &[NodeId] {
        &self.children[range.start as usize..range.start as usize + range.len()]
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
