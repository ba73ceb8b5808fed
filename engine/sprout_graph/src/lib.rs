//! Expression-graph IR for the Sprout PEG engine.
//!
//! A grammar is a flat arena of typed nodes ([`Node`], [`PegKind`]) wired
//! together with [`NodeId`] handles; recursive and left-recursive rules are
//! ordinary id cycles. [`GraphBuilder`] constructs and links graphs; the
//! evaluator in `sprout_eval` only ever sees a finished [`Graph`] in which
//! every reference points at its target.

mod builder;
mod charset;
mod graph;
mod node;

pub use builder::{GraphBuilder, GraphError, MAX_REFERENCE_CHAIN};
pub use charset::ByteSet;
pub use graph::Graph;
pub use node::{CustomFn, Node, NodeFlags, NodeId, NodeRange, PegKind};
