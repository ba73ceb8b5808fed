//! Left recursion by seed growing.
//!
//! A left-recursive node at a given offset starts from a failing seed:
//! nested self-references at the same offset consume the seed instead of
//! recursing, so the first body pass can only match a non-recursive
//! alternative. Each pass that ends strictly beyond the current seed
//! replaces it and the body is retried; the first non-growing pass stops
//! the loop and the best seed becomes the node's result.
//!
//! With a plain left-recursive node the nested self-reference *after* the
//! recursion point evaluates freely, which grows a right-leaning tree.
//! A left-associative node suppresses that: while one of its growths is
//! active, re-entry at any other offset runs the body exactly once over a
//! failing seed. That is deep enough to match an operand but too shallow
//! to recurse, which forces the left-leaning shape.

use sprout_graph::{Node, NodeId};
use tracing::trace;

use super::Evaluator;
use crate::error::EvalError;
use crate::state::Snapshot;

impl Evaluator<'_> {
    /// Full seed-growing loop for a left-recursive node at `at`.
    pub(super) fn grow_seed(
        &mut self,
        id: NodeId,
        node: &Node,
        at: u32,
        entry: &Snapshot,
    ) -> Result<bool, EvalError> {
        self.state.push_seed(id, at);
        loop {
            let ok = self.eval_core(node, at)?;
            let grew = if ok {
                match self.state.top_seed_end() {
                    None => true,
                    Some(prev) => self.state.pos() > prev,
                }
            } else {
                false
            };
            if !grew {
                break;
            }
            let outcome = self.state.extract(entry);
            trace!(node = id.index(), at, end = outcome.end_offset(), "seed grew");
            self.state.set_top_seed(outcome);
            self.state.restore(entry);
        }
        // unwind the non-growing attempt, then commit the best seed
        self.state.restore(entry);
        let seed = self.state.pop_seed();
        if seed.outcome.is_failure() {
            Ok(false)
        } else {
            self.state.merge(&seed.outcome);
            Ok(true)
        }
    }

    /// Single-pass re-entry of a left-associative node whose growth is
    /// active elsewhere on the stack.
    pub(super) fn reenter_left_associative(
        &mut self,
        id: NodeId,
        node: &Node,
        at: u32,
    ) -> Result<bool, EvalError> {
        trace!(node = id.index(), at, "left-associative re-entry");
        self.state.push_seed(id, at);
        let result = self.eval_core(node, at);
        self.state.pop_seed();
        result
    }
}
