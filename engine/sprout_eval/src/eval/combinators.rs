//! Structural operators: sequences, choices, repetition, lookahead.
//!
//! Backtracking discipline: every combinator that may retry takes a
//! snapshot at its entry (or per attempt) and restores it before the next
//! attempt. Cut marks are the one thing `restore` leaves alone: a mark
//! raised inside a failing alternative is the signal that backtracking
//! must stop, so failure-absorbing operators check for fresh marks before
//! absorbing anything.

use sprout_graph::{Node, NodeFlags, NodeId, NodeRange};
use tracing::trace;

use super::Evaluator;
use crate::error::EvalError;
use crate::outcome::Outcome;

impl Evaluator<'_> {
    /// All operands in order; the committed baseline advances after each.
    pub(super) fn eval_sequence(&mut self, ops: NodeRange) -> Result<bool, EvalError> {
        let graph = self.graph;
        for &op in graph.children(ops) {
            if !self.eval(op)? {
                return Ok(false);
            }
            self.state.commit();
        }
        Ok(true)
    }

    /// Ordered choice; a fired cut stops the scan over later alternatives.
    pub(super) fn eval_choice(&mut self, node: &Node, ops: NodeRange) -> Result<bool, EvalError> {
        let graph = self.graph;
        let scope: Option<&str> = if node.flags.contains(NodeFlags::CUTTABLE) {
            node.label.as_deref()
        } else {
            None
        };
        let snap = self.state.snapshot();
        let cuts_before = self.state.cuts_len();

        for &op in graph.children(ops) {
            if self.eval(op)? {
                if let Some(scope) = scope {
                    self.state.consume_cuts(scope, cuts_before);
                }
                return Ok(true);
            }
            if self.state.cuts_len() > cuts_before {
                // The failed alternative fired a cut: this choice is
                // committed. Marks for this scope end here; marks for an
                // outer scope keep propagating with the failure.
                let consumed = match scope {
                    Some(scope) => self.state.consume_cuts(scope, cuts_before),
                    None => false,
                };
                trace!(consumed, "cut stopped choice backtracking");
                return Ok(false);
            }
            self.state.restore(&snap);
        }
        Ok(false)
    }

    /// Try every operand from the same offset; keep the farthest end.
    /// Ties keep the earliest operand.
    pub(super) fn eval_longest(&mut self, ops: NodeRange) -> Result<bool, EvalError> {
        let graph = self.graph;
        let snap = self.state.snapshot();
        let cuts_before = self.state.cuts_len();
        let mut best: Option<Outcome> = None;

        for &op in graph.children(ops) {
            if self.eval(op)? {
                let candidate = self.state.extract(&snap);
                let better = best
                    .as_ref()
                    .map_or(true, |b| candidate.end_offset() > b.end_offset());
                if better {
                    best = Some(candidate);
                }
                self.state.restore(&snap);
            } else {
                if self.state.cuts_len() > cuts_before {
                    return Ok(false);
                }
                self.state.restore(&snap);
            }
        }

        match best {
            Some(outcome) => {
                self.state.merge(&outcome);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Succeeds iff the operand succeeds; consumes nothing, discards all
    /// side effects, and isolates cuts.
    pub(super) fn eval_lookahead(&mut self, op: NodeId) -> Result<bool, EvalError> {
        let snap = self.state.snapshot();
        let cuts = self.state.cuts_len();
        let ok = self.eval(op)?;
        self.state.restore(&snap);
        self.state.truncate_cuts(cuts);
        Ok(ok)
    }

    /// Succeeds iff the operand fails. Failure inside is expected, so
    /// error recording is off for the attempt.
    pub(super) fn eval_not(&mut self, op: NodeId) -> Result<bool, EvalError> {
        let snap = self.state.snapshot();
        let cuts = self.state.cuts_len();
        self.state.set_record_errors(false);
        let ok = self.eval(op)?;
        self.state.restore(&snap); // also restores the recording toggle
        self.state.truncate_cuts(cuts);
        Ok(!ok)
    }

    /// Operand or nothing. A failure that fired a cut is not absorbed.
    pub(super) fn eval_optional(&mut self, op: NodeId) -> Result<bool, EvalError> {
        let snap = self.state.snapshot();
        let cuts_before = self.state.cuts_len();
        if self.eval(op)? {
            return Ok(true);
        }
        if self.state.cuts_len() > cuts_before {
            return Ok(false);
        }
        self.state.restore(&snap);
        Ok(true)
    }

    /// Shared body of `ZeroOrMore` (`min = 0`) and `OneOrMore` (`min = 1`).
    pub(super) fn eval_repeat(
        &mut self,
        op: NodeId,
        min: usize,
    ) -> Result<bool, EvalError> {
        let mut matched = 0usize;
        loop {
            let snap = self.state.snapshot();
            let cuts_before = self.state.cuts_len();
            let before = self.state.pos();
            if self.eval(op)? {
                matched += 1;
                if self.state.pos() == before {
                    // zero-width success; a further attempt cannot differ
                    break;
                }
                continue;
            }
            if self.state.cuts_len() > cuts_before {
                // a cut inside any repetition commits the whole node
                return Ok(false);
            }
            self.state.restore(&snap);
            break;
        }
        Ok(matched >= min)
    }
}
