//! Consuming operators and the cut/reference/token plumbing.

use sprout_graph::{CustomFn, NodeId};
use tracing::trace;

use super::Evaluator;
use crate::error::EvalError;

impl Evaluator<'_> {
    /// Verbatim byte-string match.
    pub(super) fn eval_literal(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return true;
        }
        let at = self.state.pos();
        if self.source.matches_at(at as usize, text.as_bytes()) {
            let end = at + text.len() as u32;
            self.state.advance_to(end);
            self.state.touch_black(end);
            true
        } else {
            false
        }
    }

    /// Consume one byte accepted by `accept`. The NUL sentinel past the
    /// end of input is never consumable.
    pub(super) fn take_byte(&mut self, accept: impl FnOnce(u8) -> bool) -> bool {
        let at = self.state.pos();
        if (at as usize) < self.source.len() && accept(self.source.at(at as usize)) {
            self.state.advance_to(at + 1);
            self.state.touch_black(at + 1);
            true
        } else {
            false
        }
    }

    /// Raise a cut mark for `scope` and release memo entries behind the
    /// cursor. Consumes nothing.
    pub(super) fn eval_cut(&mut self, scope: &str) -> bool {
        let at = self.state.pos();
        self.state.push_cut(scope);
        self.memo.cut(at);
        trace!(scope, at, "cut fired");
        true
    }

    /// User-supplied matcher. A result that moves backwards or past the
    /// end of input is a matcher bug; it is clamped into range.
    pub(super) fn eval_custom(&mut self, f: CustomFn) -> bool {
        let at = self.state.pos() as usize;
        match f(self.source.bytes(), at) {
            Some(end) => {
                debug_assert!(end >= at, "custom matcher moved the cursor backwards");
                let end = end.clamp(at, self.source.len()) as u32;
                self.state.advance_to(end);
                if end as usize > at {
                    self.state.touch_black(end);
                }
                true
            }
            None => false,
        }
    }

    /// Follow a resolved reference. The link pass guarantees the target.
    pub(super) fn eval_reference(&mut self, target: NodeId) -> Result<bool, EvalError> {
        debug_assert!(target.is_valid(), "unresolved reference survived linking");
        self.eval(target)
    }

    /// Operand, then trailing whitespace folded into the end offset (but
    /// not into the blacked cursor, so captures exclude it).
    pub(super) fn eval_token(&mut self, op: NodeId) -> Result<bool, EvalError> {
        if !self.eval(op)? {
            return Ok(false);
        }
        self.skip_whitespace()?;
        Ok(true)
    }
}
