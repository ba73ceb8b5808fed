//! The transactional parse state.
//!
//! One `State` is threaded through every recursive evaluator call of a
//! parse. It carries the committed/uncommitted cursor pair, the blacked
//! (last non-whitespace) cursor pair, the tree-build cursor with its
//! committed watermark, the precedence register, the left-recursion seed
//! stack, and the pending cut marks.
//!
//! The protocol:
//!
//! - [`commit`](State::commit) folds the uncommitted cursor and tree into
//!   the committed baseline (sequences call it after each element);
//! - [`discard`](State::discard) drops uncommitted work back to the
//!   baseline;
//! - [`snapshot`](State::snapshot)/[`restore`](State::restore) capture and
//!   roll back the wider state, including the baseline itself, so a
//!   combinator can retry from an exact earlier point even after partial
//!   commits;
//! - [`extract`](State::extract)/[`merge`](State::merge) convert the work
//!   since a snapshot into an immutable [`Outcome`] and replay it later.
//!
//! Invariant: a combinator that fails restores its entry snapshot before
//! returning, so committed state and tree fragments never leak out of a
//! failed branch. Cut marks are deliberately exempt from `restore`: a
//! mark raised inside a failing alternative is exactly the signal the
//! owning cuttable choice needs to stop backtracking. They are scoped by
//! that choice (or a lookahead boundary) instead.

use smallvec::SmallVec;
use sprout_graph::NodeId;

use crate::outcome::Outcome;
use crate::tree::TreeNode;

/// Cursor position or the uniform failure sentinel.
///
/// Every evaluation reports its end through a `Mark`; `Mark::FAIL` is the
/// single representation of "did not match".
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Mark(u32);

impl Mark {
    /// The failure sentinel.
    pub const FAIL: Mark = Mark(u32::MAX);

    /// A valid offset.
    #[inline]
    pub const fn new(offset: u32) -> Self {
        Mark(offset)
    }

    /// True for the failure sentinel.
    #[inline]
    pub const fn is_fail(self) -> bool {
        self.0 == u32::MAX
    }

    /// The offset of a non-failure mark.
    ///
    /// # Panics
    /// Debug-panics on `Mark::FAIL`.
    #[inline]
    pub fn offset(self) -> u32 {
        debug_assert!(!self.is_fail(), "offset of failure mark");
        self.0
    }
}

impl std::fmt::Debug for Mark {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_fail() {
            write!(f, "Mark::FAIL")
        } else {
            write!(f, "Mark({})", self.0)
        }
    }
}

impl Default for Mark {
    fn default() -> Self {
        Mark::new(0)
    }
}

/// Rollback point for speculative evaluation.
///
/// Captures the full cursor state plus the tree watermarks. Cut marks and
/// seeds are intentionally absent; they have their own scoping rules.
#[derive(Copy, Clone, Debug)]
pub struct Snapshot {
    pub(crate) start: u32,
    pub(crate) end: Mark,
    pub(crate) black_start: u32,
    pub(crate) black_end: u32,
    pub(crate) precedence: u8,
    pub(crate) record_errors: bool,
    pub(crate) committed: usize,
    pub(crate) fragments: usize,
}

impl Snapshot {
    /// The uncommitted cursor at snapshot time.
    #[inline]
    pub fn position(&self) -> u32 {
        self.end.offset()
    }
}

/// In-progress left-recursive growth: the best outcome so far for one
/// node at one offset.
#[derive(Clone, Debug)]
pub(crate) struct Seed {
    pub(crate) node: NodeId,
    pub(crate) offset: u32,
    pub(crate) outcome: Outcome,
}

/// A fired cut, waiting to be consumed by its named cuttable choice.
#[derive(Clone, Debug)]
pub(crate) struct CutMark {
    pub(crate) scope: Box<str>,
}

/// Full mutable context of one in-flight parse.
#[derive(Debug, Default)]
pub struct State {
    start: u32,
    end: Mark,
    black_start: u32,
    black_end: u32,
    precedence: u8,
    record_errors: bool,
    fragments: Vec<TreeNode>,
    committed: usize,
    seeds: SmallVec<[Seed; 4]>,
    cuts: SmallVec<[CutMark; 4]>,
    steps: u64,
}

impl State {
    pub fn new(record_errors: bool) -> Self {
        State {
            record_errors,
            ..State::default()
        }
    }

    // === Cursor ===

    /// Current (uncommitted) cursor.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.end.offset()
    }

    /// True after a failure was signalled and not yet rolled back.
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.end.is_fail()
    }

    /// Signal failure.
    #[inline]
    pub fn fail(&mut self) {
        self.end = Mark::FAIL;
    }

    /// Move the uncommitted cursor.
    #[inline]
    pub fn advance_to(&mut self, offset: u32) {
        self.end = Mark::new(offset);
    }

    /// Record consumed non-whitespace up to `offset`.
    #[inline]
    pub fn touch_black(&mut self, offset: u32) {
        debug_assert!(offset >= self.black_end, "blacked cursor moved backwards");
        self.black_end = offset;
    }

    /// Last non-whitespace offset (uncommitted).
    #[inline]
    pub fn black_end(&self) -> u32 {
        self.black_end
    }

    // === Transaction protocol ===

    /// Fold uncommitted cursor and tree into the committed baseline.
    pub fn commit(&mut self) {
        self.start = self.end.offset();
        self.black_start = self.black_end;
        self.committed = self.fragments.len();
    }

    /// Drop uncommitted work back to the committed baseline.
    pub fn discard(&mut self) {
        self.end = Mark::new(self.start);
        self.black_end = self.black_start;
        self.fragments.truncate(self.committed);
    }

    /// Capture a rollback point.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            start: self.start,
            end: self.end,
            black_start: self.black_start,
            black_end: self.black_end,
            precedence: self.precedence,
            record_errors: self.record_errors,
            committed: self.committed,
            fragments: self.fragments.len(),
        }
    }

    /// Roll back to a snapshot, committed baseline included.
    pub fn restore(&mut self, snap: &Snapshot) {
        self.start = snap.start;
        self.end = snap.end;
        self.black_start = snap.black_start;
        self.black_end = snap.black_end;
        self.precedence = snap.precedence;
        self.record_errors = snap.record_errors;
        self.committed = snap.committed;
        self.fragments.truncate(snap.fragments);
    }

    /// Freeze everything produced since `since` into an [`Outcome`].
    ///
    /// Non-destructive; callers usually `restore` afterwards.
    pub fn extract(&self, since: &Snapshot) -> Outcome {
        debug_assert!(!self.end.is_fail(), "extracting a failed state");
        Outcome {
            end: self.end,
            black_end: self.black_end,
            fragments: self.fragments[since.fragments..].to_vec(),
        }
    }

    /// Replay a previously extracted outcome onto this state.
    ///
    /// The blacked cursor only ever moves forward: an outcome recorded in
    /// a context that had blacked less than this one (a zero-width match
    /// cached after token folding, say) must not drag it backwards.
    pub fn merge(&mut self, outcome: &Outcome) {
        self.end = outcome.end;
        if !outcome.is_failure() {
            self.black_end = self.black_end.max(outcome.black_end);
            self.fragments.extend_from_slice(&outcome.fragments);
        }
    }

    // === Precedence register ===

    #[inline]
    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    #[inline]
    pub fn set_precedence(&mut self, min: u8) {
        self.precedence = min;
    }

    // === Error recording toggle ===

    #[inline]
    pub fn record_errors(&self) -> bool {
        self.record_errors
    }

    #[inline]
    pub fn set_record_errors(&mut self, on: bool) {
        self.record_errors = on;
    }

    // === Tree cursor ===

    #[inline]
    pub(crate) fn fragments_len(&self) -> usize {
        self.fragments.len()
    }

    pub(crate) fn push_fragment(&mut self, node: TreeNode) {
        self.fragments.push(node);
    }

    pub(crate) fn split_fragments_off(&mut self, from: usize) -> Vec<TreeNode> {
        self.fragments.split_off(from)
    }

    pub(crate) fn truncate_fragments(&mut self, len: usize) {
        self.fragments.truncate(len);
    }

    pub(crate) fn take_fragments(&mut self) -> Vec<TreeNode> {
        self.committed = 0;
        std::mem::take(&mut self.fragments)
    }

    // === Seeds ===

    pub(crate) fn has_seeds(&self) -> bool {
        !self.seeds.is_empty()
    }

    pub(crate) fn push_seed(&mut self, node: NodeId, offset: u32) {
        self.seeds.push(Seed {
            node,
            offset,
            outcome: Outcome::failure(),
        });
    }

    pub(crate) fn pop_seed(&mut self) -> Seed {
        self.seeds.pop().unwrap_or_else(|| Seed {
            node: NodeId::INVALID,
            offset: 0,
            outcome: Outcome::failure(),
        })
    }

    /// The seed for (node, offset), topmost first.
    pub(crate) fn seed_for(&self, node: NodeId, offset: u32) -> Option<&Outcome> {
        self.seeds
            .iter()
            .rev()
            .find(|s| s.node == node && s.offset == offset)
            .map(|s| &s.outcome)
    }

    /// Is a growth of `node` active at any offset?
    pub(crate) fn growing(&self, node: NodeId) -> bool {
        self.seeds.iter().any(|s| s.node == node)
    }

    /// End offset of the topmost seed, `None` while it is still failing.
    pub(crate) fn top_seed_end(&self) -> Option<u32> {
        let top = self.seeds.last()?;
        if top.outcome.is_failure() {
            None
        } else {
            Some(top.outcome.end_offset())
        }
    }

    pub(crate) fn set_top_seed(&mut self, outcome: Outcome) {
        if let Some(top) = self.seeds.last_mut() {
            top.outcome = outcome;
        }
    }

    // === Cut marks ===

    #[inline]
    pub(crate) fn cuts_len(&self) -> usize {
        self.cuts.len()
    }

    pub(crate) fn push_cut(&mut self, scope: &str) {
        self.cuts.push(CutMark {
            scope: scope.into(),
        });
    }

    /// Drop marks raised at or after `len` (lookahead isolation).
    pub(crate) fn truncate_cuts(&mut self, len: usize) {
        self.cuts.truncate(len);
    }

    /// Remove marks for `scope` raised at index `from` or later; returns
    /// whether any were present.
    pub(crate) fn consume_cuts(&mut self, scope: &str, from: usize) -> bool {
        let before = self.cuts.len();
        let mut index = from;
        while index < self.cuts.len() {
            if &*self.cuts[index].scope == scope {
                self.cuts.remove(index);
            } else {
                index += 1;
            }
        }
        self.cuts.len() != before
    }

    // === Step budget ===

    /// Count one evaluator step and return the running total.
    #[inline]
    pub(crate) fn step(&mut self) -> u64 {
        self.steps += 1;
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Span;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, start: u32, end: u32) -> TreeNode {
        TreeNode::new(name.into(), Span::new(start, end), false, Vec::new())
    }

    #[test]
    fn commit_then_discard_returns_to_baseline() {
        let mut state = State::new(true);
        state.advance_to(3);
        state.touch_black(3);
        state.push_fragment(leaf("a", 0, 3));
        state.commit();

        state.advance_to(7);
        state.touch_black(7);
        state.push_fragment(leaf("b", 3, 7));
        state.discard();

        assert_eq!(state.pos(), 3);
        assert_eq!(state.black_end(), 3);
        assert_eq!(state.fragments_len(), 1);
    }

    #[test]
    fn restore_rolls_back_past_commits() {
        let mut state = State::new(true);
        state.advance_to(2);
        let snap = state.snapshot();

        state.advance_to(5);
        state.push_fragment(leaf("x", 2, 5));
        state.commit();
        state.advance_to(9);

        state.restore(&snap);
        assert_eq!(state.pos(), 2);
        assert_eq!(state.fragments_len(), 0);
        // discard after restore goes to the restored baseline, not offset 5
        state.advance_to(4);
        state.discard();
        assert_eq!(state.pos(), 0);
    }

    #[test]
    fn extract_and_merge_round_trip() {
        let mut state = State::new(true);
        let snap = state.snapshot();
        state.advance_to(4);
        state.touch_black(4);
        state.push_fragment(leaf("n", 0, 4));

        let outcome = state.extract(&snap);
        state.restore(&snap);
        assert_eq!(state.fragments_len(), 0);

        state.merge(&outcome);
        assert_eq!(state.pos(), 4);
        assert_eq!(state.black_end(), 4);
        assert_eq!(state.fragments_len(), 1);
    }

    #[test]
    fn merging_a_failure_fails_the_state() {
        let mut state = State::new(true);
        state.advance_to(2);
        state.merge(&Outcome::failure());
        assert!(state.is_failed());
        assert_eq!(state.fragments_len(), 0);
    }

    #[test]
    fn seeds_are_lifo_and_offset_scoped() {
        let mut state = State::new(true);
        let a = NodeId::new(1);
        let b = NodeId::new(2);
        state.push_seed(a, 0);
        state.push_seed(b, 2);

        assert!(state.seed_for(a, 0).is_some());
        assert!(state.seed_for(a, 2).is_none());
        assert!(state.growing(b));

        assert!(state.top_seed_end().is_none());
        state.set_top_seed(Outcome {
            end: Mark::new(5),
            black_end: 5,
            fragments: Vec::new(),
        });
        assert_eq!(state.top_seed_end(), Some(5));

        let popped = state.pop_seed();
        assert_eq!(popped.node, b);
        assert!(!state.growing(b));
        assert!(state.growing(a));
    }

    #[test]
    fn cut_marks_survive_restore_but_scope_out() {
        let mut state = State::new(true);
        let snap = state.snapshot();
        state.push_cut("stmt");
        state.push_cut("expr");
        state.restore(&snap);
        assert_eq!(state.cuts_len(), 2);

        assert!(state.consume_cuts("stmt", 0));
        assert_eq!(state.cuts_len(), 1);
        assert!(!state.consume_cuts("stmt", 0));
        state.truncate_cuts(0);
        assert_eq!(state.cuts_len(), 0);
    }
}
