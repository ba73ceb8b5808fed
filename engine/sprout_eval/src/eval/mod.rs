//! The recursive expression-graph evaluator.
//!
//! [`parse`] walks a linked [`Graph`] against a [`Source`], threading one
//! [`State`] through the recursion. Every node evaluation runs the same
//! pipeline:
//!
//! 1. step-budget check;
//! 2. precedence gate: a tagged node below the current minimum fails
//!    silently (not a grammar error, just "not applicable here");
//! 3. left-recursion seed consumption, then the memo table;
//! 4. dispatch on the operator, one `match` arm per [`PegKind`];
//! 5. on success: token whitespace folding, capture wrapping, memo store.
//!
//! Failure is uniform: the entry snapshot is restored and the cursor set to
//! [`Mark::FAIL`](crate::Mark::FAIL), so no committed state or tree
//! fragment ever leaks out of a failed branch.

mod combinators;
mod leftrec;
mod terminals;

use sprout_graph::{Graph, Node, NodeFlags, NodeId, PegKind};
use tracing::trace;

use crate::config::{MemoKind, ParseConfig};
use crate::error::{ErrorReport, ErrorSink, EvalError, FarthestFailure};
use crate::memo::{MemoStrategy, NullMemo, PackratMemo};
use crate::outcome::Outcome;
use crate::source::Source;
use crate::stack::ensure_sufficient_stack;
use crate::state::State;
use crate::tree::{ParseTree, Span, TreeNode};

/// Result of a completed parse.
#[derive(Debug)]
pub struct ParseResult {
    /// The whole input was consumed.
    pub matched: bool,
    /// Some prefix (possibly empty) of the input matched.
    pub succeeded: bool,
    /// End offset of the match when `succeeded`, else `0`.
    pub end_position: usize,
    /// Captured tree; empty when the grammar declares no captures.
    pub tree: ParseTree,
    /// Farthest-failure diagnostics when the input did not fully match.
    pub report: Option<ErrorReport>,
}

/// Parse `text` against `graph` with the strategies named in `config`.
pub fn parse(graph: &Graph, text: &str, config: &ParseConfig) -> Result<ParseResult, EvalError> {
    let mut errors = FarthestFailure::new();
    match config.memo {
        MemoKind::Packrat => {
            let mut memo = PackratMemo::new();
            parse_with(graph, text, config, &mut memo, &mut errors)
        }
        MemoKind::Disabled => {
            let mut memo = NullMemo;
            parse_with(graph, text, config, &mut memo, &mut errors)
        }
    }
}

/// Parse with caller-supplied memoization and error-recording strategies.
///
/// `memo` and `errors` must be fresh per parse; the evaluator assumes the
/// memo table holds no entries from a different input.
pub fn parse_with(
    graph: &Graph,
    text: &str,
    config: &ParseConfig,
    memo: &mut dyn MemoStrategy,
    errors: &mut dyn ErrorSink,
) -> Result<ParseResult, EvalError> {
    if u32::try_from(text.len()).is_err() {
        return Err(EvalError::SourceTooLarge { len: text.len() });
    }

    let mut evaluator = Evaluator {
        graph,
        source: Source::new(text),
        config,
        memo,
        errors,
        state: State::new(config.record_errors),
        step_limit: config.step_limit.unwrap_or(u64::MAX),
    };

    let succeeded = evaluator.eval(graph.root())?;
    let end_position = if succeeded {
        evaluator.state.pos() as usize
    } else {
        0
    };
    let matched = succeeded && end_position == text.len();
    let fragments = evaluator.state.take_fragments();
    let report = if matched {
        None
    } else {
        Some(evaluator.errors.report(graph, config.source_name.as_deref()))
    };

    Ok(ParseResult {
        matched,
        succeeded,
        end_position,
        tree: ParseTree::new(text, fragments),
        report,
    })
}

/// One in-flight parse: the graph, the input, the strategies, and the
/// threaded state.
pub(crate) struct Evaluator<'a> {
    graph: &'a Graph,
    source: Source<'a>,
    config: &'a ParseConfig,
    memo: &'a mut dyn MemoStrategy,
    errors: &'a mut dyn ErrorSink,
    state: State,
    step_limit: u64,
}

impl Evaluator<'_> {
    /// Evaluate one node at the current cursor.
    ///
    /// Grows the native stack as needed; recursion depth follows grammar
    /// nesting times input length in the worst case.
    pub(crate) fn eval(&mut self, id: NodeId) -> Result<bool, EvalError> {
        ensure_sufficient_stack(|| self.eval_node(id))
    }

    fn eval_node(&mut self, id: NodeId) -> Result<bool, EvalError> {
        if self.state.step() > self.step_limit {
            return Err(EvalError::StepBudgetExhausted {
                budget: self.step_limit,
                offset: self.state.pos() as usize,
            });
        }

        let graph = self.graph;
        let node = graph.node(id);

        if node.precedence > 0 && node.precedence < self.state.precedence() {
            self.state.fail();
            return Ok(false);
        }

        let at = self.state.pos();
        let left_recursive = node.flags.contains(NodeFlags::LEFT_RECURSIVE);

        if left_recursive {
            if let Some(seed) = self.state.seed_for(id, at).cloned() {
                if seed.is_failure() {
                    self.state.fail();
                    return Ok(false);
                }
                self.state.merge(&seed);
                return Ok(true);
            }
        }

        // A half-grown seed must never be observable through the cache, so
        // memoization pauses entirely while any growth is active.
        let memoized = node.flags.contains(NodeFlags::MEMOIZE) && !self.state.has_seeds();
        if memoized {
            if let Some(cached) = self.memo.get(id, at).cloned() {
                trace!(node = id.index(), at, failure = cached.is_failure(), "memo hit");
                if cached.is_failure() {
                    self.state.fail();
                    return Ok(false);
                }
                self.state.merge(&cached);
                return Ok(true);
            }
        }

        let entry = self.state.snapshot();
        let ok = if left_recursive {
            if node.flags.contains(NodeFlags::LEFT_ASSOCIATIVE) && self.state.growing(id) {
                self.reenter_left_associative(id, node, at)?
            } else {
                self.grow_seed(id, node, at, &entry)?
            }
        } else {
            self.eval_core(node, at)?
        };

        if ok {
            if memoized {
                let outcome = self.state.extract(&entry);
                self.memo.memoize(id, at, outcome);
            }
            Ok(true)
        } else {
            self.record_failure(node, id, at);
            if memoized {
                self.memo.memoize(id, at, Outcome::failure());
            }
            self.state.restore(&entry);
            self.state.fail();
            Ok(false)
        }
    }

    /// Dispatch plus the success post-processing shared by plain and
    /// left-recursive evaluation (whitespace folding, capture wrapping).
    pub(crate) fn eval_core(&mut self, node: &Node, at: u32) -> Result<bool, EvalError> {
        let entry_fragments = self.state.fragments_len();

        let saved_precedence = self.state.precedence();
        if node.precedence > 0 {
            // a left-associative group must not re-enter itself at its own
            // level; others may (right recursion stays legal)
            let bump = u8::from(node.flags.contains(NodeFlags::LEFT_ASSOCIATIVE));
            self.state
                .set_precedence(node.precedence.saturating_add(bump));
        }
        let ok = self.dispatch(node)?;
        if node.precedence > 0 {
            self.state.set_precedence(saved_precedence);
        }

        if !ok {
            return Ok(false);
        }
        if node.flags.contains(NodeFlags::TOKEN) && !matches!(node.kind, PegKind::Token(_)) {
            self.skip_whitespace()?;
        }
        if node.flags.captures() {
            self.wrap_capture(node, at, entry_fragments);
        }
        Ok(true)
    }

    fn dispatch(&mut self, node: &Node) -> Result<bool, EvalError> {
        match &node.kind {
            PegKind::Sequence(ops) => self.eval_sequence(*ops),
            PegKind::Choice(ops) => self.eval_choice(node, *ops),
            PegKind::Longest(ops) => self.eval_longest(*ops),
            PegKind::Lookahead(op) => self.eval_lookahead(*op),
            PegKind::Not(op) => self.eval_not(*op),
            PegKind::Optional(op) => self.eval_optional(*op),
            PegKind::ZeroOrMore(op) => self.eval_repeat(*op, 0),
            PegKind::OneOrMore(op) => self.eval_repeat(*op, 1),
            PegKind::Literal(text) => Ok(self.eval_literal(text)),
            PegKind::CharRange(from, to) => {
                let (from, to) = (*from, *to);
                Ok(self.take_byte(|c| from <= c && c <= to))
            }
            PegKind::CharSet(set) => Ok(self.take_byte(|c| set.contains(c))),
            PegKind::Any => Ok(self.take_byte(|c| c != 0)),
            PegKind::Cut(scope) => Ok(self.eval_cut(scope)),
            PegKind::Custom(f) => Ok(self.eval_custom(*f)),
            PegKind::Reference(target) => self.eval_reference(*target),
            PegKind::Whitespace => {
                self.skip_whitespace()?;
                Ok(true)
            }
            PegKind::Token(op) => self.eval_token(*op),
        }
    }

    fn record_failure(&mut self, node: &Node, id: NodeId, at: u32) {
        if self.state.record_errors()
            && node
                .flags
                .intersects(NodeFlags::ERROR_RECORDING | NodeFlags::TOKEN)
        {
            self.errors.handle(id, at);
        }
    }

    /// Advance the cursor past whitespace without blacking it, capturing
    /// it, or letting cuts or error records escape.
    pub(crate) fn skip_whitespace(&mut self) -> Result<(), EvalError> {
        if let Some(ws) = self.config.whitespace {
            let snap = self.state.snapshot();
            let cuts = self.state.cuts_len();
            self.state.set_record_errors(false);
            let ok = self.eval(ws)?;
            let end = if ok { self.state.pos() } else { snap.position() };
            self.state.restore(&snap);
            self.state.truncate_cuts(cuts);
            self.state.advance_to(end);
        } else {
            let mut pos = self.state.pos();
            while matches!(self.source.at(pos as usize), b' ' | b'\t' | b'\r' | b'\n') {
                pos += 1;
            }
            self.state.advance_to(pos);
        }
        Ok(())
    }

    /// Wrap the fragments this node produced into one named tree node.
    fn wrap_capture(&mut self, node: &Node, at: u32, entry_fragments: usize) {
        let name = node.label.clone().unwrap_or_default();
        let span = Span::new(at, self.state.black_end().max(at));
        let multi = node.flags.contains(NodeFlags::CAPTURE_MULTI);
        let children = if node.flags.contains(NodeFlags::CAPTURE_TEXT) {
            self.state.truncate_fragments(entry_fragments);
            Vec::new()
        } else {
            self.state.split_fragments_off(entry_fragments)
        };
        self.state.push_fragment(TreeNode::new(name, span, multi, children));
    }
}
