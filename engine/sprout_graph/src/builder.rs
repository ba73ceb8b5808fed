//! Graph construction and the link pass.
//!
//! The builder is the only producer of [`Graph`]s. Rules may reference each
//! other freely (including cycles); `rule` hands out reference nodes that
//! the final [`build`](GraphBuilder::build) pass links to the bodies bound
//! with [`define`](GraphBuilder::define). Everything the evaluator treats as
//! a precondition (resolved references, bounded reference chains, non-empty
//! operand lists, labelled captures) is validated here and reported as a
//! [`GraphError`]; a graph that builds cleanly is safe to evaluate.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::charset::ByteSet;
use crate::graph::Graph;
use crate::node::{CustomFn, Node, NodeFlags, NodeId, NodeRange, PegKind};

/// Longest tolerated `Reference` -> `Reference` chain.
///
/// Chains longer than this are almost certainly an aliasing cycle
/// (`a = b; b = a`) that would loop forever at parse time.
pub const MAX_REFERENCE_CHAIN: usize = 32;

/// Construction-time errors.
///
/// These are programmer/grammar errors and abort before any parse starts;
/// ordinary parse failures are never represented this way.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// A `rule` name was never bound with `define`.
    #[error("reference to undefined rule `{0}`")]
    UnresolvedReference(Box<str>),

    /// The same name was bound twice.
    #[error("rule `{0}` is already defined")]
    DuplicateRule(Box<str>),

    /// Reference chain longer than [`MAX_REFERENCE_CHAIN`].
    #[error("reference chain through rule `{0}` exceeds {max} links", max = MAX_REFERENCE_CHAIN)]
    ReferenceChainTooLong(Box<str>),

    /// Sequence/choice/longest-match with no operands.
    #[error("{0} node requires at least one operand")]
    EmptyOperands(&'static str),

    /// A capture flag without a label to file the capture under.
    #[error("capture flags on unlabelled {0} node")]
    CaptureWithoutLabel(&'static str),
}

/// Incremental builder for an expression graph.
#[derive(Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    children: Vec<NodeId>,
    rules: FxHashMap<Box<str>, NodeId>,
    forwards: Vec<(NodeId, Box<str>)>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        GraphBuilder::default()
    }

    fn push(&mut self, kind: PegKind) -> NodeId {
        let id = NodeId::new(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(Node::new(kind));
        id
    }

    /// Flatten a child list into the arena.
    ///
    /// # Panics
    /// Panics if `ops` holds more than `u16::MAX` operands.
    fn push_children(&mut self, ops: &[NodeId]) -> NodeRange {
        let start = u32::try_from(self.children.len()).unwrap_or(u32::MAX);
        let len = u16::try_from(ops.len())
            .unwrap_or_else(|_| panic!("operand list of {} exceeds u16::MAX", ops.len()));
        self.children.extend_from_slice(ops);
        NodeRange::new(start, len)
    }

    // === Terminals ===

    /// Verbatim string match.
    pub fn literal(&mut self, text: &str) -> NodeId {
        self.push(PegKind::Literal(text.into()))
    }

    /// One byte in the inclusive range.
    pub fn char_range(&mut self, from: u8, to: u8) -> NodeId {
        self.push(PegKind::CharRange(from, to))
    }

    /// One byte out of `bytes`.
    pub fn char_set(&mut self, bytes: impl AsRef<[u8]>) -> NodeId {
        self.push(PegKind::CharSet(ByteSet::from_bytes(bytes)))
    }

    /// Any byte except the end-of-input sentinel.
    pub fn any(&mut self) -> NodeId {
        self.push(PegKind::Any)
    }

    /// User-supplied terminal matcher.
    pub fn custom(&mut self, f: CustomFn) -> NodeId {
        self.push(PegKind::Custom(f))
    }

    /// The configured whitespace expression.
    pub fn whitespace(&mut self) -> NodeId {
        self.push(PegKind::Whitespace)
    }

    /// Commit the nearest cuttable ancestor named `scope`.
    pub fn cut(&mut self, scope: &str) -> NodeId {
        self.push(PegKind::Cut(scope.into()))
    }

    // === Combinators ===

    pub fn seq(&mut self, ops: &[NodeId]) -> NodeId {
        let range = self.push_children(ops);
        self.push(PegKind::Sequence(range))
    }

    pub fn choice(&mut self, ops: &[NodeId]) -> NodeId {
        let range = self.push_children(ops);
        self.push(PegKind::Choice(range))
    }

    pub fn longest(&mut self, ops: &[NodeId]) -> NodeId {
        let range = self.push_children(ops);
        self.push(PegKind::Longest(range))
    }

    /// Choice that a `cut` named `scope` commits.
    pub fn cuttable(&mut self, scope: &str, ops: &[NodeId]) -> NodeId {
        let id = self.choice(ops);
        self.nodes[id.index()].flags |= NodeFlags::CUTTABLE;
        self.nodes[id.index()].label = Some(scope.into());
        id
    }

    pub fn optional(&mut self, op: NodeId) -> NodeId {
        self.push(PegKind::Optional(op))
    }

    pub fn zero_or_more(&mut self, op: NodeId) -> NodeId {
        self.push(PegKind::ZeroOrMore(op))
    }

    pub fn one_or_more(&mut self, op: NodeId) -> NodeId {
        self.push(PegKind::OneOrMore(op))
    }

    pub fn lookahead(&mut self, op: NodeId) -> NodeId {
        self.push(PegKind::Lookahead(op))
    }

    pub fn not(&mut self, op: NodeId) -> NodeId {
        self.push(PegKind::Not(op))
    }

    /// `op` followed by folded trailing whitespace. Token rules also feed
    /// the error sink when they fail.
    pub fn token(&mut self, op: NodeId) -> NodeId {
        let id = self.push(PegKind::Token(op));
        self.nodes[id.index()].flags |= NodeFlags::TOKEN;
        id
    }

    // === Rules ===

    /// Reference a rule by name.
    ///
    /// Usable before the rule is defined; the link pass patches forward
    /// references.
    pub fn rule(&mut self, name: &str) -> NodeId {
        if let Some(&target) = self.rules.get(name) {
            return self.push(PegKind::Reference(target));
        }
        let id = self.push(PegKind::Reference(NodeId::INVALID));
        self.forwards.push((id, name.into()));
        id
    }

    /// Bind `name` to `body` and label the body for diagnostics.
    pub fn define(&mut self, name: &str, body: NodeId) -> Result<(), GraphError> {
        if self.rules.contains_key(name) {
            return Err(GraphError::DuplicateRule(name.into()));
        }
        if self.nodes[body.index()].label.is_none() {
            self.nodes[body.index()].label = Some(name.into());
        }
        self.rules.insert(name.into(), body);
        Ok(())
    }

    // === Decoration ===

    /// OR additional flags onto a node.
    pub fn mark(&mut self, id: NodeId, flags: NodeFlags) {
        self.nodes[id.index()].flags |= flags;
    }

    /// Tag a node with a precedence level (`0` = untagged).
    pub fn set_precedence(&mut self, id: NodeId, precedence: u8) {
        self.nodes[id.index()].precedence = precedence;
    }

    /// Set the diagnostic/capture label.
    pub fn set_label(&mut self, id: NodeId, label: &str) {
        self.nodes[id.index()].label = Some(label.into());
    }

    /// Capture `op` as a single named tree node.
    pub fn capture(&mut self, name: &str, op: NodeId) -> NodeId {
        self.set_label(op, name);
        self.mark(op, NodeFlags::CAPTURE_SINGLE);
        op
    }

    /// Capture `op` as a repeatable named tree node.
    pub fn capture_multi(&mut self, name: &str, op: NodeId) -> NodeId {
        self.set_label(op, name);
        self.mark(op, NodeFlags::CAPTURE_MULTI);
        op
    }

    /// Capture only the text matched by `op`.
    pub fn capture_text(&mut self, name: &str, op: NodeId) -> NodeId {
        self.set_label(op, name);
        self.mark(op, NodeFlags::CAPTURE_TEXT);
        op
    }

    /// The stock whitespace skipper: zero or more of space, tab, CR, LF.
    pub fn default_whitespace(&mut self) -> NodeId {
        let ws = self.char_set(" \t\r\n");
        self.zero_or_more(ws)
    }

    // === Link pass ===

    /// Resolve forward references, validate, and freeze the graph.
    pub fn build(mut self, root: NodeId) -> Result<Graph, GraphError> {
        for (id, name) in std::mem::take(&mut self.forwards) {
            let target = *self
                .rules
                .get(&name)
                .ok_or(GraphError::UnresolvedReference(name.clone()))?;
            self.nodes[id.index()].kind = PegKind::Reference(target);
        }

        for index in 0..self.nodes.len() {
            self.check_node(index)?;
        }

        Ok(Graph {
            nodes: self.nodes,
            children: self.children,
            root,
        })
    }

    fn check_node(&self, index: usize) -> Result<(), GraphError> {
        let node = &self.nodes[index];
        match &node.kind {
            PegKind::Sequence(r) | PegKind::Choice(r) | PegKind::Longest(r) => {
                if r.is_empty() {
                    return Err(GraphError::EmptyOperands(node.kind.name()));
                }
            }
            PegKind::Reference(_) => {
                // Reference chains must terminate at a non-reference body
                // within the configured hop budget.
                let mut hops = 0;
                let mut cursor = index;
                while let PegKind::Reference(target) = self.nodes[cursor].kind {
                    hops += 1;
                    if hops > MAX_REFERENCE_CHAIN {
                        return Err(GraphError::ReferenceChainTooLong(self.describe_rule(index)));
                    }
                    cursor = target.index();
                }
            }
            _ => {}
        }
        if node.flags.captures() && node.label.is_none() {
            return Err(GraphError::CaptureWithoutLabel(node.kind.name()));
        }
        Ok(())
    }

    fn describe_rule(&self, index: usize) -> Box<str> {
        self.nodes[index]
            .label
            .clone()
            .unwrap_or_else(|| format!("#{index}").into())
    }
}
