//! Per-parse configuration.

use sprout_graph::NodeId;

/// Which memoization strategy [`parse`](crate::parse) instantiates.
///
/// Custom [`MemoStrategy`](crate::MemoStrategy) implementations go through
/// [`parse_with`](crate::parse_with) instead.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MemoKind {
    /// The open-addressed packrat table.
    #[default]
    Packrat,
    /// No caching.
    Disabled,
}

/// Configuration threaded through one parse.
#[derive(Clone, Debug)]
pub struct ParseConfig {
    /// Identifier used in error reports; never affects parsing semantics.
    pub source_name: Option<Box<str>>,
    /// Whitespace expression (a node of the same graph) consulted by
    /// `Whitespace` nodes and token folding. `None` falls back to the
    /// built-in ASCII skipper (space, tab, CR, LF).
    pub whitespace: Option<NodeId>,
    /// Feed flagged failures to the error sink.
    pub record_errors: bool,
    /// Abort after this many evaluator steps; `None` is unbounded.
    pub step_limit: Option<u64>,
    /// Memoization strategy for [`parse`](crate::parse).
    pub memo: MemoKind,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            source_name: None,
            whitespace: None,
            record_errors: true,
            step_limit: None,
            memo: MemoKind::default(),
        }
    }
}

impl ParseConfig {
    pub fn new() -> Self {
        ParseConfig::default()
    }

    /// Set the reporting name of the source.
    #[must_use]
    pub fn with_source_name(mut self, name: &str) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Use a grammar-supplied whitespace expression.
    #[must_use]
    pub fn with_whitespace(mut self, node: NodeId) -> Self {
        self.whitespace = Some(node);
        self
    }

    /// Bound the number of evaluator steps.
    #[must_use]
    pub fn with_step_limit(mut self, limit: u64) -> Self {
        self.step_limit = Some(limit);
        self
    }

    /// Pick the memoization strategy.
    #[must_use]
    pub fn with_memo(mut self, memo: MemoKind) -> Self {
        self.memo = memo;
        self
    }
}
