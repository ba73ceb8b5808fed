//! Failure recording and fatal evaluator errors.
//!
//! Ordinary parse failure is data (`Mark::FAIL`), recovered locally by the
//! combinator that caused the sub-call; the types here cover the two other
//! channels. `ErrorSink` is the best-effort recording side channel that
//! turns failures of flagged nodes into a user-facing report, and
//! [`EvalError`] is the fatal path reserved for a parse that must abort.

use std::fmt;

use sprout_graph::{Graph, NodeId};
use thiserror::Error;

/// Fatal evaluation errors.
///
/// These abort the parse; a grammar simply not matching is never one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    /// The configured step budget ran out (runaway grammar).
    #[error("step budget of {budget} exhausted at offset {offset}")]
    StepBudgetExhausted { budget: u64, offset: usize },

    /// Input longer than the 32-bit cursor can address.
    #[error("source text of {len} bytes exceeds the u32 cursor range")]
    SourceTooLarge { len: usize },
}

/// Recording strategy for parse failures.
///
/// The evaluator hands every recordable failure to `handle`; `report`
/// renders whatever the sink retained once the parse is over.
pub trait ErrorSink {
    /// A flagged node failed at `offset`.
    fn handle(&mut self, node: NodeId, offset: u32);

    /// Render the retained failures.
    fn report(&self, graph: &Graph, source_name: Option<&str>) -> ErrorReport;
}

/// Default sink: keep only the failures at the farthest offset reached.
///
/// The deepest-progressing branch is the likeliest intended parse, so its
/// expectations make the most useful report.
#[derive(Debug, Default)]
pub struct FarthestFailure {
    offset: u32,
    nodes: Vec<NodeId>,
}

impl FarthestFailure {
    pub fn new() -> Self {
        FarthestFailure::default()
    }
}

impl ErrorSink for FarthestFailure {
    fn handle(&mut self, node: NodeId, offset: u32) {
        if offset > self.offset {
            self.offset = offset;
            self.nodes.clear();
        }
        if offset == self.offset && !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
    }

    fn report(&self, graph: &Graph, source_name: Option<&str>) -> ErrorReport {
        ErrorReport {
            offset: self.offset as usize,
            expected: self
                .nodes
                .iter()
                .map(|&id| graph.node(id).describe().into_boxed_str())
                .collect(),
            source_name: source_name.map(Into::into),
        }
    }
}

/// User-facing failure summary: the farthest offset reached and what was
/// expected there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    offset: usize,
    expected: Vec<Box<str>>,
    source_name: Option<Box<str>>,
}

impl ErrorReport {
    /// Farthest offset any recorded branch reached.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Descriptions of the nodes expected at that offset.
    pub fn expected(&self) -> &[Box<str>] {
        &self.expected
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.source_name {
            write!(f, "{name}: ")?;
        }
        if self.expected.is_empty() {
            write!(f, "parse failed at offset {}", self.offset)
        } else {
            write!(f, "expected ")?;
            for (i, description) in self.expected.iter().enumerate() {
                if i > 0 {
                    let sep = if i + 1 == self.expected.len() {
                        " or "
                    } else {
                        ", "
                    };
                    write!(f, "{sep}")?;
                }
                write!(f, "{description}")?;
            }
            write!(f, " at offset {}", self.offset)
        }
    }
}
