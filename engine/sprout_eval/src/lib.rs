//! Evaluator core of the Sprout PEG engine.
//!
//! Takes a linked expression graph from `sprout_graph` and runs it against
//! a text: packrat memoization, left recursion (including left-associative
//! operators) by seed growing, precedence climbing, explicit cuts, and a
//! transactional parse state that builds the capture tree incrementally
//! while backtracking.
//!
//! ```
//! use sprout_graph::GraphBuilder;
//! use sprout_eval::{parse, ParseConfig};
//!
//! let mut b = GraphBuilder::new();
//! let digit = b.char_range(b'0', b'9');
//! let digits = b.one_or_more(digit);
//! let number = b.capture_text("number", digits);
//! let graph = b.build(number).unwrap();
//!
//! let result = parse(&graph, "427", &ParseConfig::default()).unwrap();
//! assert!(result.matched);
//! let number = result.tree.child("number").unwrap();
//! assert_eq!(result.tree.text_of(number), "427");
//! ```
//!
//! The evaluator is single-threaded and synchronous. A [`Graph`] may be
//! shared across sequential parses; everything per-parse lives in the
//! [`State`] and the memo table, which are created fresh by [`parse`].
//!
//! [`Graph`]: sprout_graph::Graph

mod config;
mod error;
mod eval;
mod memo;
mod outcome;
mod source;
mod stack;
mod state;
mod tree;

#[cfg(test)]
mod tests;

pub use config::{MemoKind, ParseConfig};
pub use error::{ErrorReport, ErrorSink, EvalError, FarthestFailure};
pub use eval::{parse, parse_with, ParseResult};
pub use memo::{MemoStrategy, NullMemo, PackratMemo};
pub use outcome::Outcome;
pub use source::Source;
pub use state::{Mark, Snapshot, State};
pub use tree::{ParseTree, Span, TreeNode};
