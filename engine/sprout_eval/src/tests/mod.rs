//! Cross-cutting evaluator scenarios.
//!
//! Unit tests for individual data structures live beside their modules;
//! everything here drives full parses through the public surface.

mod captures;
mod leftrec;

use sprout_graph::Graph;

use crate::{parse, ParseConfig, ParseResult};

/// Parse with default configuration, panicking on fatal errors.
fn run(graph: &Graph, text: &str) -> ParseResult {
    parse(graph, text, &ParseConfig::default()).expect("parse aborted")
}
