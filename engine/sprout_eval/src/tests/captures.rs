//! Token whitespace folding, captures, and the tree query surface.

use pretty_assertions::assert_eq;
use sprout_graph::GraphBuilder;

use super::run;
use crate::{parse, ParseConfig, Span};

#[test]
fn token_folds_trailing_whitespace() {
    let mut b = GraphBuilder::new();
    let word = b.literal("foo");
    let root = b.token(word);
    let graph = b.build(root).unwrap();

    let result = run(&graph, "foo   bar");
    assert!(result.succeeded);
    assert_eq!(result.end_position, 6);
}

#[test]
fn plain_literal_keeps_its_own_end() {
    let mut b = GraphBuilder::new();
    let root = b.literal("foo");
    let graph = b.build(root).unwrap();

    assert_eq!(run(&graph, "foo   bar").end_position, 3);
}

#[test]
fn token_capture_excludes_the_folded_whitespace() {
    let mut b = GraphBuilder::new();
    let word = b.literal("foo");
    let tok = b.token(word);
    let tok = b.capture_text("word", tok);
    let bar = b.literal("bar");
    let root = b.seq(&[tok, bar]);
    let graph = b.build(root).unwrap();

    let result = run(&graph, "foo   bar");
    assert!(result.matched);

    let word = result.tree.child("word").unwrap();
    assert_eq!(word.span(), Span::new(0, 3));
    assert_eq!(result.tree.text_of(word), "foo");
}

#[test]
fn whitespace_node_uses_the_builtin_skipper() {
    let mut b = GraphBuilder::new();
    let a = b.literal("a");
    let ws = b.whitespace();
    let z = b.literal("b");
    let root = b.seq(&[a, ws, z]);
    let graph = b.build(root).unwrap();

    assert!(run(&graph, "a \t\r\n b").matched);
    assert!(run(&graph, "ab").matched);
}

#[test]
fn configured_whitespace_expression_wins() {
    let mut b = GraphBuilder::new();
    let underscore = b.char_set("_");
    let ws_expr = b.zero_or_more(underscore);
    let a = b.literal("a");
    let tok = b.token(a);
    let z = b.literal("b");
    let root = b.seq(&[tok, z]);
    let graph = b.build(root).unwrap();

    let config = ParseConfig::default().with_whitespace(ws_expr);
    let result = parse(&graph, "a__b", &config).unwrap();
    assert!(result.matched);

    // spaces are no longer whitespace under the custom expression
    let result = parse(&graph, "a  b", &config).unwrap();
    assert!(!result.succeeded);
}

#[test]
fn stock_whitespace_expression_matches_the_builtin() {
    let mut b = GraphBuilder::new();
    let ws_expr = b.default_whitespace();
    let a = b.literal("a");
    let tok = b.token(a);
    let z = b.literal("b");
    let root = b.seq(&[tok, z]);
    let graph = b.build(root).unwrap();

    let config = ParseConfig::default().with_whitespace(ws_expr);
    assert!(parse(&graph, "a \t b", &config).unwrap().matched);
}

#[test]
fn single_captures_nest() {
    let mut b = GraphBuilder::new();
    let letter = b.char_range(b'a', b'z');
    let key_run = b.one_or_more(letter);
    let key = b.capture_text("key", key_run);
    let eq = b.literal("=");
    let letter2 = b.char_range(b'a', b'z');
    let value_run = b.one_or_more(letter2);
    let value = b.capture_text("value", value_run);
    let pair = b.seq(&[key, eq, value]);
    let pair = b.capture("pair", pair);
    let graph = b.build(pair).unwrap();

    let result = run(&graph, "mode=fast");
    assert!(result.matched);

    let pair = result.tree.child("pair").unwrap();
    assert_eq!(pair.span(), Span::new(0, 9));
    assert_eq!(result.tree.text_of(pair.child("key").unwrap()), "mode");
    assert_eq!(result.tree.text_of(pair.child("value").unwrap()), "fast");

    // path lookup and the map view agree
    assert_eq!(result.tree.find("pair/value").unwrap().span(), Span::new(5, 9));
    let map = pair.named_map();
    assert_eq!(map.len(), 2);
    assert_eq!(map["key"].span(), Span::new(0, 4));
}

#[test]
fn multi_captures_repeat_under_one_parent() {
    let mut b = GraphBuilder::new();
    let letter = b.char_range(b'a', b'z');
    let item = b.capture_multi("item", letter);
    let items = b.one_or_more(item);
    let list = b.capture("list", items);
    let graph = b.build(list).unwrap();

    let result = run(&graph, "abc");
    assert!(result.matched);

    let list = result.tree.child("list").unwrap();
    assert_eq!(list.children().len(), 3);
    assert_eq!(list.children_named("item").count(), 3);
    assert!(list.children()[0].is_multi());
    assert_eq!(list.children()[1].span(), Span::new(1, 2));
}

#[test]
fn text_capture_drops_child_captures() {
    let mut b = GraphBuilder::new();
    let letter = b.char_range(b'a', b'z');
    let inner = b.capture_multi("c", letter);
    let word_run = b.one_or_more(inner);
    let word = b.capture_text("word", word_run);
    let graph = b.build(word).unwrap();

    let result = run(&graph, "hi");
    assert!(result.matched);

    let word = result.tree.child("word").unwrap();
    assert!(word.children().is_empty());
    assert_eq!(result.tree.text_of(word), "hi");
}

#[test]
fn failed_branches_leave_no_fragments() {
    let mut b = GraphBuilder::new();
    let letter = b.char_range(b'a', b'z');
    let word_run = b.zero_or_more(letter);
    let word = b.capture_text("word", word_run);
    let bang = b.literal("!");
    let first = b.seq(&[word, bang]);
    let digit = b.char_range(b'0', b'9');
    let num = b.capture_text("num", digit);
    let root = b.choice(&[first, num]);
    let graph = b.build(root).unwrap();

    // the first alternative captures `word` (empty) and then fails on
    // `!`; its fragment must not survive into the second alternative
    let result = run(&graph, "7");
    assert!(result.matched);
    assert!(result.tree.child("word").is_none());
    assert!(result.tree.child("num").is_some());
}

#[test]
fn no_captures_means_an_empty_tree() {
    let mut b = GraphBuilder::new();
    let root = b.literal("x");
    let graph = b.build(root).unwrap();

    let result = run(&graph, "x");
    assert!(result.matched);
    assert!(result.tree.is_empty());
}
