//! Seed-grown left recursion, associativity, and precedence climbing.

use pretty_assertions::assert_eq;
use sprout_graph::{Graph, GraphBuilder, NodeFlags};

use super::run;
use crate::{parse, MemoKind, ParseConfig, Span};

/// `expr := expr "+" expr | digit`, optionally left-associative.
fn addition(left_associative: bool) -> Graph {
    let mut b = GraphBuilder::new();
    let expr = b.rule("expr");
    let digit = b.char_range(b'0', b'9');
    let digit = b.capture_text("num", digit);
    let plus = b.literal("+");
    let add = b.seq(&[expr, plus, expr]);
    let add = b.capture("add", add);
    let body = b.choice(&[add, digit]);
    b.mark(body, NodeFlags::LEFT_RECURSIVE);
    if left_associative {
        b.mark(body, NodeFlags::LEFT_ASSOCIATIVE);
    }
    b.define("expr", body).unwrap();
    b.build(body).unwrap()
}

#[test]
fn plain_left_recursion_is_right_associative() {
    let graph = addition(false);
    let result = run(&graph, "1+1+1");
    assert!(result.matched);
    assert_eq!(result.end_position, 5);

    // 1 + (1 + 1): the right operand of the outer `+` is the nested `+`
    let outer = result.tree.child("add").unwrap();
    assert_eq!(outer.span(), Span::new(0, 5));
    assert_eq!(outer.children()[0].name(), "num");
    assert_eq!(outer.children()[1].name(), "add");
    assert_eq!(outer.children()[1].span(), Span::new(2, 5));
}

#[test]
fn left_associative_produces_the_mirror_tree() {
    let graph = addition(true);
    let result = run(&graph, "1+1+1");
    assert!(result.matched);
    assert_eq!(result.end_position, 5);

    // (1 + 1) + 1: the left operand of the outer `+` is the nested `+`
    let outer = result.tree.child("add").unwrap();
    assert_eq!(outer.span(), Span::new(0, 5));
    assert_eq!(outer.children()[0].name(), "add");
    assert_eq!(outer.children()[0].span(), Span::new(0, 3));
    assert_eq!(outer.children()[1].name(), "num");
    assert_eq!(outer.children()[1].span(), Span::new(4, 5));
}

#[test]
fn left_recursion_matches_a_single_operand() {
    let graph = addition(false);
    let result = run(&graph, "7");
    assert!(result.matched);
    assert!(result.tree.child("num").is_some());
    assert!(result.tree.child("add").is_none());
}

#[test]
fn growth_stops_at_the_last_full_operator() {
    let graph = addition(false);
    // trailing `+` has no right operand; the best seed is `1+1`
    let result = run(&graph, "1+1+");
    assert!(result.succeeded);
    assert!(!result.matched);
    assert_eq!(result.end_position, 3);
}

/// `expr := expr "*" expr @2 | expr "+" expr @1 | digit`, both operators
/// left-associative, alternatives listed in decreasing precedence.
fn arithmetic() -> Graph {
    let mut b = GraphBuilder::new();
    let expr = b.rule("expr");
    let digit = b.char_range(b'0', b'9');
    let digit = b.capture_text("num", digit);

    let star = b.literal("*");
    let mul = b.seq(&[expr, star, expr]);
    let mul = b.capture("mul", mul);
    b.set_precedence(mul, 2);
    b.mark(mul, NodeFlags::LEFT_ASSOCIATIVE);

    let plus = b.literal("+");
    let add = b.seq(&[expr, plus, expr]);
    let add = b.capture("add", add);
    b.set_precedence(add, 1);
    b.mark(add, NodeFlags::LEFT_ASSOCIATIVE);

    let body = b.choice(&[mul, add, digit]);
    b.mark(body, NodeFlags::LEFT_RECURSIVE);
    b.define("expr", body).unwrap();
    b.build(body).unwrap()
}

#[test]
fn multiplication_binds_tighter_on_the_right() {
    let graph = arithmetic();
    let result = run(&graph, "1+1*1");
    assert!(result.matched);

    // 1 + (1 * 1)
    let add = result.tree.child("add").unwrap();
    assert_eq!(add.children()[0].name(), "num");
    assert_eq!(add.children()[1].name(), "mul");
    assert_eq!(add.children()[1].span(), Span::new(2, 5));
}

#[test]
fn multiplication_binds_tighter_on_the_left() {
    let graph = arithmetic();
    let result = run(&graph, "1*1+1");
    assert!(result.matched);

    // (1 * 1) + 1
    let add = result.tree.child("add").unwrap();
    assert_eq!(add.children()[0].name(), "mul");
    assert_eq!(add.children()[0].span(), Span::new(0, 3));
    assert_eq!(add.children()[1].name(), "num");
    assert_eq!(add.children()[1].span(), Span::new(4, 5));
}

#[test]
fn same_level_operators_associate_left() {
    let graph = arithmetic();
    let result = run(&graph, "1+2+3");
    assert!(result.matched);

    let outer = result.tree.child("add").unwrap();
    assert_eq!(outer.children()[0].name(), "add");
    assert_eq!(outer.children()[0].span(), Span::new(0, 3));
}

#[test]
fn long_chains_grow_to_the_end() {
    let graph = addition(true);
    let text = "1".to_string() + &"+1".repeat(40);
    let result = run(&graph, &text);
    assert!(result.matched);
    assert_eq!(result.end_position, text.len());
}

#[test]
fn memoization_does_not_disturb_left_recursion() {
    let mut b = GraphBuilder::new();
    let expr = b.rule("expr");
    let digit = b.char_range(b'0', b'9');
    let digit = b.capture_text("num", digit);
    b.mark(digit, NodeFlags::MEMOIZE);
    let plus = b.literal("+");
    let add = b.seq(&[expr, plus, expr]);
    let add = b.capture("add", add);
    let body = b.choice(&[add, digit]);
    b.mark(body, NodeFlags::LEFT_RECURSIVE);
    b.define("expr", body).unwrap();
    let graph = b.build(body).unwrap();

    let packrat = parse(&graph, "1+2+3", &ParseConfig::default()).unwrap();
    let config = ParseConfig::default().with_memo(MemoKind::Disabled);
    let uncached = parse(&graph, "1+2+3", &config).unwrap();

    assert!(packrat.matched);
    assert_eq!(packrat.end_position, uncached.end_position);
    assert_eq!(packrat.tree, uncached.tree);
}
