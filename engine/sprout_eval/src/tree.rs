//! Capture output: spans, tree nodes, and the query surface.

use rustc_hash::FxHashMap;

/// Byte range in the source text.
///
/// 8 bytes, `Copy`. Capture spans end at the last non-whitespace offset, so
/// token whitespace never leaks into captured text.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One captured node of the output tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeNode {
    name: Box<str>,
    span: Span,
    multi: bool,
    children: Vec<TreeNode>,
}

impl TreeNode {
    pub(crate) fn new(name: Box<str>, span: Span, multi: bool, children: Vec<TreeNode>) -> Self {
        TreeNode {
            name,
            span,
            multi,
            children,
        }
    }

    /// Capture name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Byte range of the capture, trailing whitespace excluded.
    pub fn span(&self) -> Span {
        self.span
    }

    /// True for captures declared repeatable.
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Child captures, in match order.
    pub fn children(&self) -> &[TreeNode] {
        &self.children
    }

    /// First immediate child with the given name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| &*c.name == name)
    }

    /// All immediate children with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a TreeNode> + 'a {
        self.children.iter().filter(move |c| &*c.name == name)
    }

    /// Path lookup: `"a/b/c"` descends through named children, taking the
    /// first match at each step.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        let mut cursor = self;
        for step in path.split('/').filter(|s| !s.is_empty()) {
            cursor = cursor.child(step)?;
        }
        Some(cursor)
    }

    /// Map view of immediate named children (first occurrence per name).
    pub fn named_map(&self) -> FxHashMap<&str, &TreeNode> {
        let mut map = FxHashMap::default();
        for child in &self.children {
            map.entry(&*child.name).or_insert(child);
        }
        map
    }
}

/// The tree produced by one parse, plus the text it indexes into.
///
/// Empty (a root with no children) when the grammar declares no captures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseTree {
    source: Box<str>,
    root: TreeNode,
}

impl ParseTree {
    pub(crate) fn new(source: &str, fragments: Vec<TreeNode>) -> Self {
        let end = fragments.iter().map(|f| f.span.end).max().unwrap_or(0);
        ParseTree {
            source: source.into(),
            root: TreeNode::new("".into(), Span::new(0, end), false, fragments),
        }
    }

    /// Synthetic unnamed root holding the top-level captures.
    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    /// True when no capture fired.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// First top-level capture with the given name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.root.child(name)
    }

    /// Path lookup from the root.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        self.root.find(path)
    }

    /// Text a node matched.
    pub fn text_of(&self, node: &TreeNode) -> &str {
        self.source
            .get(node.span.start as usize..node.span.end as usize)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(name: &str, start: u32, end: u32) -> TreeNode {
        TreeNode::new(name.into(), Span::new(start, end), false, Vec::new())
    }

    fn sample() -> ParseTree {
        let inner = TreeNode::new(
            "pair".into(),
            Span::new(0, 5),
            false,
            vec![leaf("key", 0, 1), leaf("value", 2, 5)],
        );
        ParseTree::new("k=abc", vec![inner])
    }

    #[test]
    fn named_child_lookup() {
        let tree = sample();
        let pair = tree.child("pair").unwrap();
        assert_eq!(pair.child("key").unwrap().span(), Span::new(0, 1));
        assert!(pair.child("missing").is_none());
    }

    #[test]
    fn path_lookup() {
        let tree = sample();
        let value = tree.find("pair/value").unwrap();
        assert_eq!(tree.text_of(value), "abc");
        assert!(tree.find("pair/none").is_none());
        assert!(tree.find("none/value").is_none());
    }

    #[test]
    fn map_view_keeps_first_per_name() {
        let dup = TreeNode::new(
            "row".into(),
            Span::new(0, 4),
            false,
            vec![leaf("item", 0, 1), leaf("item", 2, 3)],
        );
        let map = dup.named_map();
        assert_eq!(map.len(), 1);
        assert_eq!(map["item"].span(), Span::new(0, 1));
        assert_eq!(dup.children_named("item").count(), 2);
    }

    #[test]
    fn empty_tree() {
        let tree = ParseTree::new("abc", Vec::new());
        assert!(tree.is_empty());
        assert_eq!(tree.root().span(), Span::new(0, 0));
    }
}
