//! The pattern tree.
//!
//! Patterns are stored as paths of canonical segment keys below a root node.
//! Segment zero is the HTTP method, so every method owns its own top-level
//! branch. A node that ends at least one pattern holds a primary route and
//! any sibling routes sharing the same canonical shape.

use std::collections::HashMap;
use std::fmt;

use crate::route::RouteEntry;
use crate::segment::{Segment, SegmentChain};

/// One node of the pattern tree.
#[derive(Debug)]
pub struct TreeNode<H, C> {
    segment: Segment,
    children: HashMap<String, TreeNode<H, C>>,
    primary: Option<RouteEntry<H, C>>,
    siblings: Vec<RouteEntry<H, C>>,
    uncertain: bool,
}

impl<H, C> TreeNode<H, C> {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            children: HashMap::new(),
            primary: None,
            siblings: Vec::new(),
            uncertain: false,
        }
    }

    /// The canonical segment this node is keyed by.
    pub const fn segment(&self) -> &Segment {
        &self.segment
    }

    /// The child keyed by `key`.
    pub fn child(&self, key: &str) -> Option<&Self> {
        self.children.get(key)
    }

    /// Returns true if the node has children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True if any child key is a variable or wildcard.
    pub const fn is_uncertain(&self) -> bool {
        self.uncertain
    }

    /// The primary route, if this node terminates a pattern.
    pub const fn primary(&self) -> Option<&RouteEntry<H, C>> {
        self.primary.as_ref()
    }

    /// Routes that share this node's canonical shape with the primary.
    pub fn siblings(&self) -> &[RouteEntry<H, C>] {
        &self.siblings
    }

    /// The primary route followed by the siblings.
    pub fn routes(&self) -> impl Iterator<Item = &RouteEntry<H, C>> {
        self.primary.iter().chain(&self.siblings)
    }

    fn is_empty(&self) -> bool {
        self.primary.is_none() && self.siblings.is_empty() && self.children.is_empty()
    }

    fn children_uncertain(&self) -> bool {
        self.children
            .values()
            .any(|child| child.segment.style().is_uncertain())
    }

    /// Removes the routes selected by `pred`, promoting the first remaining
    /// sibling when the primary goes.
    fn remove_routes(&mut self, pred: &impl Fn(&RouteEntry<H, C>) -> bool) -> usize {
        let before = self.siblings.len();
        self.siblings.retain(|entry| !pred(entry));
        let mut removed = before - self.siblings.len();

        if self.primary.as_ref().is_some_and(pred) {
            self.primary = None;
            removed += 1;
        }
        if self.primary.is_none() && !self.siblings.is_empty() {
            self.primary = Some(self.siblings.remove(0));
        }
        removed
    }

    fn finalize(&mut self) {
        self.uncertain = self.children_uncertain();
        for child in self.children.values_mut() {
            child.finalize();
        }
    }

    fn count(&self) -> (usize, usize) {
        self.children.values().fold(
            (self.children.len(), self.routes().count()),
            |(nodes, routes), child| {
                let (n, r) = child.count();
                (nodes + n, routes + r)
            },
        )
    }

    /// Children ordered literal keys first, then by key.
    fn sorted_children(&self) -> Vec<&Self> {
        let mut children: Vec<&Self> = self.children.values().collect();
        children.sort_by(|a, b| {
            a.segment
                .style()
                .cmp(&b.segment.style())
                .then_with(|| a.segment.as_str().cmp(b.segment.as_str()))
        });
        children
    }

    fn write_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        for child in self.sorted_children() {
            write!(f, "{:indent$}{}", "", child.segment, indent = depth * 2)?;
            if child.uncertain {
                f.write_str(" ~")?;
            }
            let mut routes = child.routes().peekable();
            if routes.peek().is_some() {
                f.write_str(" =")?;
                for (i, route) in routes.enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{sep}{} {}", route.id, route.pattern.pattern())?;
                }
            }
            writeln!(f)?;
            child.write_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

/// A tree of registered patterns keyed by canonical segments.
#[derive(Debug)]
pub struct PatternTree<H, C> {
    root: TreeNode<H, C>,
    finalized: bool,
}

impl<H, C> Default for PatternTree<H, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, C> PatternTree<H, C> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: TreeNode::new(Segment::ROOT),
            finalized: true,
        }
    }

    /// The root node; its children are keyed by HTTP method.
    pub const fn root(&self) -> &TreeNode<H, C> {
        &self.root
    }

    /// Adds a route at the node reached by `chain`.
    ///
    /// The first route at a node becomes its primary route; later ones are
    /// appended as siblings. The tree must be finalized again before lookup.
    pub fn insert(&mut self, chain: &SegmentChain, entry: RouteEntry<H, C>) {
        let mut node = &mut self.root;
        for segment in chain.segments() {
            node = node
                .children
                .entry(segment.as_str().to_string())
                .or_insert_with(|| TreeNode::new(segment.clone()));
        }

        if node.primary.is_none() {
            node.primary = Some(entry);
        } else {
            node.siblings.push(entry);
        }
        self.finalized = false;
    }

    /// Removes the routes selected by `pred` from the node reached by
    /// `chain`, pruning nodes left empty.
    ///
    /// Returns the number of routes removed; a missing path removes nothing.
    pub fn remove(
        &mut self,
        chain: &SegmentChain,
        pred: impl Fn(&RouteEntry<H, C>) -> bool,
    ) -> usize {
        remove_at(&mut self.root, chain.segments(), &pred)
    }

    /// Recomputes every node's uncertain flag in one top-down pass.
    ///
    /// Lookups are only defined on a finalized tree.
    pub fn finalize_uncertainty(&mut self) {
        self.root.finalize();
        self.finalized = true;
    }

    /// False after an insertion until the next
    /// [`finalize_uncertainty`](Self::finalize_uncertainty).
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Number of nodes below the root.
    pub fn node_count(&self) -> usize {
        self.root.count().0
    }

    /// Number of routes held, primary and sibling.
    pub fn route_count(&self) -> usize {
        self.root.count().1
    }

    /// Returns true if the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

fn remove_at<H, C>(
    node: &mut TreeNode<H, C>,
    segments: &[Segment],
    pred: &impl Fn(&RouteEntry<H, C>) -> bool,
) -> usize {
    let Some((first, rest)) = segments.split_first() else {
        return node.remove_routes(pred);
    };
    let Some(child) = node.children.get_mut(first.as_str()) else {
        return 0;
    };

    let removed = remove_at(child, rest, pred);
    if child.is_empty() {
        node.children.remove(first.as_str());
        // Dropping a child can only clear uncertainty, never introduce it.
        node.uncertain = node.children_uncertain();
    }
    removed
}

impl<H, C> fmt::Display for PatternTree<H, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.root.write_tree(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathPattern;
    use crate::request::Method;
    use crate::route::RouteId;

    type Tree = PatternTree<&'static str, ()>;

    fn entry(id: u64, pattern: &str, handler: &'static str) -> RouteEntry<&'static str, ()> {
        RouteEntry {
            id: RouteId(id),
            method: Method::Get,
            pattern: PathPattern::new(pattern).unwrap(),
            conditions: (),
            handler,
        }
    }

    fn insert(tree: &mut Tree, id: u64, pattern: &str, handler: &'static str) {
        tree.insert(&SegmentChain::pattern("GET", pattern), entry(id, pattern, handler));
    }

    fn node<'t>(tree: &'t Tree, pattern: &str) -> Option<&'t TreeNode<&'static str, ()>> {
        let chain = SegmentChain::pattern("GET", pattern);
        chain
            .segments()
            .iter()
            .try_fold(tree.root(), |node, segment| node.child(segment.as_str()))
    }

    #[test]
    fn test_same_shape_becomes_sibling() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/x/{id}", "by_id");
        insert(&mut tree, 2, "/x/{other}", "by_other");

        let leaf = node(&tree, "/x/{any}").unwrap();
        assert_eq!(leaf.primary().unwrap().handler, "by_id");
        assert_eq!(leaf.siblings().len(), 1);
        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.route_count(), 2);
    }

    #[test]
    fn test_finalize_marks_levels_with_non_literal_keys() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/a/b", "lit");
        insert(&mut tree, 2, "/a/{x}", "var");
        insert(&mut tree, 3, "/c/d", "other");
        assert!(!tree.is_finalized());
        tree.finalize_uncertainty();
        assert!(tree.is_finalized());

        assert!(node(&tree, "/a").unwrap().is_uncertain());
        assert!(!node(&tree, "/c").unwrap().is_uncertain());
        assert!(!tree.root().is_uncertain());
    }

    #[test]
    fn test_remove_prunes_empty_ancestors() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/a/b/c", "deep");
        insert(&mut tree, 2, "/a", "shallow");

        let removed = tree.remove(&SegmentChain::pattern("GET", "/a/b/c"), |e| {
            e.id == RouteId(1)
        });
        assert_eq!(removed, 1);
        assert!(node(&tree, "/a/b").is_none());
        assert!(node(&tree, "/a").is_some());
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_remove_promotes_sibling() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/x/{id}", "by_id");
        insert(&mut tree, 2, "/x/{other}", "by_other");

        tree.remove(&SegmentChain::pattern("GET", "/x/{id}"), |e| e.id == RouteId(1));
        let leaf = node(&tree, "/x/{id}").unwrap();
        assert_eq!(leaf.primary().unwrap().handler, "by_other");
        assert!(leaf.siblings().is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/a/b", "ab");
        let chain = SegmentChain::pattern("GET", "/a/b");

        assert_eq!(tree.remove(&chain, |_| true), 1);
        assert!(tree.is_empty());
        assert_eq!(tree.remove(&chain, |_| true), 0);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_remove_clears_uncertainty() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/a/b", "lit");
        insert(&mut tree, 2, "/a/*", "star");
        tree.finalize_uncertainty();
        assert!(node(&tree, "/a").unwrap().is_uncertain());

        tree.remove(&SegmentChain::pattern("GET", "/a/*"), |_| true);
        assert!(!node(&tree, "/a").unwrap().is_uncertain());
    }

    #[test]
    fn test_display() {
        let mut tree = Tree::new();
        insert(&mut tree, 1, "/box/server/{userId}/download", "by_user");
        insert(&mut tree, 2, "/box/server/download", "plain");
        tree.finalize_uncertainty();

        let expected = "\
GET
  box
    server ~
      download = #2 /box/server/download
      {}
        download = #1 /box/server/{userId}/download
";
        assert_eq!(tree.to_string(), expected);
    }
}
