//! Segment matchers.
//!
//! Lookup walks the tree one level per request segment. At each level the
//! matchers run in a fixed order (literal, variable, single wildcard,
//! multi wildcard) and the first one that resolves to a validated terminal
//! wins. A level whose keys are all literal only runs the literal matcher.

use std::collections::HashSet;

use tracing::trace;

use crate::condition::RouteConditions;
use crate::route::{MatchResult, MatchSource, RouteId};
use crate::segment::{Cursor, Segment, SegmentStyle};
use crate::selector::{Candidate, MatchSelector};
use crate::tree::{PatternTree, TreeNode};

/// Per-request lookup state.
pub(crate) struct LookupContext<'t, 'q, H, C: RouteConditions> {
    selector: MatchSelector<'q, C>,
    /// Routes whose conditions already failed for this request.
    rejected: HashSet<RouteId>,
    found: Option<Vec<Candidate<'t, H, C>>>,
}

impl<'t, 'q, H, C: RouteConditions> LookupContext<'t, 'q, H, C> {
    pub fn new(selector: MatchSelector<'q, C>) -> Self {
        Self {
            selector,
            rejected: HashSet::new(),
            found: None,
        }
    }

    /// Evaluates a terminal node's routes, recording the candidates on
    /// success.
    fn validate(&mut self, node: &'t TreeNode<H, C>) -> bool {
        let rejected = &self.rejected;
        let candidates = self
            .selector
            .evaluate(node.routes().filter(|entry| !rejected.contains(&entry.id)));

        if candidates.is_empty() {
            self.rejected.extend(node.routes().map(|entry| entry.id));
            return false;
        }
        trace!(segment = %node.segment(), count = candidates.len(), "terminal matched");
        self.found = Some(candidates);
        true
    }

    /// Selects among the recorded candidates; `None` when the tree found
    /// nothing.
    fn into_result(self) -> Option<MatchResult<H>>
    where
        H: Clone,
    {
        let candidates = self.found?;
        let request = self.selector.request();
        Some(self.selector.select(candidates, MatchSource::Tree, |a, b| {
            a.conditions.compare_to(&b.conditions, request)
        }))
    }
}

/// The four matching strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SegmentMatcher {
    Literal,
    Variable,
    Wildcard,
    DoubleWildcard,
}

impl SegmentMatcher {
    /// Matchers in precedence order.
    pub const CHAIN: [Self; 4] = [
        Self::Literal,
        Self::Variable,
        Self::Wildcard,
        Self::DoubleWildcard,
    ];

    const fn style(self) -> SegmentStyle {
        match self {
            Self::Literal => SegmentStyle::Literal,
            Self::Variable => SegmentStyle::Variable,
            Self::Wildcard => SegmentStyle::Wildcard,
            Self::DoubleWildcard => SegmentStyle::DoubleWildcard,
        }
    }

    /// The tree key this matcher probes for the segment under `cursor`.
    fn key<'c>(self, cursor: &Cursor<'c>) -> &'c str {
        match self.style().canonical_key() {
            Some(key) => key,
            None => cursor.segment().as_str(),
        }
    }

    fn try_match<'t, H, C: RouteConditions>(
        self,
        owner: &'t TreeNode<H, C>,
        cursor: Cursor<'_>,
        ctx: &mut LookupContext<'t, '_, H, C>,
    ) -> Option<&'t TreeNode<H, C>> {
        match self {
            Self::Literal | Self::Wildcard => {
                let node = owner.child(self.key(&cursor))?;
                descend(node, cursor, ctx)
            }
            Self::Variable => {
                // A variable needs at least one character.
                let segment = cursor.segment();
                if segment.is_root() || segment.as_str().is_empty() {
                    return None;
                }
                let node = owner.child(self.key(&cursor))?;
                descend(node, cursor, ctx)
            }
            Self::DoubleWildcard => {
                let node = owner.child(self.key(&cursor))?;
                if cursor.is_leaf() {
                    if let Some(found) = validate_terminal(node, ctx) {
                        return Some(found);
                    }
                }
                // Swallow zero or more segments, resuming below `**` at the
                // first position that matches.
                if node.has_children() {
                    for resume in cursor.remaining() {
                        if let Some(found) = match_level(node, resume, ctx) {
                            return Some(found);
                        }
                    }
                }
                validate_terminal(node, ctx)
            }
        }
    }
}

/// Walks the tree for a request chain and selects among the routes of the
/// first validated terminal.
///
/// Returns `None` when the tree holds no satisfying route.
pub(crate) fn lookup<'t, H: Clone, C: RouteConditions>(
    tree: &'t PatternTree<H, C>,
    cursor: Cursor<'_>,
    mut ctx: LookupContext<'t, '_, H, C>,
) -> Option<MatchResult<H>> {
    match_level(tree.root(), cursor, &mut ctx)?;
    ctx.into_result()
}

/// Matches the segment under `cursor` against the children of `owner`.
fn match_level<'t, H, C: RouteConditions>(
    owner: &'t TreeNode<H, C>,
    cursor: Cursor<'_>,
    ctx: &mut LookupContext<'t, '_, H, C>,
) -> Option<&'t TreeNode<H, C>> {
    if !owner.has_children() {
        return None;
    }
    let matchers = if owner.is_uncertain() {
        &SegmentMatcher::CHAIN[..]
    } else {
        &SegmentMatcher::CHAIN[..1]
    };
    matchers
        .iter()
        .find_map(|matcher| matcher.try_match(owner, cursor, ctx))
}

/// Continues below `node`, which matched the segment under `cursor`.
fn descend<'t, H, C: RouteConditions>(
    node: &'t TreeNode<H, C>,
    cursor: Cursor<'_>,
    ctx: &mut LookupContext<'t, '_, H, C>,
) -> Option<&'t TreeNode<H, C>> {
    match cursor.next() {
        None => validate_terminal(node, ctx),
        Some(next) => match_level(node, next, ctx),
    }
}

/// Validates a node reached at the end of the request.
///
/// A trailing `**` child counts as a zero-length match.
fn validate_terminal<'t, H, C: RouteConditions>(
    node: &'t TreeNode<H, C>,
    ctx: &mut LookupContext<'t, '_, H, C>,
) -> Option<&'t TreeNode<H, C>> {
    if ctx.validate(node) {
        return Some(node);
    }
    let trailing = node.child(Segment::DOUBLE_WILDCARD.as_str())?;
    ctx.validate(trailing).then_some(trailing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::RequestConditions;
    use crate::path::PathPattern;
    use crate::request::{Method, Request};
    use crate::route::RouteEntry;
    use crate::segment::SegmentChain;

    type Tree = PatternTree<&'static str, RequestConditions>;

    fn build(patterns: &[(&str, &'static str)]) -> Tree {
        let mut tree = Tree::new();
        for (i, (pattern, handler)) in patterns.iter().enumerate() {
            let entry = RouteEntry {
                id: RouteId(i as u64),
                method: Method::Get,
                pattern: PathPattern::new(pattern).unwrap(),
                conditions: RequestConditions::new(),
                handler: *handler,
            };
            tree.insert(&SegmentChain::pattern("GET", pattern), entry);
        }
        tree.finalize_uncertainty();
        tree
    }

    fn resolve(tree: &Tree, path: &str) -> Option<&'static str> {
        let request = Request::get(path);
        let chain = SegmentChain::request("GET", path);
        let ctx = LookupContext::new(MatchSelector::new(&request, path));
        lookup(tree, chain.cursor(), ctx)?.handler().copied()
    }

    #[test]
    fn test_precedence_per_level() {
        let tree = build(&[
            ("/a/b", "literal"),
            ("/a/{x}", "variable"),
            ("/a/*", "wildcard"),
            ("/a/**", "any"),
        ]);
        assert_eq!(resolve(&tree, "/a/b"), Some("literal"));
        assert_eq!(resolve(&tree, "/a/c"), Some("variable"));
        assert_eq!(resolve(&tree, "/a/c/d"), Some("any"));
    }

    #[test]
    fn test_wildcard_after_variable() {
        let tree = build(&[("/a/*", "wildcard"), ("/a/**", "any")]);
        assert_eq!(resolve(&tree, "/a/c"), Some("wildcard"));
    }

    #[test]
    fn test_literal_failing_deeper_falls_through() {
        let tree = build(&[("/a/b/c", "literal"), ("/a/{x}/d", "variable")]);
        assert_eq!(resolve(&tree, "/a/b/d"), Some("variable"));
        assert_eq!(resolve(&tree, "/a/b/c"), Some("literal"));
    }

    #[test]
    fn test_certain_level_fails_as_a_whole() {
        let tree = build(&[("/a/b/c", "abc")]);
        assert_eq!(resolve(&tree, "/a/b"), None);
        assert_eq!(resolve(&tree, "/a/b/c/d"), None);
    }

    #[test]
    fn test_double_wildcard_resync() {
        let tree = build(&[("/a/**/d", "middle"), ("/a/b/**", "tail")]);
        assert_eq!(resolve(&tree, "/a/x/y/d"), Some("middle"));
        assert_eq!(resolve(&tree, "/a/d"), Some("middle"));
        assert_eq!(resolve(&tree, "/a/b/c/d/e"), Some("tail"));
        assert_eq!(resolve(&tree, "/a/x/y"), None);
    }

    #[test]
    fn test_trailing_double_wildcard_is_zero_length() {
        let tree = build(&[("/a/b/**", "tail")]);
        assert_eq!(resolve(&tree, "/a/b"), Some("tail"));
    }

    #[test]
    fn test_capture_rest_is_indexed_as_double_wildcard() {
        let tree = build(&[("/files/{*path}", "files")]);
        assert_eq!(resolve(&tree, "/files/docs/readme.md"), Some("files"));
    }

    #[test]
    fn test_variable_rejects_empty_segment() {
        let tree = build(&[("/a/{x}", "variable")]);
        assert_eq!(resolve(&tree, "/a/"), None);
        assert_eq!(resolve(&tree, "/a//"), None);
    }

    #[test]
    fn test_root_pattern() {
        let tree = build(&[("/", "root"), ("/a", "a")]);
        assert_eq!(resolve(&tree, "/"), Some("root"));
        assert_eq!(resolve(&tree, "/a"), Some("a"));
    }

    #[test]
    fn test_method_branch() {
        let tree = build(&[("/a", "a")]);
        let request = Request::post("/a");
        let chain = SegmentChain::request("POST", "/a");
        let ctx = LookupContext::new(MatchSelector::new(&request, "/a"));
        assert!(lookup(&tree, chain.cursor(), ctx).is_none());
    }

    #[test]
    fn test_failed_conditions_fall_through() {
        let mut tree = Tree::new();
        let literal = RouteEntry {
            id: RouteId(1),
            method: Method::Get,
            pattern: PathPattern::new("/a/b").unwrap(),
            conditions: RequestConditions::new().param("debug"),
            handler: "literal",
        };
        let variable = RouteEntry {
            id: RouteId(2),
            method: Method::Get,
            pattern: PathPattern::new("/a/{x}").unwrap(),
            conditions: RequestConditions::new(),
            handler: "variable",
        };
        tree.insert(&SegmentChain::pattern("GET", "/a/b"), literal);
        tree.insert(&SegmentChain::pattern("GET", "/a/{x}"), variable);
        tree.finalize_uncertainty();

        assert_eq!(resolve(&tree, "/a/b"), Some("variable"));
    }
}
