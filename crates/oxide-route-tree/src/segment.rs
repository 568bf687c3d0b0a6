//! Segment chains.
//!
//! A route pattern or a request path is combined with its HTTP method into
//! `/METHOD/path` and split on `/` into a chain of [`Segment`]s. Pattern
//! chains classify each token by style; request chains keep every token as
//! literal text.

use std::borrow::Cow;
use std::fmt;

/// The path separator, also used as the segment for the root path.
pub const SEPARATOR: &str = "/";

/// Classification of a pattern segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SegmentStyle {
    /// Plain text, matched exactly.
    Literal,
    /// `{name}`: matches any single segment.
    Variable,
    /// `*`: matches any single segment.
    Wildcard,
    /// `**` (or `{*name}`): matches zero or more segments.
    DoubleWildcard,
}

impl SegmentStyle {
    /// Returns true for every style except [`SegmentStyle::Literal`].
    pub const fn is_uncertain(self) -> bool {
        !matches!(self, Self::Literal)
    }

    /// The tree key shared by every segment of this style; `None` for
    /// literals, which are keyed by their own text.
    pub const fn canonical_key(self) -> Option<&'static str> {
        match self {
            Self::Literal => None,
            Self::Variable => Some("{}"),
            Self::Wildcard => Some("*"),
            Self::DoubleWildcard => Some("**"),
        }
    }
}

/// One `/`-delimited token in canonical form.
///
/// Literal segments keep their text verbatim. Variables and wildcards are
/// collapsed to a fixed symbol so that `/users/{id}` and `/users/{name}`
/// share a tree path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    text: Cow<'static, str>,
    style: SegmentStyle,
}

impl Segment {
    /// Canonical variable segment.
    pub const VARIABLE: Self = Self::canonical("{}", SegmentStyle::Variable);
    /// Canonical single-segment wildcard.
    pub const WILDCARD: Self = Self::canonical("*", SegmentStyle::Wildcard);
    /// Canonical multi-segment wildcard.
    pub const DOUBLE_WILDCARD: Self = Self::canonical("**", SegmentStyle::DoubleWildcard);
    /// The root segment, produced for `/` and for a trailing slash.
    pub const ROOT: Self = Self::canonical(SEPARATOR, SegmentStyle::Literal);

    const fn canonical(text: &'static str, style: SegmentStyle) -> Self {
        Self {
            text: Cow::Borrowed(text),
            style,
        }
    }

    /// Classifies a pattern token and returns its canonical segment.
    ///
    /// `{name}` becomes [`Segment::VARIABLE`], `{*name}` and `**` become
    /// [`Segment::DOUBLE_WILDCARD`], `*` becomes [`Segment::WILDCARD`].
    /// Anything else, including unbalanced braces such as `{open`, is a
    /// literal.
    pub fn parse(token: &str) -> Self {
        match token {
            "*" => Self::WILDCARD,
            "**" => Self::DOUBLE_WILDCARD,
            _ => match variable_name(token) {
                Some(name) if name.starts_with('*') => Self::DOUBLE_WILDCARD,
                Some(_) => Self::VARIABLE,
                None => Self::literal(token),
            },
        }
    }

    /// Creates a literal segment without classification.
    pub fn literal(token: &str) -> Self {
        Self {
            text: Cow::Owned(token.to_string()),
            style: SegmentStyle::Literal,
        }
    }

    /// The canonical text, used as the tree key.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The style of this segment.
    pub const fn style(&self) -> SegmentStyle {
        self.style
    }

    /// Returns true if this is the root (or trailing slash) segment.
    pub fn is_root(&self) -> bool {
        self.text == SEPARATOR
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Returns the inner text of a `{...}` token, or `None` if the token is not
/// brace-delimited.
pub(crate) fn variable_name(token: &str) -> Option<&str> {
    token
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
}

/// Returns true if the brace-delimited token is a plain `{name}` or
/// `{*name}` variable the tree can index.
///
/// Tokens such as `{id:\d+}` or `{a}{b}` carry matching rules the tree does
/// not evaluate.
pub(crate) fn is_plain_variable(token: &str) -> bool {
    variable_name(token).is_none_or(|inner| {
        let name = inner.strip_prefix('*').unwrap_or(inner);
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    })
}

/// Returns true if the tree can index `pattern`.
///
/// Patterns with `?`, constrained or embedded variables such as `{id:\d+}`
/// or `file.{ext}`, or `*` inside a segment are left to the fallback
/// matcher.
pub(crate) fn is_tree_compatible(pattern: &str) -> bool {
    !pattern.contains('?')
        && pattern.split('/').all(|token| match token {
            "*" | "**" => true,
            _ if variable_name(token).is_some() => is_plain_variable(token),
            _ => {
                let embedded = token
                    .find('{')
                    .is_some_and(|open| token[open..].contains('}'));
                !embedded && !token.contains('*')
            }
        })
}

/// Joins an HTTP method and a path into the `/METHOD/path` form.
///
/// The method is upper-cased, and a path without a leading slash gets one.
pub fn combine(method: &str, path: &str) -> String {
    let method = method.to_uppercase();
    if path.starts_with('/') {
        format!("/{method}{path}")
    } else {
        format!("/{method}/{path}")
    }
}

/// An immutable sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentChain {
    segments: Vec<Segment>,
}

impl SegmentChain {
    /// Splits a combined `/METHOD/path` string into classified segments.
    ///
    /// An input of `/` alone yields the single root segment. A trailing
    /// slash yields a final root segment, so `/GET/a/` is `[GET, a, /]`.
    pub fn create(combined: &str) -> Self {
        Self::split(combined, Segment::parse)
    }

    /// Splits a combined string keeping every token literal.
    ///
    /// Used for request paths, where `{x}` or `*` is plain text.
    pub fn create_literal(combined: &str) -> Self {
        Self::split(combined, Segment::literal)
    }

    /// Builds the pattern chain for a method and route pattern.
    pub fn pattern(method: &str, pattern: &str) -> Self {
        Self::create(&combine(method, pattern))
    }

    /// Builds the request chain for a method and request path.
    pub fn request(method: &str, path: &str) -> Self {
        Self::create_literal(&combine(method, path))
    }

    fn split(combined: &str, make: impl Fn(&str) -> Segment) -> Self {
        if combined == SEPARATOR {
            return Self {
                segments: vec![Segment::ROOT],
            };
        }

        let mut segments = Vec::new();
        let mut rest = combined.strip_prefix('/').unwrap_or(combined);
        loop {
            let Some(idx) = rest.find('/') else {
                segments.push(make(rest));
                break;
            };
            segments.push(make(&rest[..idx]));
            let tail = &rest[idx..];
            if tail == SEPARATOR {
                segments.push(Segment::ROOT);
                break;
            }
            rest = &tail[1..];
        }

        Self { segments }
    }

    /// Number of segments, including the method segment.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false for chains built by this module; provided for symmetry
    /// with `len`.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// A cursor positioned on the first segment.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor {
            chain: self,
            pos: 0,
        }
    }
}

impl fmt::Display for SegmentChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            if segment.is_root() {
                f.write_str(SEPARATOR)?;
            } else {
                write!(f, "/{segment}")?;
            }
        }
        Ok(())
    }
}

/// A position in a [`SegmentChain`], passed around by value.
///
/// Multi-wildcard resynchronization tries successive cursors instead of
/// rewiring the chain.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'c> {
    chain: &'c SegmentChain,
    pos: usize,
}

impl<'c> Cursor<'c> {
    /// The segment under the cursor.
    pub fn segment(&self) -> &'c Segment {
        &self.chain.segments[self.pos]
    }

    /// Zero-based position in the chain.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// True when the cursor is on the last segment.
    pub fn is_leaf(&self) -> bool {
        self.pos + 1 >= self.chain.segments.len()
    }

    /// True if there is a segment after this one.
    pub fn has_next(&self) -> bool {
        !self.is_leaf()
    }

    /// The cursor on the following segment, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        self.has_next().then_some(Self {
            chain: self.chain,
            pos: self.pos + 1,
        })
    }

    /// This cursor and every later one, in order.
    pub fn remaining(self) -> impl Iterator<Item = Self> {
        std::iter::successors(Some(self), |c| c.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(chain: &SegmentChain) -> Vec<&str> {
        chain.segments().iter().map(Segment::as_str).collect()
    }

    #[test]
    fn test_classify_tokens() {
        assert_eq!(Segment::parse("users").style(), SegmentStyle::Literal);
        assert_eq!(Segment::parse("{id}"), Segment::VARIABLE);
        assert_eq!(Segment::parse("*"), Segment::WILDCARD);
        assert_eq!(Segment::parse("**"), Segment::DOUBLE_WILDCARD);
        assert_eq!(Segment::parse("{*rest}"), Segment::DOUBLE_WILDCARD);
    }

    #[test]
    fn test_canonical_keys_match_segments() {
        for segment in [Segment::VARIABLE, Segment::WILDCARD, Segment::DOUBLE_WILDCARD] {
            assert_eq!(segment.style().canonical_key(), Some(segment.as_str()));
        }
        assert_eq!(SegmentStyle::Literal.canonical_key(), None);
    }

    #[test]
    fn test_unbalanced_brace_is_literal() {
        let segment = Segment::parse("{unbalanced");
        assert_eq!(segment.style(), SegmentStyle::Literal);
        assert_eq!(segment.as_str(), "{unbalanced");
    }

    #[test]
    fn test_pattern_chain() {
        let chain = SegmentChain::pattern("get", "/users/{id}/files/**");
        assert_eq!(keys(&chain), vec!["GET", "users", "{}", "files", "**"]);
    }

    #[test]
    fn test_root_and_trailing_slash() {
        assert_eq!(keys(&SegmentChain::create("/")), vec!["/"]);
        assert_eq!(keys(&SegmentChain::pattern("GET", "/")), vec!["GET", "/"]);
        assert_eq!(keys(&SegmentChain::pattern("GET", "")), vec!["GET", "/"]);
        assert_eq!(
            keys(&SegmentChain::pattern("GET", "/greet/")),
            vec!["GET", "greet", "/"]
        );
    }

    #[test]
    fn test_empty_interior_segment() {
        let chain = SegmentChain::request("GET", "/a//b");
        assert_eq!(keys(&chain), vec!["GET", "a", "", "b"]);
    }

    #[test]
    fn test_request_chain_is_literal() {
        let chain = SegmentChain::request("post", "/a/{x}/*");
        assert!(chain
            .segments()
            .iter()
            .all(|s| s.style() == SegmentStyle::Literal));
        assert_eq!(keys(&chain), vec!["POST", "a", "{x}", "*"]);
    }

    #[test]
    fn test_cursor_navigation() {
        let chain = SegmentChain::request("GET", "/a/b");
        let first = chain.cursor();
        assert_eq!(first.segment().as_str(), "GET");
        assert!(first.has_next());

        let last = first.next().and_then(Cursor::next).unwrap();
        assert_eq!(last.segment().as_str(), "b");
        assert!(last.is_leaf());
        assert!(last.next().is_none());
        assert_eq!(first.remaining().count(), 3);
    }

    #[test]
    fn test_plain_variable_filter() {
        assert!(is_plain_variable("{id}"));
        assert!(is_plain_variable("{*path}"));
        assert!(is_plain_variable("users"));
        assert!(!is_plain_variable("{id:\\d+}"));
        assert!(!is_plain_variable("{a}{b}"));
        assert!(!is_plain_variable("{}"));
    }

    #[test]
    fn test_tree_compatibility() {
        assert!(is_tree_compatible("/users/{id}/files/**"));
        assert!(is_tree_compatible("/files/{*path}"));
        assert!(is_tree_compatible("/a/*/b"));
        assert!(is_tree_compatible("/a/{open"));
        assert!(!is_tree_compatible("/a/b?"));
        assert!(!is_tree_compatible("/items/{id:\\d+}"));
        assert!(!is_tree_compatible("/files/{name}.{ext}"));
        assert!(!is_tree_compatible("/files/*.txt"));
    }

    #[test]
    fn test_display_round_trips_shape() {
        let chain = SegmentChain::pattern("GET", "/a/{x}/");
        assert_eq!(chain.to_string(), "/GET/a/{}/");
    }
}
