//! Registered routes and lookup results.

use std::fmt;

use crate::error::{Result, RouterError};
use crate::path::PathPattern;
use crate::request::{Method, PathParams};

/// Identifies one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub(crate) u64);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single registered route for one HTTP method.
#[derive(Debug, Clone)]
pub struct RouteEntry<H, C> {
    /// Registration id, shared by all method expansions of a registration.
    pub id: RouteId,
    /// HTTP method.
    pub method: Method,
    /// Path pattern.
    pub pattern: PathPattern,
    /// Request conditions.
    pub conditions: C,
    /// Request handler.
    pub handler: H,
}

/// Which matcher produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    /// The pattern tree.
    Tree,
    /// The linear fallback matcher.
    Fallback,
}

/// A resolved route.
#[derive(Debug, Clone)]
pub struct RouteMatch<H> {
    /// The handler of the winning route.
    pub handler: H,
    /// The winning route's registration id.
    pub id: RouteId,
    /// The winning route's pattern.
    pub pattern: String,
    /// URI template variables extracted from the path.
    pub params: PathParams,
    /// Which matcher answered.
    pub source: MatchSource,
}

/// The outcome of a lookup.
#[derive(Debug, Clone)]
pub enum MatchResult<H> {
    /// Exactly one best route.
    Handler(RouteMatch<H>),
    /// Nothing matched.
    NoMatch,
    /// Two routes matched and neither ranks above the other.
    Ambiguous(H, H),
    /// A CORS preflight hit tied routes, at least one with CORS config.
    AmbiguousPreflight,
}

impl<H> MatchResult<H> {
    /// Returns the match, if there is exactly one.
    pub fn into_match(self) -> Option<RouteMatch<H>> {
        match self {
            Self::Handler(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the winning handler, if there is exactly one.
    pub const fn handler(&self) -> Option<&H> {
        match self {
            Self::Handler(m) => Some(&m.handler),
            _ => None,
        }
    }

    /// Returns true for [`MatchResult::NoMatch`].
    pub const fn is_no_match(&self) -> bool {
        matches!(self, Self::NoMatch)
    }
}

impl<H: fmt::Debug> MatchResult<H> {
    /// Turns an ambiguous result into an error.
    ///
    /// `NoMatch` and `AmbiguousPreflight` are not errors and both map to
    /// `Ok(None)`; use the enum directly to tell them apart.
    pub fn into_result(self, path: &str) -> Result<Option<RouteMatch<H>>> {
        match self {
            Self::Handler(m) => Ok(Some(m)),
            Self::NoMatch | Self::AmbiguousPreflight => Ok(None),
            Self::Ambiguous(first, second) => Err(RouterError::AmbiguousMatch {
                path: path.to_string(),
                first: format!("{first:?}"),
                second: format!("{second:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_match(handler: &'static str) -> RouteMatch<&'static str> {
        RouteMatch {
            handler,
            id: RouteId(1),
            pattern: "/x".to_string(),
            params: PathParams::new(),
            source: MatchSource::Tree,
        }
    }

    #[test]
    fn test_handler_accessor() {
        let result = MatchResult::Handler(route_match("x"));
        assert_eq!(result.handler(), Some(&"x"));
        assert!(MatchResult::<&str>::NoMatch.is_no_match());
    }

    #[test]
    fn test_into_result() {
        assert!(MatchResult::Handler(route_match("x"))
            .into_result("/x")
            .unwrap()
            .is_some());
        assert!(MatchResult::<&str>::NoMatch.into_result("/x").unwrap().is_none());
        assert!(MatchResult::<&str>::AmbiguousPreflight
            .into_result("/x")
            .unwrap()
            .is_none());

        let err = MatchResult::Ambiguous("a", "b").into_result("/x/5").unwrap_err();
        match err {
            RouterError::AmbiguousMatch { path, first, second } => {
                assert_eq!(path, "/x/5");
                assert_eq!(first, "\"a\"");
                assert_eq!(second, "\"b\"");
            }
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
    }

    #[test]
    fn test_route_id_display() {
        assert_eq!(RouteId(7).to_string(), "#7");
    }
}
