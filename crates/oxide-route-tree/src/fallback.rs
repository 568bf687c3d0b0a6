//! The fallback matcher.
//!
//! Every registration is also given to the fallback, which answers any
//! lookup the pattern tree cannot resolve. Its results are the reference the
//! tree must never fall short of.

use crate::condition::RouteConditions;
use crate::path::request_path;
use crate::request::Method;
use crate::route::{MatchResult, MatchSource, RouteEntry, RouteId};
use crate::selector::MatchSelector;

/// A complete matcher over every registered route.
pub trait FallbackMatcher<H, C: RouteConditions> {
    /// Adds a route.
    fn register(&mut self, entry: RouteEntry<H, C>);

    /// Removes the `method` expansion of registration `id`, returning the
    /// number of entries removed.
    fn unregister(&mut self, id: RouteId, method: Method) -> usize;

    /// Resolves a request.
    fn lookup(&self, method: Method, path: &str, request: &C::Request) -> MatchResult<H>;
}

/// Scans every route, ranking matches by pattern specificity and then by
/// conditions.
#[derive(Debug)]
pub struct LinearMatcher<H, C> {
    entries: Vec<RouteEntry<H, C>>,
}

impl<H, C> Default for LinearMatcher<H, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H, C> LinearMatcher<H, C> {
    /// Creates an empty matcher.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registered entries, in registration order.
    pub fn entries(&self) -> &[RouteEntry<H, C>] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Clone, C: RouteConditions> FallbackMatcher<H, C> for LinearMatcher<H, C> {
    fn register(&mut self, entry: RouteEntry<H, C>) {
        self.entries.push(entry);
    }

    fn unregister(&mut self, id: RouteId, method: Method) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.id != id || entry.method != method);
        before - self.entries.len()
    }

    fn lookup(&self, method: Method, path: &str, request: &C::Request) -> MatchResult<H> {
        let path = request_path(path);
        let path: &str = &path;
        let selector = MatchSelector::new(request, path);
        let entries = self.entries.iter().filter(|entry| entry.method == method);
        let candidates = selector.evaluate(entries);
        selector.select(candidates, MatchSource::Fallback, |a, b| {
            a.entry
                .pattern
                .compare_specificity(&b.entry.pattern, path)
                .then_with(|| a.conditions.compare_to(&b.conditions, request))
        })
    }
}
