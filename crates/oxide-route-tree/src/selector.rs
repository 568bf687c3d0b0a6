//! Best-match selection among condition-satisfying routes.

use std::cmp::Ordering;

use tracing::{trace, warn};

use crate::condition::RouteConditions;
use crate::request::{PathParams, RequestContext};
use crate::route::{MatchResult, MatchSource, RouteEntry, RouteMatch};

/// A route whose pattern and conditions matched the request, with the
/// refined conditions used for ranking.
#[derive(Debug)]
pub(crate) struct Candidate<'r, H, C> {
    pub entry: &'r RouteEntry<H, C>,
    pub conditions: C,
    pub params: PathParams,
}

/// Evaluates routes against one request and picks the winner.
pub(crate) struct MatchSelector<'q, C: RouteConditions> {
    request: &'q C::Request,
    path: &'q str,
}

impl<'q, C: RouteConditions> MatchSelector<'q, C> {
    pub const fn new(request: &'q C::Request, path: &'q str) -> Self {
        Self { request, path }
    }

    pub const fn request(&self) -> &'q C::Request {
        self.request
    }

    /// Keeps the routes whose pattern and conditions match the request.
    ///
    /// `path` must already carry its leading slash.
    pub fn evaluate<'r, H>(
        &self,
        routes: impl IntoIterator<Item = &'r RouteEntry<H, C>>,
    ) -> Vec<Candidate<'r, H, C>>
    where
        H: 'r,
        C: 'r,
    {
        routes
            .into_iter()
            .filter_map(|entry| {
                let params = entry.pattern.match_path(self.path)?;
                let conditions = entry.conditions.matching(self.request)?;
                Some(Candidate {
                    entry,
                    conditions,
                    params,
                })
            })
            .collect()
    }

    /// Resolves candidates into a single result.
    ///
    /// Candidates are sorted with `compare`; the first wins unless it ties
    /// with the second. A tie is ambiguous, except on a CORS preflight where
    /// a tied route carries CORS configuration.
    pub fn select<H: Clone>(
        &self,
        mut candidates: Vec<Candidate<'_, H, C>>,
        source: MatchSource,
        compare: impl Fn(&Candidate<'_, H, C>, &Candidate<'_, H, C>) -> Ordering,
    ) -> MatchResult<H> {
        if candidates.len() > 1 {
            candidates.sort_by(|a, b| compare(a, b));
            trace!(path = self.path, count = candidates.len(), "ranking candidate routes");

            if compare(&candidates[0], &candidates[1]) == Ordering::Equal {
                let mut tied = candidates
                    .iter()
                    .take_while(|&c| compare(&candidates[0], c) == Ordering::Equal);
                if self.request.is_preflight() && tied.any(|c| c.conditions.has_cors_config()) {
                    return MatchResult::AmbiguousPreflight;
                }

                let first = candidates[0].entry;
                let second = candidates[1].entry;
                warn!(
                    path = self.path,
                    first = %first.pattern.pattern(),
                    second = %second.pattern.pattern(),
                    "ambiguous handlers"
                );
                return MatchResult::Ambiguous(first.handler.clone(), second.handler.clone());
            }
        }

        let Some(best) = candidates.into_iter().next() else {
            return MatchResult::NoMatch;
        };
        let entry = best.entry;
        MatchResult::Handler(RouteMatch {
            handler: entry.handler.clone(),
            id: entry.id,
            pattern: entry.pattern.pattern().to_string(),
            params: best.params,
            source,
        })
    }
}
