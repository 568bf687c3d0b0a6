//! The route registry.
//!
//! [`RouteRegistry`] is the entry point: it registers routes with both the
//! pattern tree and the fallback matcher, and resolves requests through the
//! tree first, delegating to the fallback whenever the tree has no answer.

use std::collections::BTreeMap;

use tracing::{debug, info, trace};

use crate::condition::{RequestConditions, RouteConditions};
use crate::config::RouterConfig;
use crate::error::{Result, RouterError};
use crate::fallback::{FallbackMatcher, LinearMatcher};
use crate::matcher::{self, LookupContext};
use crate::path::{normalize, request_path, PathPattern};
use crate::request::{Method, Request};
use crate::route::{MatchResult, RouteEntry, RouteId};
use crate::segment::{is_tree_compatible, SegmentChain};
use crate::selector::MatchSelector;
use crate::tree::PatternTree;

/// A route to register.
#[derive(Debug, Clone)]
pub struct RouteDefinition<H, C = RequestConditions> {
    /// Path pattern.
    pub pattern: String,
    /// HTTP method; `None` registers for every known method.
    pub method: Option<Method>,
    /// Request conditions.
    pub conditions: C,
    /// Request handler.
    pub handler: H,
}

impl<H, C: Default> RouteDefinition<H, C> {
    /// Creates a definition for every known method with no conditions.
    pub fn new(pattern: impl Into<String>, handler: H) -> Self {
        Self {
            pattern: pattern.into(),
            method: None,
            conditions: C::default(),
            handler,
        }
    }
}

impl<H, C> RouteDefinition<H, C> {
    /// Restricts the definition to one method.
    #[must_use]
    pub const fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the request conditions.
    #[must_use]
    pub fn conditions(mut self, conditions: C) -> Self {
        self.conditions = conditions;
        self
    }
}

/// What the registry remembers about one registration.
#[derive(Debug, Clone)]
pub struct Registration<H> {
    /// Normalized pattern.
    pub pattern: String,
    /// Methods still registered.
    pub methods: Vec<Method>,
    /// Request handler.
    pub handler: H,
    /// Whether the pattern tree indexes this registration.
    pub in_tree: bool,
}

/// Routes requests through a pattern tree backed by a fallback matcher.
///
/// Registration and removal take `&mut self` and must be followed by
/// [`finalize`](Self::finalize) before lookups; lookups take `&self` and
/// can run concurrently once the registry is shared.
///
/// # Example
///
/// ```
/// use oxide_route_tree::{Method, Request, RequestConditions, RouteRegistry};
///
/// let mut registry: RouteRegistry<&str> = RouteRegistry::new();
/// registry
///     .register("/box/server/{userId}/download", Some(Method::Get), RequestConditions::new(), "by_user")
///     .unwrap();
/// registry
///     .register("/box/server/download", Some(Method::Get), RequestConditions::new(), "plain")
///     .unwrap();
/// registry.finalize();
///
/// let m = registry.resolve(&Request::get("/box/server/1/download")).into_match().unwrap();
/// assert_eq!(m.handler, "by_user");
/// assert_eq!(m.params.get("userId"), Some("1"));
/// ```
#[derive(Debug)]
pub struct RouteRegistry<H, C = RequestConditions, F = LinearMatcher<H, C>> {
    config: RouterConfig,
    tree: PatternTree<H, C>,
    fallback: F,
    registrations: BTreeMap<RouteId, Registration<H>>,
    next_id: u64,
}

impl<H, C> Default for RouteRegistry<H, C, LinearMatcher<H, C>>
where
    H: Clone,
    C: RouteConditions + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, C> RouteRegistry<H, C, LinearMatcher<H, C>>
where
    H: Clone,
    C: RouteConditions + Clone,
{
    /// Creates a registry with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    /// Creates a registry with the given configuration.
    pub fn with_config(config: RouterConfig) -> Self {
        Self::with_fallback(config, LinearMatcher::new())
    }
}

impl<H, C, F> RouteRegistry<H, C, F>
where
    H: Clone,
    C: RouteConditions + Clone,
    F: FallbackMatcher<H, C>,
{
    /// Creates a registry around a custom fallback matcher.
    pub fn with_fallback(config: RouterConfig, fallback: F) -> Self {
        Self {
            config,
            tree: PatternTree::new(),
            fallback,
            registrations: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Registers a route and returns its id.
    ///
    /// A blank pattern is the root. Without a method the route is registered
    /// for every known method. Patterns the tree cannot index go to the
    /// fallback matcher only.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::InvalidPattern`] if the pattern does not
    /// compile, and [`RouterError::NoMethods`] if no method is given and
    /// the configuration knows none.
    pub fn register(
        &mut self,
        pattern: &str,
        method: Option<Method>,
        conditions: C,
        handler: H,
    ) -> Result<RouteId> {
        let pattern = normalize(pattern);
        let compiled = if self.config.trailing_slash_match {
            PathPattern::with_trailing_slash(&pattern)?
        } else {
            PathPattern::new(&pattern)?
        };

        let methods = method.map_or_else(|| self.config.known_methods.clone(), |m| vec![m]);
        if methods.is_empty() {
            return Err(RouterError::NoMethods(pattern));
        }

        let id = RouteId(self.next_id);
        self.next_id += 1;

        let in_tree = is_tree_compatible(&pattern);

        for &method in &methods {
            let entry = RouteEntry {
                id,
                method,
                pattern: compiled.clone(),
                conditions: conditions.clone(),
                handler: handler.clone(),
            };
            if in_tree {
                self.tree
                    .insert(&SegmentChain::pattern(method.as_str(), &pattern), entry.clone());
            }
            self.fallback.register(entry);
        }

        if in_tree {
            debug!(%id, pattern = %pattern, methods = methods.len(), "registered route");
        } else {
            debug!(%id, pattern = %pattern, methods = methods.len(), "registered route with fallback only");
        }

        self.registrations.insert(
            id,
            Registration {
                pattern,
                methods,
                handler,
                in_tree,
            },
        );
        Ok(id)
    }

    /// Registers many routes and finalizes the tree once.
    ///
    /// # Errors
    ///
    /// Stops at the first pattern that does not compile. Routes registered
    /// before it stay registered and the tree is not finalized.
    pub fn register_batch(
        &mut self,
        definitions: impl IntoIterator<Item = RouteDefinition<H, C>>,
    ) -> Result<Vec<RouteId>> {
        let ids = definitions
            .into_iter()
            .map(|def| self.register(&def.pattern, def.method, def.conditions, def.handler))
            .collect::<Result<Vec<_>>>()?;
        self.finalize();
        Ok(ids)
    }

    /// Removes every registration of `pattern` for `method`, or for all of
    /// its methods when `method` is `None`.
    ///
    /// Returns the number of method expansions removed. Removing a route that
    /// is not registered is a no-op.
    pub fn unregister(&mut self, pattern: &str, method: Option<Method>) -> usize {
        let pattern = normalize(pattern);
        let ids: Vec<RouteId> = self
            .registrations
            .iter()
            .filter(|(_, reg)| reg.pattern == pattern)
            .map(|(id, _)| *id)
            .collect();

        let removed: usize = ids
            .into_iter()
            .map(|id| self.remove(id, method))
            .sum();
        debug!(pattern = %pattern, removed, "unregistered pattern");
        removed
    }

    /// Removes one registration by id.
    ///
    /// Returns false if no such registration exists.
    pub fn unregister_route(&mut self, id: RouteId) -> bool {
        let removed = self.remove(id, None);
        debug!(%id, removed, "unregistered route");
        removed > 0
    }

    fn remove(&mut self, id: RouteId, method: Option<Method>) -> usize {
        let Some(reg) = self.registrations.get_mut(&id) else {
            return 0;
        };

        let methods: Vec<Method> = match method {
            Some(m) if reg.methods.contains(&m) => vec![m],
            Some(_) => return 0,
            None => reg.methods.clone(),
        };
        reg.methods.retain(|m| !methods.contains(m));

        let pattern = reg.pattern.clone();
        let in_tree = reg.in_tree;
        if reg.methods.is_empty() {
            self.registrations.remove(&id);
        }

        let mut removed = 0;
        for method in methods {
            if in_tree {
                self.tree
                    .remove(&SegmentChain::pattern(method.as_str(), &pattern), |entry| {
                        entry.id == id
                    });
            }
            removed += self.fallback.unregister(id, method);
        }
        removed
    }

    /// Recomputes the tree's uncertainty flags.
    ///
    /// Call after every batch of registrations and before the first lookup.
    pub fn finalize(&mut self) {
        self.tree.finalize_uncertainty();
        info!(
            nodes = self.tree.node_count(),
            routes = self.tree.route_count(),
            registrations = self.registrations.len(),
            "pattern tree finalized"
        );
    }

    /// Resolves a request path for `method`.
    ///
    /// A path without a leading slash is treated as if it had one.
    ///
    /// The tree is consulted first. If it finds no route whose conditions
    /// hold, the fallback matcher answers. A tree match is final: a route
    /// only the fallback indexes (say `/a/b?`) is not considered when a
    /// tree route (`/a/{x}`) already matches, even where the fallback alone
    /// would rank it higher.
    pub fn lookup(&self, method: Method, path: &str, request: &C::Request) -> MatchResult<H> {
        let path = request_path(path);
        let path: &str = &path;
        if self.config.use_pattern_tree {
            if !self.tree.is_finalized() {
                debug!("pattern tree looked up before finalize");
            }
            let chain = SegmentChain::request(method.as_str(), path);
            let ctx = LookupContext::new(MatchSelector::new(request, path));
            if let Some(result) = matcher::lookup(&self.tree, chain.cursor(), ctx) {
                trace!(%method, path, "resolved by pattern tree");
                return result;
            }
            debug!(%method, path, "pattern tree miss, delegating to fallback");
        }
        self.fallback.lookup(method, path, request)
    }

    /// The configuration.
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The pattern tree.
    pub const fn tree(&self) -> &PatternTree<H, C> {
        &self.tree
    }

    /// The fallback matcher.
    pub const fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Registrations in id order.
    pub fn routes(&self) -> impl Iterator<Item = (RouteId, &Registration<H>)> {
        self.registrations.iter().map(|(id, reg)| (*id, reg))
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl<H, C, F> RouteRegistry<H, C, F>
where
    H: Clone,
    C: RouteConditions<Request = Request> + Clone,
    F: FallbackMatcher<H, C>,
{
    /// Resolves a [`Request`] by its own method and path.
    pub fn resolve(&self, request: &Request) -> MatchResult<H> {
        self.lookup(request.method, &request.path, request)
    }
}
