#![allow(dead_code)]

use oxide_route_tree::{
    MatchResult, MatchSource, Method, Request, RequestConditions, RouteId, RouteRegistry,
};

pub type Registry = RouteRegistry<&'static str>;

/// Builds a finalized registry of GET routes without conditions.
pub fn registry(routes: &[(&str, &'static str)]) -> Registry {
    let mut registry = Registry::new();
    for &(pattern, handler) in routes {
        add(&mut registry, pattern, RequestConditions::new(), handler);
    }
    registry.finalize();
    registry
}

/// Registers a GET route; the caller finalizes.
pub fn add(
    registry: &mut Registry,
    pattern: &str,
    conditions: RequestConditions,
    handler: &'static str,
) -> RouteId {
    registry
        .register(pattern, Some(Method::Get), conditions, handler)
        .unwrap_or_else(|e| panic!("Failed to register {pattern}: {e}"))
}

/// The handler resolved for a request, panicking on anything else.
pub fn handler_for(registry: &Registry, request: &Request) -> &'static str {
    match registry.resolve(request) {
        MatchResult::Handler(m) => m.handler,
        other => panic!("Expected a handler for {}, got {other:?}", request.path),
    }
}

/// The handler resolved for a plain GET request.
pub fn get(registry: &Registry, path: &str) -> &'static str {
    handler_for(registry, &Request::get(path))
}

/// Which matcher answered a plain GET request.
pub fn source(registry: &Registry, path: &str) -> MatchSource {
    match registry.resolve(&Request::get(path)) {
        MatchResult::Handler(m) => m.source,
        other => panic!("Expected a handler for {path}, got {other:?}"),
    }
}

pub fn is_no_match(registry: &Registry, path: &str) -> bool {
    registry.resolve(&Request::get(path)).is_no_match()
}
