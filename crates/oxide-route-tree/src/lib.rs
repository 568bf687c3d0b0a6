//! # oxide-route-tree
//!
//! Request mapping through a layered pattern tree.
//!
//! This crate provides:
//! - A tree of route patterns keyed segment by segment, with the HTTP method
//!   as the first segment
//! - Per-level precedence: literal beats `{variable}` beats `*` beats `**`
//! - Multi-segment wildcards that resynchronize on the rest of the path
//! - Request conditions (content type, accept, query parameters, headers)
//!   with ambiguity detection and a CORS preflight sentinel
//! - A linear fallback matcher that answers whatever the tree cannot
//!
//! ## Quick Start
//!
//! ```
//! use oxide_route_tree::{Method, Request, RequestConditions, RouteRegistry};
//!
//! let mut registry: RouteRegistry<&str> = RouteRegistry::new();
//! registry.register("/users/{id}", Some(Method::Get), RequestConditions::new(), "user").unwrap();
//! registry.register("/users/me", Some(Method::Get), RequestConditions::new(), "me").unwrap();
//! registry.register("/static/**", None, RequestConditions::new(), "assets").unwrap();
//! registry.finalize();
//!
//! assert_eq!(registry.resolve(&Request::get("/users/me")).handler(), Some(&"me"));
//! assert_eq!(registry.resolve(&Request::get("/users/42")).handler(), Some(&"user"));
//! assert_eq!(registry.resolve(&Request::get("/static/css/site.css")).handler(), Some(&"assets"));
//! ```
//!
//! ## Conditions
//!
//! Routes sharing a path shape are told apart by their conditions. The more
//! specific condition set wins; equally specific sets are ambiguous.
//!
//! ```
//! use oxide_route_tree::{MatchResult, Method, Request, RequestConditions, RouteRegistry};
//!
//! let mut registry: RouteRegistry<&str> = RouteRegistry::new();
//! registry
//!     .register("/orders", Some(Method::Post), RequestConditions::new().consumes("application/json"), "json")
//!     .unwrap();
//! registry
//!     .register("/orders", Some(Method::Post), RequestConditions::new().consumes("text/csv"), "csv")
//!     .unwrap();
//! registry.finalize();
//!
//! let request = Request::post("/orders").header("Content-Type", "text/csv");
//! assert_eq!(registry.resolve(&request).handler(), Some(&"csv"));
//!
//! let result = registry.resolve(&Request::post("/orders"));
//! assert!(matches!(result, MatchResult::NoMatch));
//! ```
//!
//! ## Fallback
//!
//! Patterns the tree does not index (`?`, `{id:\d+}`, `file.{ext}`, `*.txt`)
//! are served by the fallback matcher, which also answers any lookup the tree
//! cannot resolve. [`RouteMatch::source`] tells which one answered.

mod condition;
mod config;
mod error;
mod fallback;
mod matcher;
mod path;
mod registry;
mod request;
mod route;
mod segment;
mod selector;
mod tree;

pub use condition::{NameValueExpression, RequestConditions, RouteConditions};
pub use config::RouterConfig;
pub use error::{Result, RouterError};
pub use fallback::{FallbackMatcher, LinearMatcher};
pub use path::PathPattern;
pub use registry::{Registration, RouteDefinition, RouteRegistry};
pub use request::{Method, PathParams, Request, RequestContext};
pub use route::{MatchResult, MatchSource, RouteEntry, RouteId, RouteMatch};
pub use segment::{combine, Cursor, Segment, SegmentChain, SegmentStyle, SEPARATOR};
pub use tree::{PatternTree, TreeNode};
