//! Route table files.
//!
//! A route table is a JSON document with an optional registry configuration
//! and a list of routes:
//!
//! ```json
//! {
//!   "config": { "known_methods": ["GET", "POST"] },
//!   "routes": [
//!     { "pattern": "/users/{id}", "method": "GET", "handler": "user" },
//!     { "pattern": "/orders", "handler": "orders", "consumes": ["application/json"] }
//!   ]
//! }
//! ```
//!
//! Route entries accept the condition fields `consumes`, `produces`,
//! `params`, `headers` and `cross_origin`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use oxide_route_tree::{Method, RequestConditions, RouteDefinition, RouteRegistry, RouterConfig};

/// Registry built from a route table; handlers are their names.
pub type Registry = RouteRegistry<String>;

/// A parsed route table.
#[derive(Debug, Deserialize)]
pub struct RouteTable {
    #[serde(default)]
    pub config: RouterConfig,
    pub routes: Vec<RouteSpec>,
}

/// One route of a table.
#[derive(Debug, Deserialize)]
pub struct RouteSpec {
    pub pattern: String,
    #[serde(default)]
    pub method: Option<Method>,
    pub handler: String,
    #[serde(flatten)]
    pub conditions: RequestConditions,
}

impl From<RouteSpec> for RouteDefinition<String> {
    fn from(spec: RouteSpec) -> Self {
        Self {
            pattern: spec.pattern,
            method: spec.method,
            conditions: spec.conditions,
            handler: spec.handler,
        }
    }
}

impl RouteTable {
    /// Reads a route table from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read route table {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid route table {}", path.display()))
    }

    /// Parses a route table from JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Registers every route and finalizes the registry.
    pub fn into_registry(self) -> Result<Registry> {
        let mut registry = Registry::with_config(self.config);
        let ids = registry.register_batch(self.routes.into_iter().map(RouteDefinition::from))?;
        debug!(routes = ids.len(), "route table loaded");
        Ok(registry)
    }
}
