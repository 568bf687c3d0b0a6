//! Registry configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::request::Method;

/// Settings for a [`RouteRegistry`](crate::RouteRegistry).
///
/// Deserializes from JSON; every field is optional:
///
/// ```json
/// { "known_methods": ["GET", "POST"], "trailing_slash_match": true }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Methods a registration without an explicit method expands to.
    pub known_methods: Vec<Method>,
    /// Whether a pattern also matches the request path with a trailing
    /// slash. Only the fallback matcher honors this.
    pub trailing_slash_match: bool,
    /// When false, every lookup goes straight to the fallback matcher.
    pub use_pattern_tree: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            known_methods: Method::ALL.to_vec(),
            trailing_slash_match: false,
            use_pattern_tree: true,
        }
    }
}

impl RouterConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Restricts unspecified-method registrations to `methods`.
    #[must_use]
    pub fn with_known_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.known_methods = methods.into_iter().collect();
        self
    }

    /// Sets trailing slash matching.
    #[must_use]
    pub const fn with_trailing_slash_match(mut self, enabled: bool) -> Self {
        self.trailing_slash_match = enabled;
        self
    }

    /// Enables or disables the pattern tree.
    #[must_use]
    pub const fn with_pattern_tree(mut self, enabled: bool) -> Self {
        self.use_pattern_tree = enabled;
        self
    }
}
