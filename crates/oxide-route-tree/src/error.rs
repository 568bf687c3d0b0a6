//! Error types for routing.

use thiserror::Error;

/// Router-specific errors.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Two equally specific routes matched the request.
    #[error("ambiguous handlers mapped for '{path}': {{{first}, {second}}}")]
    AmbiguousMatch {
        /// The request path.
        path: String,
        /// The best-ranked handler.
        first: String,
        /// The handler tied with it.
        second: String,
    },

    /// Invalid path pattern.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(String),

    /// A registration without a method while no methods are known.
    #[error("no methods to register '{0}' for")]
    NoMethods(String),

    /// Method text that is not a known HTTP method.
    #[error("unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// Configuration could not be parsed.
    #[error("invalid router configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_names_both_handlers() {
        let err = RouterError::AmbiguousMatch {
            path: "/x/5".to_string(),
            first: "by_id".to_string(),
            second: "by_other".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "ambiguous handlers mapped for '/x/5': {by_id, by_other}"
        );
    }
}
