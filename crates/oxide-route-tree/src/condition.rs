//! Request conditions attached to a route.
//!
//! The tree decides which routes are structurally eligible for a path. A
//! route's conditions then decide whether it applies to the request at all
//! (content type, accepted media types, query parameters, headers), and how
//! it ranks against other eligible routes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::request::{Request, RequestContext};

/// The condition set of a route.
///
/// Implementations play three roles for the selector: evaluating a route
/// against a request, ranking two matching routes, and reporting CORS
/// configuration.
pub trait RouteConditions: Sized {
    /// The request type conditions are evaluated against.
    type Request: RequestContext + ?Sized;

    /// Returns the subset of these conditions that matched, or `None` if the
    /// request does not satisfy them.
    fn matching(&self, request: &Self::Request) -> Option<Self>;

    /// Compares two matched condition sets; `Less` means `self` is more
    /// specific and ranks first.
    fn compare_to(&self, other: &Self, request: &Self::Request) -> Ordering;

    /// Returns true if the route carries CORS configuration.
    fn has_cors_config(&self) -> bool {
        false
    }
}

/// A parsed `name`, `name=value`, `!name` or `name!=value` expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NameValueExpression {
    name: String,
    value: Option<String>,
    negated: bool,
}

impl NameValueExpression {
    /// Parses an expression.
    pub fn parse(expression: &str) -> Self {
        if let Some((name, value)) = expression.split_once("!=") {
            return Self {
                name: name.trim().to_string(),
                value: Some(value.trim().to_string()),
                negated: true,
            };
        }
        if let Some((name, value)) = expression.split_once('=') {
            return Self {
                name: name.trim().to_string(),
                value: Some(value.trim().to_string()),
                negated: false,
            };
        }
        match expression.trim().strip_prefix('!') {
            Some(name) => Self {
                name: name.trim().to_string(),
                value: None,
                negated: true,
            },
            None => Self {
                name: expression.trim().to_string(),
                value: None,
                negated: false,
            },
        }
    }

    /// The parameter or header name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_satisfied_by(&self, actual: Option<&str>) -> bool {
        let matched = match (&self.value, actual) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(expected), Some(actual)) => expected == actual,
        };
        matched != self.negated
    }
}

impl TryFrom<String> for NameValueExpression {
    type Error = std::convert::Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(Self::parse(&value))
    }
}

impl From<NameValueExpression> for String {
    fn from(expr: NameValueExpression) -> Self {
        let op = if expr.negated { "!" } else { "" };
        match expr.value {
            Some(value) => format!("{}{op}={value}", expr.name),
            None => format!("{op}{}", expr.name),
        }
    }
}

/// Conditions on the request beyond its method and path.
///
/// # Example
///
/// ```
/// use oxide_route_tree::{Request, RequestConditions, RouteConditions};
///
/// let conditions = RequestConditions::new()
///     .consumes("application/json")
///     .param("date");
///
/// let request = Request::post("/orders")
///     .header("Content-Type", "application/json")
///     .query_param("date", "2025");
/// assert!(conditions.matching(&request).is_some());
/// assert!(conditions.matching(&Request::post("/orders")).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConditions {
    /// Media types the request body may have.
    pub consumes: Vec<String>,
    /// Media types the route can produce.
    pub produces: Vec<String>,
    /// Query parameter expressions.
    pub params: Vec<NameValueExpression>,
    /// Header expressions.
    pub headers: Vec<NameValueExpression>,
    /// The route carries CORS configuration.
    pub cross_origin: bool,
}

impl RequestConditions {
    /// Creates an empty condition set, which matches every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a consumable media type.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes.push(media_type.into());
        self
    }

    /// Adds a producible media type.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    /// Adds a query parameter expression.
    #[must_use]
    pub fn param(mut self, expression: &str) -> Self {
        self.params.push(NameValueExpression::parse(expression));
        self
    }

    /// Adds a header expression.
    #[must_use]
    pub fn header(mut self, expression: &str) -> Self {
        self.headers.push(NameValueExpression::parse(expression));
        self
    }

    /// Marks the route as carrying CORS configuration.
    #[must_use]
    pub const fn cross_origin(mut self) -> Self {
        self.cross_origin = true;
        self
    }

    /// Number of expressions in the set; used to rank matched sets.
    fn weight(&self) -> (usize, usize, usize, usize) {
        (
            self.params.len(),
            self.headers.len(),
            self.consumes.len(),
            self.produces.len(),
        )
    }
}

impl RouteConditions for RequestConditions {
    type Request = Request;

    fn matching(&self, request: &Request) -> Option<Self> {
        // A preflight carries none of the actual request's headers or body.
        if request.is_preflight() {
            return Some(self.clone());
        }

        if !self
            .params
            .iter()
            .all(|p| p.is_satisfied_by(request.get_query(p.name())))
        {
            return None;
        }
        if !self
            .headers
            .iter()
            .all(|h| h.is_satisfied_by(request.get_header(h.name())))
        {
            return None;
        }

        let consumes = if self.consumes.is_empty() {
            Vec::new()
        } else {
            let content_type = request.content_type()?;
            let matched: Vec<String> = self
                .consumes
                .iter()
                .filter(|t| media_type_includes(t, content_type))
                .cloned()
                .collect();
            if matched.is_empty() {
                return None;
            }
            matched
        };

        let produces = if self.produces.is_empty() {
            Vec::new()
        } else {
            let accept = request.accept();
            if accept.is_empty() {
                self.produces.clone()
            } else {
                let matched: Vec<String> = self
                    .produces
                    .iter()
                    .filter(|t| accept.iter().any(|a| media_type_compatible(t, a)))
                    .cloned()
                    .collect();
                if matched.is_empty() {
                    return None;
                }
                matched
            }
        };

        Some(Self {
            consumes,
            produces,
            params: self.params.clone(),
            headers: self.headers.clone(),
            cross_origin: self.cross_origin,
        })
    }

    fn compare_to(&self, other: &Self, _request: &Request) -> Ordering {
        // More expressions means more specific, which ranks first.
        other.weight().cmp(&self.weight())
    }

    fn has_cors_config(&self) -> bool {
        self.cross_origin
    }
}

fn split_media_type(media_type: &str) -> (&str, &str) {
    let essence = media_type.split(';').next().unwrap_or(media_type).trim();
    essence.split_once('/').unwrap_or((essence, "*"))
}

/// Returns true if `declared` (possibly `type/*` or `*/*`) covers `actual`.
fn media_type_includes(declared: &str, actual: &str) -> bool {
    let (d_type, d_sub) = split_media_type(declared);
    let (a_type, a_sub) = split_media_type(actual);
    (d_type == "*" || d_type.eq_ignore_ascii_case(a_type))
        && (d_sub == "*" || d_sub.eq_ignore_ascii_case(a_sub))
}

/// Returns true if either media type covers the other.
fn media_type_compatible(a: &str, b: &str) -> bool {
    media_type_includes(a, b) || media_type_includes(b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Method;

    #[test]
    fn test_empty_conditions_match_everything() {
        let conditions = RequestConditions::new();
        assert_eq!(
            conditions.matching(&Request::get("/")),
            Some(RequestConditions::new())
        );
    }

    #[test]
    fn test_param_expressions() {
        let present = RequestConditions::new().param("date");
        let valued = RequestConditions::new().param("mode=full");
        let absent = RequestConditions::new().param("!debug");

        let req = Request::get("/").query_param("date", "2025").query_param("mode", "full");
        assert!(present.matching(&req).is_some());
        assert!(valued.matching(&req).is_some());
        assert!(absent.matching(&req).is_some());

        let req = Request::get("/").query_param("debug", "1").query_param("mode", "lite");
        assert!(present.matching(&req).is_none());
        assert!(valued.matching(&req).is_none());
        assert!(absent.matching(&req).is_none());
    }

    #[test]
    fn test_header_expression_is_case_insensitive() {
        let conditions = RequestConditions::new().header("X-Api-Version=2");
        let req = Request::get("/").header("x-api-version", "2");
        assert!(conditions.matching(&req).is_some());
    }

    #[test]
    fn test_consumes_refines_to_matched_types() {
        let conditions = RequestConditions::new()
            .consumes("application/json")
            .consumes("text/*");
        let req = Request::post("/").header("Content-Type", "text/plain; charset=utf-8");
        let matched = conditions.matching(&req).unwrap();
        assert_eq!(matched.consumes, vec!["text/*".to_string()]);

        assert!(conditions.matching(&Request::post("/")).is_none());
    }

    #[test]
    fn test_produces_against_accept() {
        let conditions = RequestConditions::new().produces("application/json");
        assert!(conditions.matching(&Request::get("/")).is_some());
        assert!(conditions
            .matching(&Request::get("/").header("Accept", "application/*"))
            .is_some());
        assert!(conditions
            .matching(&Request::get("/").header("Accept", "text/html"))
            .is_none());
    }

    #[test]
    fn test_preflight_skips_request_conditions() {
        let conditions = RequestConditions::new().consumes("application/json").cross_origin();
        let preflight = Request::new(Method::Options, "/")
            .header("Origin", "https://example.com")
            .header("Access-Control-Request-Method", "POST");
        let matched = conditions.matching(&preflight).unwrap();
        assert!(matched.has_cors_config());
    }

    #[test]
    fn test_more_expressions_rank_first() {
        let req = Request::get("/");
        let plain = RequestConditions::new();
        let with_param = RequestConditions::new().param("date");
        assert_eq!(with_param.compare_to(&plain, &req), Ordering::Less);
        assert_eq!(plain.compare_to(&with_param, &req), Ordering::Greater);
        assert_eq!(plain.compare_to(&RequestConditions::new(), &req), Ordering::Equal);
    }

    #[test]
    fn test_expression_serde_round_trip() {
        let conditions: RequestConditions =
            serde_json::from_str(r#"{"params": ["!debug", "mode=full"], "cross_origin": true}"#)
                .unwrap();
        assert_eq!(conditions.params[0], NameValueExpression::parse("!debug"));
        assert!(conditions.cross_origin);
        let json = serde_json::to_value(&conditions.params).unwrap();
        assert_eq!(json, serde_json::json!(["!debug", "mode=full"]));
    }
}
