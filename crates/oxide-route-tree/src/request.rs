//! Request context and HTTP methods.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// GET method
    Get,
    /// HEAD method
    Head,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
    /// OPTIONS method
    Options,
    /// TRACE method
    Trace,
}

impl Method {
    /// Every method, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Trace,
    ];

    /// Returns the method as a string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
        }
    }
}

impl FromStr for Method {
    type Err = RouterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RouterError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the route selector needs to know about the request beyond its
/// method and path.
pub trait RequestContext {
    /// Returns true for a CORS preflight probe.
    fn is_preflight(&self) -> bool;
}

/// Path parameters extracted from the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if no parameter was extracted.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An HTTP request as seen by the route matcher.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request path, without the query string.
    pub path: String,
    /// Query string parameters.
    pub query: HashMap<String, String>,
    /// Request headers.
    pub headers: HashMap<String, String>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: HashMap::new(),
            headers: HashMap::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Creates a POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Creates a request from a request target such as `/users?page=2`.
    pub fn parse_target(method: Method, target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => {
                let mut request = Self::new(method, path);
                request.query = Self::parse_query_string(query);
                request
            }
            None => Self::new(method, target),
        }
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Gets a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Gets a query parameter.
    pub fn get_query(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }

    /// The `Content-Type` header, without parameters such as `charset`.
    pub fn content_type(&self) -> Option<&str> {
        self.get_header("content-type")
            .map(|v| v.split(';').next().unwrap_or(v).trim())
    }

    /// The media types listed in the `Accept` header.
    pub fn accept(&self) -> Vec<&str> {
        self.get_header("accept")
            .map(|v| {
                v.split(',')
                    .filter_map(|t| t.split(';').next())
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parses query parameters from a query string.
    pub fn parse_query_string(query: &str) -> HashMap<String, String> {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter_map(|pair| {
                let mut parts = pair.splitn(2, '=');
                let key = parts.next()?;
                let value = parts.next().unwrap_or("");
                Some((urlencoding_decode(key), urlencoding_decode(value)))
            })
            .collect()
    }
}

impl RequestContext for Request {
    fn is_preflight(&self) -> bool {
        self.method == Method::Options
            && self.get_header("origin").is_some()
            && self.get_header("access-control-request-method").is_some()
    }
}

/// Simple URL decoding.
fn urlencoding_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut rest = s.as_bytes();

    while let Some((&b, tail)) = rest.split_first() {
        match b {
            b'%' => {
                let decoded = tail
                    .get(..2)
                    .and_then(|hex| std::str::from_utf8(hex).ok())
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                if let Some(byte) = decoded {
                    bytes.push(byte);
                    rest = &tail[2..];
                    continue;
                }
                bytes.push(b'%');
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(b),
        }
        rest = tail;
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
