//! Path pattern matching.
//!
//! [`PathPattern`] compiles an Ant-style route pattern into a regex. It is
//! what the linear fallback matcher scans, and what extracts URI template
//! variables once any matcher has picked a route.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;

use crate::error::{Result, RouterError};
use crate::request::PathParams;
use crate::segment::SEPARATOR;

/// A piece of one pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Literal text.
    Literal(String),
    /// `{name}` or `{name:regex}`.
    Param { name: String, regex: Option<String> },
    /// `*` inside a segment.
    Star,
    /// `?` inside a segment.
    AnyChar,
}

/// One `/`-delimited part of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    /// A segment made of tokens.
    Tokens(Vec<Token>),
    /// `**`: zero or more segments.
    Any,
    /// `{*name}`: zero or more segments, captured.
    CaptureRest(String),
}

/// A compiled path pattern for matching URLs.
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The pattern string, normalized to start with `/`.
    pattern: String,
    /// Parsed segments.
    segments: Vec<PathSegment>,
    /// Compiled regex for matching.
    regex: Regex,
    /// Parameter names in order.
    param_names: Vec<String>,
}

impl PathPattern {
    /// Parses a path pattern string.
    ///
    /// Pattern syntax:
    /// - `/users` - Literal path
    /// - `/users/{id}` - Path with parameter
    /// - `/users/{id:\d+}` - Parameter constrained by a regex
    /// - `/files/*.txt` - `*` matches within one segment, `?` one character
    /// - `/static/**` - Zero or more segments
    /// - `/files/{*path}` - Zero or more segments, captured
    ///
    /// An empty or blank pattern is the root, `/`.
    ///
    /// # Example
    ///
    /// ```
    /// use oxide_route_tree::PathPattern;
    ///
    /// let pattern = PathPattern::new("/posts/{id}/comments/{comment_id}").unwrap();
    /// let params = pattern.match_path("/posts/123/comments/456").unwrap();
    /// assert_eq!(params.get("id"), Some("123"));
    /// assert_eq!(params.get("comment_id"), Some("456"));
    /// ```
    pub fn new(pattern: &str) -> Result<Self> {
        Self::compile(pattern, false)
    }

    /// Parses a pattern that also matches the request path with a trailing
    /// slash appended.
    pub fn with_trailing_slash(pattern: &str) -> Result<Self> {
        Self::compile(pattern, true)
    }

    fn compile(pattern: &str, trailing_slash: bool) -> Result<Self> {
        let pattern = normalize(pattern);
        let mut segments = Vec::new();
        let mut param_names = Vec::new();
        let mut regex_str = String::from("^");

        let body = pattern.strip_prefix('/').unwrap_or(&pattern);
        for part in body.split('/') {
            let segment = parse_segment(part);
            match &segment {
                PathSegment::Any => regex_str.push_str("(?:/.*)?"),
                PathSegment::CaptureRest(name) => {
                    regex_str.push_str(&format!("(?:/(?P<p{}>.*))?", param_names.len()));
                    param_names.push(name.clone());
                }
                PathSegment::Tokens(tokens) => {
                    regex_str.push('/');
                    for token in tokens {
                        match token {
                            Token::Literal(text) => regex_str.push_str(&regex::escape(text)),
                            Token::Param { name, regex } => {
                                let inner = regex.as_deref().unwrap_or("[^/]+");
                                regex_str
                                    .push_str(&format!("(?P<p{}>{inner})", param_names.len()));
                                param_names.push(name.clone());
                            }
                            Token::Star => regex_str.push_str("[^/]*"),
                            Token::AnyChar => regex_str.push_str("[^/]"),
                        }
                    }
                }
            }
            segments.push(segment);
        }

        if trailing_slash && !pattern.ends_with('/') {
            regex_str.push_str("/?");
        }
        regex_str.push('$');

        let regex = Regex::new(&regex_str)
            .map_err(|e| RouterError::InvalidPattern(format!("{pattern}: {e}")))?;

        Ok(Self {
            pattern,
            segments,
            regex,
            param_names,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns extracted parameters if the path matches.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        let caps = self.regex.captures(path)?;

        let mut params = PathParams::new();

        for (i, name) in self.param_names.iter().enumerate() {
            if let Some(value) = caps.name(&format!("p{i}")) {
                params.insert(name.clone(), value.as_str().to_string());
            }
        }

        Some(params)
    }

    /// Returns true if the path matches.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Returns the normalized pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the parameter names.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Generates a path from parameters.
    ///
    /// Returns `None` when a parameter is missing or the pattern contains a
    /// wildcard, which has no single expansion.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use oxide_route_tree::PathPattern;
    ///
    /// let pattern = PathPattern::new("/posts/{id}").unwrap();
    /// let params: HashMap<String, String> =
    ///     [("id".to_string(), "123".to_string())]
    ///     .into_iter()
    ///     .collect();
    /// let path = pattern.reverse(&params).unwrap();
    /// assert_eq!(path, "/posts/123");
    /// ```
    pub fn reverse(&self, params: &HashMap<String, String>) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            match segment {
                PathSegment::Any => return None,
                PathSegment::CaptureRest(name) => {
                    let value = params.get(name)?;
                    if !value.is_empty() {
                        path.push('/');
                        path.push_str(value.trim_start_matches('/'));
                    }
                }
                PathSegment::Tokens(tokens) => {
                    path.push('/');
                    for token in tokens {
                        match token {
                            Token::Literal(s) => path.push_str(s),
                            Token::Param { name, .. } => path.push_str(params.get(name)?),
                            Token::Star | Token::AnyChar => return None,
                        }
                    }
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        Some(path)
    }

    /// Orders two patterns that both match `path`, most specific first.
    ///
    /// An exact match wins, the catch-all `/**` loses, then patterns with
    /// fewer variables and wildcards, then longer patterns come first.
    pub fn compare_specificity(&self, other: &Self, path: &str) -> Ordering {
        let a = Specificity::of(self);
        let b = Specificity::of(other);

        match (a.catch_all, b.catch_all) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        match (self.pattern == path, other.pattern == path) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {}
        }

        if a.prefix && b.double_wildcards == 0 {
            return Ordering::Greater;
        }
        if b.prefix && a.double_wildcards == 0 {
            return Ordering::Less;
        }

        a.total()
            .cmp(&b.total())
            .then_with(|| b.length.cmp(&a.length))
            .then_with(|| a.single_wildcards.cmp(&b.single_wildcards))
            .then_with(|| a.variables.cmp(&b.variables))
    }
}

/// Counts used to rank patterns against each other.
#[derive(Debug, Clone, Copy, Default)]
struct Specificity {
    variables: usize,
    single_wildcards: usize,
    double_wildcards: usize,
    catch_all: bool,
    prefix: bool,
    length: usize,
}

impl Specificity {
    fn of(pattern: &PathPattern) -> Self {
        let mut spec = Self {
            catch_all: pattern.pattern == "/**",
            prefix: pattern.pattern.ends_with("/**"),
            ..Self::default()
        };

        for segment in &pattern.segments {
            // Separator plus segment body; variables count as one character.
            spec.length += 1;
            match segment {
                PathSegment::Any => {
                    spec.double_wildcards += 1;
                    spec.length += 2;
                }
                PathSegment::CaptureRest(_) => {
                    spec.variables += 1;
                    spec.double_wildcards += 1;
                    spec.length += 1;
                }
                PathSegment::Tokens(tokens) => {
                    for token in tokens {
                        match token {
                            Token::Literal(s) => spec.length += s.chars().count(),
                            Token::Param { .. } => {
                                spec.variables += 1;
                                spec.length += 1;
                            }
                            Token::Star => {
                                spec.single_wildcards += 1;
                                spec.length += 1;
                            }
                            Token::AnyChar => spec.length += 1,
                        }
                    }
                }
            }
        }

        spec
    }

    const fn total(&self) -> usize {
        self.variables + self.single_wildcards + self.double_wildcards
    }
}

/// Blank patterns become the root; a missing leading slash is added.
pub(crate) fn normalize(pattern: &str) -> String {
    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        SEPARATOR.to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// A request path with its leading slash, the form patterns are matched
/// against.
pub(crate) fn request_path(path: &str) -> Cow<'_, str> {
    if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    }
}

fn parse_segment(part: &str) -> PathSegment {
    if part == "**" {
        return PathSegment::Any;
    }
    if let Some(name) = part
        .strip_prefix("{*")
        .and_then(|rest| rest.strip_suffix('}'))
    {
        if !name.is_empty() && !name.contains(['{', '}']) {
            return PathSegment::CaptureRest(name.to_string());
        }
    }

    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = part;

    while let Some(c) = rest.chars().next() {
        match c {
            '{' => {
                if let Some(end) = closing_brace(rest) {
                    flush(&mut literal, &mut tokens);
                    let inner = &rest[1..end];
                    let (name, regex) = match inner.split_once(':') {
                        Some((name, regex)) => (name, Some(regex.to_string())),
                        None => (inner, None),
                    };
                    tokens.push(Token::Param {
                        name: name.to_string(),
                        regex,
                    });
                    rest = &rest[end + 1..];
                    continue;
                }
                literal.push(c);
            }
            '*' => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::Star);
            }
            '?' => {
                flush(&mut literal, &mut tokens);
                tokens.push(Token::AnyChar);
            }
            _ => literal.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }
    flush(&mut literal, &mut tokens);

    PathSegment::Tokens(tokens)
}

/// Byte index of the brace closing the one at the start of `s`, honoring
/// nested braces in regex quantifiers.
fn closing_brace(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn flush(literal: &mut String, tokens: &mut Vec<Token>) {
    if !literal.is_empty() {
        tokens.push(Token::Literal(std::mem::take(literal)));
    }
}
