//! Route path grammar.
//!
//! A route path is a `/`-separated list of segments. A segment wrapped in braces, such as
//! `{id}`, is a named parameter; every other segment is a literal compared byte-for-byte.
//! Canonical paths always begin with `/` and never end with one, the root being `/`.

use crate::error::Error;

/// Normalizes a raw route path into its canonical form.
///
/// ```rust
/// use lambdarouter::path::normalize;
///
/// assert_eq!(normalize("thing/{id}/").unwrap(), "/thing/{id}");
/// assert_eq!(normalize("/").unwrap(), "/");
/// assert!(normalize("").is_err());
/// assert!(normalize("a//b").is_err());
/// ```
pub fn normalize(raw: &str) -> Result<String, Error> {
    if raw.is_empty() {
        return Err(Error::invalid_path(raw, "path was empty"));
    }

    let trimmed = raw.strip_prefix('/').unwrap_or(raw);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Ok("/".to_owned());
    }

    if trimmed.split('/').any(str::is_empty) {
        return Err(Error::invalid_path(raw, "empty path segment"));
    }

    Ok(format!("/{}", trimmed))
}

/// Appends `path` to the canonical `prefix`, returning the canonical result.
///
/// An empty prefix means "no prefix".
pub fn join(prefix: &str, path: &str) -> Result<String, Error> {
    let path = normalize(path)?;

    Ok(match (prefix, path.as_str()) {
        ("", _) => path,
        (_, "/") => prefix.to_owned(),
        _ => format!("{}{}", prefix, path),
    })
}

/// Splits a concrete or canonical path into its segments, ignoring the leading `/`.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').filter(|s| !s.is_empty())
}

/// Strips the canonical `prefix` from a concrete path on a segment boundary.
///
/// Returns `None` when the path does not live under the prefix.
pub(crate) fn strip_prefix<'p>(prefix: &str, path: &'p str) -> Option<&'p str> {
    if prefix.is_empty() {
        return Some(path);
    }

    match path.strip_prefix(prefix)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// A single segment of a route template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Static(String),
    Param(String),
}

/// A parsed, canonical route template such as `/listings/{id}/state/{event}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Template {
    path: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses a raw path into a canonical template.
    ///
    /// ```rust
    /// use lambdarouter::path::{Segment, Template};
    ///
    /// let template = Template::parse("listings/{id}").unwrap();
    /// assert_eq!(template.as_str(), "/listings/{id}");
    /// assert_eq!(template.segments()[1], Segment::Param("id".into()));
    /// ```
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let path = normalize(raw)?;
        let mut parsed: Vec<Segment> = Vec::new();

        for segment in segments(&path) {
            match param_name(segment) {
                Some(name) => {
                    if name.is_empty() || name.starts_with('*') || name.contains(|c| c == '{' || c == '}') {
                        return Err(Error::invalid_path(raw, "invalid parameter name"));
                    }

                    if parsed.contains(&Segment::Param(name.to_owned())) {
                        return Err(Error::invalid_path(raw, "duplicate parameter name"));
                    }

                    parsed.push(Segment::Param(name.to_owned()));
                }
                None => parsed.push(Segment::Static(segment.to_owned())),
            }
        }

        Ok(Self {
            path,
            segments: parsed,
        })
    }

    /// The canonical path.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the parameters in this template, left to right.
    pub fn params(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Static(_) => None,
        })
    }

    /// The template in `matchit` syntax, with braces inside literal segments escaped.
    pub(crate) fn to_route(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_owned();
        }

        let mut route = String::with_capacity(self.path.len());
        for segment in &self.segments {
            route.push('/');
            match segment {
                Segment::Param(name) => {
                    route.push('{');
                    route.push_str(name);
                    route.push('}');
                }
                Segment::Static(literal) => {
                    for c in literal.chars() {
                        match c {
                            '{' => route.push_str("{{"),
                            '}' => route.push_str("}}"),
                            c => route.push(c),
                        }
                    }
                }
            }
        }
        route
    }
}

fn param_name(segment: &str) -> Option<&str> {
    if segment.len() >= 2 && segment.starts_with('{') && segment.ends_with('}') {
        Some(&segment[1..segment.len() - 1])
    } else {
        None
    }
}
