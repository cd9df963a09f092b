//! Path pattern parsing.
//!
//! A [`PathPattern`] is a pre-split list of [`Segment`]s. Patterns are parsed
//! once at registration time so that matching is a plain segment-by-segment
//! comparison with no string parsing on the hot path.

use std::fmt;

use thiserror::Error;

use crate::params::Params;

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal segment (e.g., "products", "v1")
    Literal(String),
    /// Named capture (e.g., ":id" or "{id}")
    Param(String),
}

/// Errors raised while parsing a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The pattern does not start with `/`.
    #[error("path pattern must start with '/': {pattern}")]
    MissingLeadingSlash {
        /// The offending pattern.
        pattern: String,
    },

    /// A parameter segment has no name (`:` or `{}`).
    #[error("empty parameter name in pattern {pattern}")]
    EmptyParamName {
        /// The offending pattern.
        pattern: String,
    },

    /// The same parameter name appears twice.
    #[error("duplicate parameter '{name}' in pattern {pattern}")]
    DuplicateParam {
        /// The offending pattern.
        pattern: String,
        /// The repeated name.
        name: String,
    },

    /// Wildcard, regex, or partially-captured segments are not supported.
    #[error("unsupported segment '{segment}' in pattern {pattern}")]
    UnsupportedSegment {
        /// The offending pattern.
        pattern: String,
        /// The segment that could not be parsed.
        segment: String,
    },
}

/// A parsed path pattern such as `/products/:id`.
///
/// # Example
///
/// ```rust
/// use gatehouse_router::{PathPattern, Segment};
///
/// let pattern = PathPattern::parse("/products/:id").unwrap();
/// assert_eq!(pattern.segments()[0], Segment::Literal("products".into()));
/// assert_eq!(pattern.segments()[1], Segment::Param("id".into()));
///
/// let params = pattern.matches("/products/42").unwrap();
/// assert_eq!(params.get("id"), Some("42"));
/// assert!(pattern.matches("/products").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    param_count: usize,
}

impl PathPattern {
    /// Parses a path pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if !pattern.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash {
                pattern: pattern.to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut names: Vec<&str> = Vec::new();

        for raw in pattern.split('/').filter(|s| !s.is_empty()) {
            let name = raw
                .strip_prefix(':')
                .or_else(|| raw.strip_prefix('{').and_then(|s| s.strip_suffix('}')));

            match name {
                Some("") => {
                    return Err(PatternError::EmptyParamName {
                        pattern: pattern.to_string(),
                    });
                }
                Some(name) => {
                    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                        return Err(PatternError::UnsupportedSegment {
                            pattern: pattern.to_string(),
                            segment: raw.to_string(),
                        });
                    }
                    if names.contains(&name) {
                        return Err(PatternError::DuplicateParam {
                            pattern: pattern.to_string(),
                            name: name.to_string(),
                        });
                    }
                    names.push(name);
                    segments.push(Segment::Param(name.to_string()));
                }
                None => {
                    if raw.contains(['*', '{', '}', '(', ')', ':']) {
                        return Err(PatternError::UnsupportedSegment {
                            pattern: pattern.to_string(),
                            segment: raw.to_string(),
                        });
                    }
                    segments.push(Segment::Literal(raw.to_string()));
                }
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            param_count: names.len(),
            segments,
        })
    }

    /// Returns the pattern as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the names of all parameter segments, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a concrete request path, returning captured parameters.
    ///
    /// One trailing slash is ignored; an empty segment anywhere else
    /// (`/products//1`) never matches.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Params> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        let mut parts = (!trimmed.is_empty())
            .then(|| trimmed.split('/'))
            .into_iter()
            .flatten();
        let mut params = Params::with_capacity(self.param_count);

        for segment in &self.segments {
            let part = parts.next()?;
            if part.is_empty() {
                return None;
            }
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return None;
                    }
                }
                Segment::Param(name) => params.push(name.clone(), part),
            }
        }

        if parts.next().is_some() {
            return None;
        }

        Some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
