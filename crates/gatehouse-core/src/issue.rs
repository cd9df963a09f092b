//! Validation issues.
//!
//! A [`ValidationError`] is an ordered list of [`Issue`]s. Each issue names the
//! location of the offending value as a sequence of object keys and array
//! indices, so `["items", 2, "price"]` points at the `price` of the third
//! element of `items`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step in the path to a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

/// A single schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the offending value; empty for the root.
    pub path: Vec<PathSegment>,
    /// Human-readable description of the violation.
    pub message: String,
}

impl Issue {
    /// Creates an issue at `path`.
    pub fn new(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Creates an issue at the root of the validated value.
    pub fn root(message: impl Into<String>) -> Self {
        Self::new(Vec::new(), message)
    }

    /// Renders the path as `a.b[0].c`, or `<root>` when empty.
    #[must_use]
    pub fn path_string(&self) -> String {
        if self.path.is_empty() {
            return "<root>".to_string();
        }
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(k) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(k);
                }
                PathSegment::Index(i) => out.push_str(&format!("[{i}]")),
            }
        }
        out
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path_string(), self.message)
    }
}

/// One or more schema violations collected in a single pass.
///
/// # Example
///
/// ```
/// use gatehouse_core::{Issue, PathSegment, ValidationError};
///
/// let mut err = ValidationError::new();
/// err.push(Issue::new(vec!["price".into()], "Number must be greater than 0"));
///
/// assert_eq!(err.len(), 1);
/// assert_eq!(err.issues()[0].path, vec![PathSegment::Key("price".into())]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    issues: Vec<Issue>,
}

impl ValidationError {
    /// Creates an empty error; push issues onto it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an error with one issue.
    pub fn single(path: Vec<PathSegment>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(path, message)],
        }
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Appends every issue from `other`, keeping order.
    pub fn extend(&mut self, other: ValidationError) {
        self.issues.extend(other.issues);
    }

    /// Returns the issues in the order they were found.
    #[must_use]
    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Consumes the error, returning its issues.
    #[must_use]
    pub fn into_issues(self) -> Vec<Issue> {
        self.issues
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if no issues were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl From<Vec<Issue>> for ValidationError {
    fn from(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.issues.len() {
            0 => f.write_str("validation failed"),
            1 => write!(f, "{}", self.issues[0]),
            n => {
                write!(f, "{n} issues: ")?;
                for (i, issue) in self.issues.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{issue}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}
