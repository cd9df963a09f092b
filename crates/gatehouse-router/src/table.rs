//! Registration-ordered route table.
//!
//! [`RouteTable`] is a linear scan over pre-parsed patterns. Entries are
//! checked in the order they were inserted and the first match wins, which
//! makes matching deterministic and easy to reason about: a more specific
//! route must simply be registered before a more general one.

use http::Method;

use crate::params::Params;
use crate::pattern::{PathPattern, PatternError};

/// A route table entry.
#[derive(Debug, Clone)]
struct Entry<T> {
    method: Method,
    pattern: PathPattern,
    value: T,
}

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// The value registered for the route.
    pub value: &'a T,
    /// The pattern that matched.
    pub pattern: &'a PathPattern,
    /// Parameters captured from the path.
    pub params: Params,
}

/// Maps `(method, path pattern)` pairs to values of type `T`.
///
/// The table is built once at startup and only read afterwards, so it can be
/// shared across concurrent invocations behind an `Arc` without locking.
///
/// # Example
///
/// ```rust
/// use gatehouse_router::RouteTable;
/// use http::Method;
///
/// let mut table = RouteTable::new();
/// table.insert(Method::GET, "/products/featured", "featured").unwrap();
/// table.insert(Method::GET, "/products/:id", "byId").unwrap();
///
/// // Registration order decides between overlapping patterns.
/// let found = table.match_route(&Method::GET, "/products/featured").unwrap();
/// assert_eq!(*found.value, "featured");
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Parses `pattern` and appends an entry.
    pub fn insert(&mut self, method: Method, pattern: &str, value: T) -> Result<(), PatternError> {
        let pattern = PathPattern::parse(pattern)?;
        self.insert_parsed(method, pattern, value);
        Ok(())
    }

    /// Appends an entry with an already-parsed pattern.
    pub fn insert_parsed(&mut self, method: Method, pattern: PathPattern, value: T) {
        self.entries.push(Entry {
            method,
            pattern,
            value,
        });
    }

    /// Finds the first entry matching `method` and `path`.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.entries
            .iter()
            .filter(|entry| entry.method == *method)
            .find_map(|entry| {
                entry.pattern.matches(path).map(|params| RouteMatch {
                    value: &entry.value,
                    pattern: &entry.pattern,
                    params,
                })
            })
    }

    /// Returns the methods registered for patterns matching `path`.
    ///
    /// Useful for diagnostics when a path exists but the method does not.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for entry in &self.entries {
            if entry.pattern.matches(path).is_some() && !methods.contains(&entry.method) {
                methods.push(entry.method.clone());
            }
        }
        methods
    }

    /// Iterates over registered `(method, pattern, value)` triples in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathPattern, &T)> {
        self.entries
            .iter()
            .map(|entry| (&entry.method, &entry.pattern, &entry.value))
    }

    /// Returns the number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_table() -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/products", "list").unwrap();
        table.insert(Method::POST, "/products", "create").unwrap();
        table.insert(Method::GET, "/products/:id", "get").unwrap();
        table.insert(Method::PUT, "/products/:id", "update").unwrap();
        table.insert(Method::DELETE, "/products/:id", "delete").unwrap();
        table
    }

    #[test]
    fn test_table_new() {
        let table: RouteTable<()> = RouteTable::new();
        assert!(table.is_empty());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_first_registered_wins() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/users/:id", "byId").unwrap();
        table.insert(Method::GET, "/users/me", "me").unwrap();

        // The param route was registered first, so it shadows the literal.
        let found = table.match_route(&Method::GET, "/users/me").unwrap();
        assert_eq!(*found.value, "byId");
        assert_eq!(found.params.get("id"), Some("me"));
    }

    #[test]
    fn test_literal_before_param_when_registered_first() {
        let mut table = RouteTable::new();
        table.insert(Method::GET, "/users/me", "me").unwrap();
        table.insert(Method::GET, "/users/:id", "byId").unwrap();

        assert_eq!(*table.match_route(&Method::GET, "/users/me").unwrap().value, "me");
        assert_eq!(
            *table.match_route(&Method::GET, "/users/7").unwrap().value,
            "byId"
        );
    }

    #[test]
    fn test_method_must_match_exactly() {
        let table = sample_table();
        assert!(table.match_route(&Method::PATCH, "/products/1").is_none());
        assert!(table.match_route(&Method::HEAD, "/products").is_none());
    }

    #[test]
    fn test_no_match() {
        let table = sample_table();
        assert!(table.match_route(&Method::GET, "/orders").is_none());
        assert!(table.match_route(&Method::GET, "/products/1/reviews").is_none());
    }

    #[test]
    fn test_match_reports_pattern() {
        let table = sample_table();
        let found = table.match_route(&Method::DELETE, "/products/abc").unwrap();
        assert_eq!(found.pattern.as_str(), "/products/:id");
        assert_eq!(*found.value, "delete");
    }

    #[test]
    fn test_allowed_methods() {
        let table = sample_table();
        assert_eq!(
            table.allowed_methods("/products/9"),
            vec![Method::GET, Method::PUT, Method::DELETE]
        );
        assert!(table.allowed_methods("/nothing").is_empty());
    }

    #[test]
    fn test_iter_in_registration_order() {
        let table = sample_table();
        let values: Vec<_> = table.iter().map(|(_, _, v)| *v).collect();
        assert_eq!(values, vec!["list", "create", "get", "update", "delete"]);
    }

    proptest! {
        #[test]
        fn prop_matching_is_deterministic(id in "[a-zA-Z0-9_-]{1,16}", repeat in 1usize..5) {
            let table = sample_table();
            let path = format!("/products/{id}");
            let first = table.match_route(&Method::GET, &path).map(|m| (*m.value, m.params));
            for _ in 0..repeat {
                let again = table.match_route(&Method::GET, &path).map(|m| (*m.value, m.params));
                prop_assert_eq!(&again, &first);
            }
            let (value, params) = first.unwrap();
            prop_assert_eq!(value, "get");
            prop_assert_eq!(params.get("id"), Some(id.as_str()));
        }
    }
}
