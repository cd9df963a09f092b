//! The schema contract.
//!
//! A [`Schema`] turns a raw JSON value into a parsed value, or explains in a
//! [`ValidationError`] why it cannot. Parsing may coerce: a query-string
//! schema can turn `"10"` into `10`. Gatehouse never coerces on a schema's
//! behalf; the router only hands raw values in and stores parsed values.
//!
//! Three implementations ship with this crate:
//!
//! - [`ValueSchema`](crate::ValueSchema) / [`ObjectSchema`](crate::ObjectSchema):
//!   declarative schemas that collect every violation in one pass
//! - [`TypedSchema`]: round-trips through a serde type
//! - [`SchemaFn`]: wraps a closure

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::issue::{Issue, ValidationError};

/// A shareable, type-erased schema.
pub type SharedSchema = Arc<dyn Schema>;

/// Something that can validate and parse a JSON value.
pub trait Schema: Send + Sync + 'static {
    /// Validates `value`, returning the parsed (possibly coerced) value.
    ///
    /// Implementations should report every violation they can find rather
    /// than stopping at the first.
    fn parse(&self, value: &Value) -> Result<Value, ValidationError>;
}

impl<S: Schema + ?Sized> Schema for Arc<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (**self).parse(value)
    }
}

impl<S: Schema + ?Sized> Schema for Box<S> {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (**self).parse(value)
    }
}

/// Runs `schema` against `value`.
///
/// A schema that fails without describing why still yields a structured
/// error with one root-level issue, so callers can always report at least
/// one entry.
///
/// # Example
///
/// ```
/// use gatehouse_core::{validate, ObjectSchema, ValueSchema};
/// use serde_json::json;
///
/// let schema = ObjectSchema::new().field("price", ValueSchema::number().positive());
///
/// assert!(validate(&schema, &json!({"price": 3})).is_ok());
///
/// let err = validate(&schema, &json!({"price": -10})).unwrap_err();
/// assert_eq!(err.issues()[0].path_string(), "price");
/// ```
pub fn validate<S: Schema + ?Sized>(schema: &S, value: &Value) -> Result<Value, ValidationError> {
    schema.parse(value).map_err(|err| {
        if err.is_empty() {
            ValidationError::from(vec![Issue::root("Invalid value")])
        } else {
            err
        }
    })
}

/// A schema backed by a closure.
pub struct SchemaFn<F> {
    func: F,
}

impl<F> std::fmt::Debug for SchemaFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaFn").finish_non_exhaustive()
    }
}

/// Builds a schema from a closure.
///
/// ```
/// use gatehouse_core::{schema_fn, validate, ValidationError};
/// use serde_json::{json, Value};
///
/// let even = schema_fn(|v: &Value| match v.as_i64() {
///     Some(n) if n % 2 == 0 => Ok(v.clone()),
///     _ => Err(ValidationError::single(vec![], "Expected an even integer")),
/// });
///
/// assert!(validate(&even, &json!(4)).is_ok());
/// assert!(validate(&even, &json!(3)).is_err());
/// ```
pub fn schema_fn<F>(func: F) -> SchemaFn<F>
where
    F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
{
    SchemaFn { func }
}

impl<F> Schema for SchemaFn<F>
where
    F: Fn(&Value) -> Result<Value, ValidationError> + Send + Sync + 'static,
{
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        (self.func)(value)
    }
}

/// A schema defined by a serde type.
///
/// The value is deserialized into `T` and serialized back, so the parsed
/// form is whatever `T` produces (defaults filled in, unknown fields dropped
/// unless `T` keeps them). Serde stops at its first error, so this schema
/// reports at most one issue.
///
/// ```
/// use gatehouse_core::{validate, TypedSchema};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Serialize, Deserialize)]
/// struct Product {
///     name: String,
///     #[serde(default)]
///     tags: Vec<String>,
/// }
///
/// let schema = TypedSchema::<Product>::new();
/// let parsed = validate(&schema, &json!({"name": "Desk"})).unwrap();
/// assert_eq!(parsed, json!({"name": "Desk", "tags": []}));
/// ```
pub struct TypedSchema<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedSchema<T> {
    /// Creates the schema.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedSchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for TypedSchema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedSchema")
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Schema for TypedSchema<T>
where
    T: DeserializeOwned + Serialize + 'static,
{
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let typed: T = serde_json::from_value(value.clone())
            .map_err(|e| ValidationError::from(vec![Issue::root(e.to_string())]))?;
        serde_json::to_value(typed)
            .map_err(|e| ValidationError::from(vec![Issue::root(e.to_string())]))
    }
}
