//! Declarative schemas.
//!
//! [`ValueSchema`] describes a single JSON value and [`ObjectSchema`] a JSON
//! object with named fields. Both walk the whole input and report every
//! violation with its path, so a body with three bad fields yields three
//! issues.
//!
//! ```
//! use gatehouse_core::{validate, ObjectSchema, ValueSchema};
//! use serde_json::json;
//!
//! let product = ObjectSchema::new()
//!     .field("name", ValueSchema::string().min_length(1))
//!     .field("price", ValueSchema::number().positive())
//!     .field("category", ValueSchema::string());
//!
//! let err = validate(&product, &json!({"name": "", "price": -10})).unwrap_err();
//! let paths: Vec<_> = err.issues().iter().map(|i| i.path_string()).collect();
//! assert_eq!(paths, vec!["name", "price", "category"]);
//! ```

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::issue::{Issue, PathSegment, ValidationError};
use crate::schema::Schema;

/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone)]
enum Kind {
    Any,
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<ValueSchema>),
    Object(ObjectSchema),
}

impl Kind {
    const fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        return Some(Value::from(n as i64));
    }
    Number::from_f64(n).map(Value::Number)
}

fn format_bound(n: f64) -> String {
    number_value(n).map_or_else(|| n.to_string(), |v| v.to_string())
}

/// Schema for a single JSON value.
#[derive(Debug, Clone)]
pub struct ValueSchema {
    kind: Kind,
    coerce: bool,
    nullable: bool,
    min: Option<f64>,
    max: Option<f64>,
    exclusive_min: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    one_of: Vec<String>,
}

impl ValueSchema {
    fn of(kind: Kind) -> Self {
        Self {
            kind,
            coerce: false,
            nullable: false,
            min: None,
            max: None,
            exclusive_min: false,
            min_length: None,
            max_length: None,
            one_of: Vec::new(),
        }
    }

    /// Accepts any value, including `null`.
    #[must_use]
    pub fn any() -> Self {
        Self::of(Kind::Any)
    }

    /// A string.
    #[must_use]
    pub fn string() -> Self {
        Self::of(Kind::String)
    }

    /// A finite number.
    #[must_use]
    pub fn number() -> Self {
        Self::of(Kind::Number)
    }

    /// A number with no fractional part.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(Kind::Integer)
    }

    /// `true` or `false`.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(Kind::Boolean)
    }

    /// An array whose every element matches `item`.
    #[must_use]
    pub fn array(item: ValueSchema) -> Self {
        Self::of(Kind::Array(Box::new(item)))
    }

    /// An object described by `schema`.
    #[must_use]
    pub fn object(schema: ObjectSchema) -> Self {
        Self::of(Kind::Object(schema))
    }

    /// Accept strings for numbers, integers, and booleans.
    ///
    /// Path, query, and header values always arrive as strings; use this on
    /// their schemas to get typed values out.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        self
    }

    /// Accept `null` in addition to the declared type.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Inclusive lower bound for numbers.
    #[must_use]
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self.exclusive_min = false;
        self
    }

    /// Inclusive upper bound for numbers.
    #[must_use]
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Numbers must be strictly greater than zero.
    #[must_use]
    pub fn positive(mut self) -> Self {
        self.min = Some(0.0);
        self.exclusive_min = true;
        self
    }

    /// Numbers must be zero or greater.
    #[must_use]
    pub fn non_negative(self) -> Self {
        self.min(0.0)
    }

    /// Minimum string length (in characters) or array length.
    #[must_use]
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    /// Maximum string length (in characters) or array length.
    #[must_use]
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Restricts strings to a fixed set of values.
    #[must_use]
    pub fn one_of<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.one_of = values.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if `null` is accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable || matches!(self.kind, Kind::Any)
    }

    /// Validates `value` at `path`, pushing issues. Returns the parsed value
    /// if no new issues were found.
    fn check(&self, value: &Value, path: &mut Vec<PathSegment>, issues: &mut Vec<Issue>) -> Option<Value> {
        if value.is_null() && self.is_nullable() {
            return Some(Value::Null);
        }

        let before = issues.len();
        let parsed = match &self.kind {
            Kind::Any => Some(value.clone()),
            Kind::String => self.check_string(value, path, issues),
            Kind::Number | Kind::Integer => self.check_number(value, path, issues),
            Kind::Boolean => self.check_boolean(value, path, issues),
            Kind::Array(item) => self.check_array(item, value, path, issues),
            Kind::Object(schema) => schema.check(value, path, issues),
        };

        if issues.len() > before {
            None
        } else {
            parsed
        }
    }

    fn type_mismatch(&self, value: &Value, path: &[PathSegment], issues: &mut Vec<Issue>) {
        issues.push(Issue::new(
            path.to_vec(),
            format!("Expected {}, received {}", self.kind.name(), type_of(value)),
        ));
    }

    fn check_string(&self, value: &Value, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<Value> {
        let Some(s) = value.as_str() else {
            self.type_mismatch(value, path, issues);
            return None;
        };

        let len = s.chars().count();
        if let Some(min) = self.min_length {
            if len < min {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("String must contain at least {min} character(s)"),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("String must contain at most {max} character(s)"),
                ));
            }
        }
        if !self.one_of.is_empty() && !self.one_of.iter().any(|v| v == s) {
            let expected: Vec<String> = self.one_of.iter().map(|v| format!("'{v}'")).collect();
            issues.push(Issue::new(
                path.to_vec(),
                format!(
                    "Invalid enum value. Expected {}, received '{s}'",
                    expected.join(" | ")
                ),
            ));
        }

        Some(value.clone())
    }

    fn check_number(&self, value: &Value, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<Value> {
        let n = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) if self.coerce => {
                s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
            }
            _ => None,
        };

        let Some(n) = n else {
            if value.is_string() && self.coerce {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("Expected {}, received nan", self.kind.name()),
                ));
            } else {
                self.type_mismatch(value, path, issues);
            }
            return None;
        };

        if matches!(self.kind, Kind::Integer) && n.fract() != 0.0 {
            issues.push(Issue::new(path.to_vec(), "Expected integer, received float"));
        }

        if let Some(min) = self.min {
            if self.exclusive_min && n <= min {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("Number must be greater than {}", format_bound(min)),
                ));
            } else if !self.exclusive_min && n < min {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("Number must be greater than or equal to {}", format_bound(min)),
                ));
            }
        }
        if let Some(max) = self.max {
            if n > max {
                issues.push(Issue::new(
                    path.to_vec(),
                    format!("Number must be less than or equal to {}", format_bound(max)),
                ));
            }
        }

        match value {
            Value::Number(_) => Some(value.clone()),
            _ => number_value(n),
        }
    }

    fn check_boolean(&self, value: &Value, path: &[PathSegment], issues: &mut Vec<Issue>) -> Option<Value> {
        match value {
            Value::Bool(_) => Some(value.clone()),
            Value::String(s) if self.coerce => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => {
                    issues.push(Issue::new(
                        path.to_vec(),
                        format!("Expected boolean, received '{s}'"),
                    ));
                    None
                }
            },
            _ => {
                self.type_mismatch(value, path, issues);
                None
            }
        }
    }

    fn check_array(
        &self,
        item: &ValueSchema,
        value: &Value,
        path: &mut Vec<PathSegment>,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        let Some(elements) = value.as_array() else {
            self.type_mismatch(value, path, issues);
            return None;
        };

        if let Some(min) = self.min_length {
            if elements.len() < min {
                issues.push(Issue::new(
                    path.clone(),
                    format!("Array must contain at least {min} element(s)"),
                ));
            }
        }
        if let Some(max) = self.max_length {
            if elements.len() > max {
                issues.push(Issue::new(
                    path.clone(),
                    format!("Array must contain at most {max} element(s)"),
                ));
            }
        }

        let mut parsed = Vec::with_capacity(elements.len());
        for (i, element) in elements.iter().enumerate() {
            path.push(PathSegment::Index(i));
            if let Some(v) = item.check(element, path, issues) {
                parsed.push(v);
            }
            path.pop();
        }
        Some(Value::Array(parsed))
    }
}

impl Schema for ValueSchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        match self.check(value, &mut path, &mut issues) {
            Some(parsed) if issues.is_empty() => Ok(parsed),
            _ => Err(ValidationError::from(issues)),
        }
    }
}

impl From<ObjectSchema> for ValueSchema {
    fn from(schema: ObjectSchema) -> Self {
        Self::object(schema)
    }
}

/// What to do with keys an [`ObjectSchema`] does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKeys {
    /// Drop them from the parsed value.
    #[default]
    Strip,
    /// Report each one as an issue.
    Strict,
    /// Copy them through unchanged.
    Passthrough,
}

#[derive(Debug, Clone)]
struct Field {
    schema: ValueSchema,
    required: bool,
    default: Option<Value>,
}

/// Schema for a JSON object with named fields.
///
/// Fields are checked in declaration order, so issues come out in that
/// order too. Declaring a name again replaces the earlier field in place.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, Field>,
    unknown: UnknownKeys,
}

impl ObjectSchema {
    /// Creates a schema with no fields that strips unknown keys.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a required field.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, schema: impl Into<ValueSchema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                required: true,
                default: None,
            },
        );
        self
    }

    /// Adds a field that may be absent.
    #[must_use]
    pub fn optional(mut self, name: impl Into<String>, schema: impl Into<ValueSchema>) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                required: false,
                default: None,
            },
        );
        self
    }

    /// Adds a field that takes `default` when absent.
    #[must_use]
    pub fn with_default(
        mut self,
        name: impl Into<String>,
        schema: impl Into<ValueSchema>,
        default: Value,
    ) -> Self {
        self.fields.insert(
            name.into(),
            Field {
                schema: schema.into(),
                required: false,
                default: Some(default),
            },
        );
        self
    }

    /// Report undeclared keys as issues.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.unknown = UnknownKeys::Strict;
        self
    }

    /// Keep undeclared keys in the parsed value.
    #[must_use]
    pub fn passthrough(mut self) -> Self {
        self.unknown = UnknownKeys::Passthrough;
        self
    }

    /// Returns the declared field names, in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    fn check(&self, value: &Value, path: &mut Vec<PathSegment>, issues: &mut Vec<Issue>) -> Option<Value> {
        let Some(object) = value.as_object() else {
            issues.push(Issue::new(
                path.clone(),
                format!("Expected object, received {}", type_of(value)),
            ));
            return None;
        };

        let mut parsed = Map::new();
        for (name, field) in &self.fields {
            path.push(PathSegment::Key(name.clone()));
            match object.get(name) {
                Some(v) => {
                    if let Some(p) = field.schema.check(v, path, issues) {
                        parsed.insert(name.clone(), p);
                    }
                }
                None => {
                    if let Some(default) = &field.default {
                        parsed.insert(name.clone(), default.clone());
                    } else if field.required {
                        issues.push(Issue::new(path.clone(), "Required"));
                    }
                }
            }
            path.pop();
        }

        let declared = |key: &String| self.fields.contains_key(key);
        match self.unknown {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                for key in object.keys().filter(|k| !declared(*k)) {
                    path.push(PathSegment::Key(key.clone()));
                    issues.push(Issue::new(path.clone(), format!("Unrecognized key '{key}'")));
                    path.pop();
                }
            }
            UnknownKeys::Passthrough => {
                for (key, v) in object.iter().filter(|(k, _)| !declared(*k)) {
                    parsed.insert(key.clone(), v.clone());
                }
            }
        }

        Some(Value::Object(parsed))
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, value: &Value) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let mut path = Vec::new();
        match self.check(value, &mut path, &mut issues) {
            Some(parsed) if issues.is_empty() => Ok(parsed),
            _ => Err(ValidationError::from(issues)),
        }
    }
}
