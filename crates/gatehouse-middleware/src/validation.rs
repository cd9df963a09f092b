//! Request and response validation middleware.
//!
//! A route's [`ValidationConfig`] declares schemas for the request parts it
//! cares about and, optionally, for its response body. From it the router
//! generates two stages:
//!
//! ```text
//! [ValidationMiddleware] → user middleware → [ResponseValidationMiddleware] → Handler
//! ```
//!
//! [`ValidationMiddleware`] always runs first. It validates path, query,
//! headers, and body in that order, collecting every issue from every part
//! before deciding. Any issue stops the chain with
//! [`RouteError::RequestValidation`]; otherwise the parsed parts are stored in
//! `valid.req`.
//!
//! [`ResponseValidationMiddleware`] wraps the handler directly, so the
//! response body is checked as soon as the handler returns and `valid.res`
//! is already populated when user middleware resumes after `next()`. A body
//! violating its schema is a server-side fault,
//! [`RouteError::ResponseValidation`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use gatehouse_core::{
    validate, RequestContext, RouteError, RouteResult, Schema, SharedSchema, ValidRequest,
    ValidResponse, ValidationError,
};
use serde_json::{Map, Value};

use crate::middleware::{BoxFuture, Middleware, Next};

/// Per-route validation declaration.
///
/// # Example
///
/// ```
/// use gatehouse_core::{ObjectSchema, ValueSchema};
/// use gatehouse_middleware::ValidationConfig;
///
/// let config = ValidationConfig::new()
///     .path(ObjectSchema::new().field("id", ValueSchema::string()))
///     .body(ObjectSchema::new().field("name", ValueSchema::string()))
///     .response_body(ObjectSchema::new().field("id", ValueSchema::string()));
///
/// assert_eq!(config.request_parts(), vec!["path", "body"]);
/// assert!(config.validates_response());
/// ```
#[derive(Clone, Default)]
pub struct ValidationConfig {
    path: Option<SharedSchema>,
    query: Option<SharedSchema>,
    headers: Option<SharedSchema>,
    body: Option<SharedSchema>,
    response_body: Option<SharedSchema>,
}

impl fmt::Debug for ValidationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationConfig")
            .field("request_parts", &self.request_parts())
            .field("response_body", &self.response_body.is_some())
            .finish()
    }
}

impl ValidationConfig {
    /// Creates a declaration with no schemas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates path parameters, given as an object of strings.
    #[must_use]
    pub fn path<S: Schema>(mut self, schema: S) -> Self {
        self.path = Some(Arc::new(schema));
        self
    }

    /// Validates query parameters, given as an object of strings.
    #[must_use]
    pub fn query<S: Schema>(mut self, schema: S) -> Self {
        self.query = Some(Arc::new(schema));
        self
    }

    /// Validates headers, given as an object of strings keyed by lowercase
    /// name.
    #[must_use]
    pub fn headers<S: Schema>(mut self, schema: S) -> Self {
        self.headers = Some(Arc::new(schema));
        self
    }

    /// Validates the body, decoded as JSON (`null` when empty).
    #[must_use]
    pub fn body<S: Schema>(mut self, schema: S) -> Self {
        self.body = Some(Arc::new(schema));
        self
    }

    /// Validates the handler's response body.
    #[must_use]
    pub fn response_body<S: Schema>(mut self, schema: S) -> Self {
        self.response_body = Some(Arc::new(schema));
        self
    }

    /// Returns the declared request parts in validation order.
    #[must_use]
    pub fn request_parts(&self) -> Vec<&'static str> {
        [
            ("path", &self.path),
            ("query", &self.query),
            ("headers", &self.headers),
            ("body", &self.body),
        ]
        .into_iter()
        .filter(|(_, schema)| schema.is_some())
        .map(|(name, _)| name)
        .collect()
    }

    /// Returns true if a response body schema is declared.
    #[must_use]
    pub const fn validates_response(&self) -> bool {
        self.response_body.is_some()
    }

    /// Builds the stage that runs first in the chain.
    #[must_use]
    pub fn request_stage(&self) -> ValidationMiddleware {
        ValidationMiddleware {
            config: self.clone(),
        }
    }

    /// Builds the stage that wraps the handler, if a response schema is
    /// declared.
    #[must_use]
    pub fn response_stage(&self) -> Option<ResponseValidationMiddleware> {
        self.response_body
            .as_ref()
            .map(|schema| ResponseValidationMiddleware {
                schema: Arc::clone(schema),
            })
    }
}

fn string_map(entries: impl IntoIterator<Item = (String, String)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

fn check(
    schema: Option<&SharedSchema>,
    raw: impl FnOnce() -> Result<Value, ValidationError>,
    issues: &mut ValidationError,
) -> Option<Value> {
    let schema = schema?;
    match raw().and_then(|value| validate(schema.as_ref(), &value)) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            issues.extend(err);
            None
        }
    }
}

/// Validates the declared request parts before anything else runs.
#[derive(Debug, Clone)]
pub struct ValidationMiddleware {
    config: ValidationConfig,
}

impl ValidationMiddleware {
    /// Creates the stage for `config`.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validates every declared part of the request in `ctx`.
    ///
    /// Returns the parsed parts, or one error holding the issues of every
    /// failed part in path, query, headers, body order.
    pub fn validate_request(&self, ctx: &RequestContext) -> Result<ValidRequest, ValidationError> {
        let request = ctx.request();
        let mut issues = ValidationError::new();

        let path = check(
            self.config.path.as_ref(),
            || Ok(string_map(request.params().to_map())),
            &mut issues,
        );
        let query = check(
            self.config.query.as_ref(),
            || Ok(string_map(request.query().clone())),
            &mut issues,
        );
        let headers = check(
            self.config.headers.as_ref(),
            || Ok(string_map(request.headers_map())),
            &mut issues,
        );
        let body = check(self.config.body.as_ref(), || request.body().to_json(), &mut issues);

        if issues.is_empty() {
            Ok(ValidRequest {
                path,
                query,
                headers,
                body,
            })
        } else {
            Err(issues)
        }
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &'static str {
        "request_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            match self.validate_request(ctx) {
                Ok(valid) => ctx.set_valid_request(valid)?,
                Err(issues) => {
                    tracing::info!(
                        request_id = %ctx.request_id(),
                        route = ctx.route().unwrap_or("-"),
                        issues = issues.len(),
                        "request validation failed"
                    );
                    return Err(RouteError::RequestValidation(issues));
                }
            }

            next.run(ctx).await
        })
    }
}

/// Validates the handler's response body as soon as the handler returns.
///
/// Only successful (2xx) responses are checked; error responses set by the
/// handler or by middleware pass through untouched.
#[derive(Clone)]
pub struct ResponseValidationMiddleware {
    schema: SharedSchema,
}

impl fmt::Debug for ResponseValidationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseValidationMiddleware").finish_non_exhaustive()
    }
}

impl ResponseValidationMiddleware {
    /// Creates the stage for `schema`.
    #[must_use]
    pub fn new<S: Schema>(schema: S) -> Self {
        Self {
            schema: Arc::new(schema),
        }
    }
}

impl Middleware for ResponseValidationMiddleware {
    fn name(&self) -> &'static str {
        "response_validation"
    }

    fn process<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, RouteResult<()>> {
        Box::pin(async move {
            next.run(ctx).await?;

            if !ctx.response().status().is_success() {
                return Ok(());
            }

            let parsed = ctx
                .response()
                .body()
                .to_json()
                .and_then(|body| validate(self.schema.as_ref(), &body));

            match parsed {
                Ok(body) => ctx.set_valid_response(ValidResponse { body }),
                Err(issues) => {
                    let detail: BTreeMap<String, &str> = issues
                        .issues()
                        .iter()
                        .map(|issue| (issue.path_string(), issue.message.as_str()))
                        .collect();
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        route = ctx.route().unwrap_or("-"),
                        issues = ?detail,
                        "handler response violates its declared schema"
                    );
                    Err(RouteError::ResponseValidation(issues))
                }
            }
        })
    }
}
