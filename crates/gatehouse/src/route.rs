//! Route declarations.

use std::sync::Arc;

use gatehouse_middleware::{
    BoxedHandler, BoxedMiddleware, Handler, Middleware, Pipeline, ValidationConfig,
};
use http::Method;

/// One endpoint: method, path pattern, middleware, handler, and optional
/// validation.
///
/// A `Route` is a declaration. [`Router::register`](crate::Router::register)
/// parses its pattern and compiles it into a pipeline, after which it is
/// immutable.
///
/// # Example
///
/// ```
/// use gatehouse::Route;
/// use gatehouse_core::{ObjectSchema, ValueSchema};
/// use gatehouse_middleware::{handler_fn, Reply, ValidationConfig};
/// use serde_json::json;
///
/// let route = Route::get(
///     "/products/:id",
///     handler_fn(|ctx| Box::pin(async move {
///         let id = ctx.request().param("id").unwrap_or_default().to_string();
///         Reply::json(&json!({ "id": id }))
///     })),
/// )
/// .validate(ValidationConfig::new().path(
///     ObjectSchema::new().field("id", ValueSchema::string().min_length(1)),
/// ));
///
/// assert_eq!(route.path(), "/products/:id");
/// assert!(route.validation().is_some());
/// ```
#[derive(Clone)]
pub struct Route {
    method: Method,
    path: String,
    middleware: Vec<BoxedMiddleware>,
    handler: BoxedHandler,
    validation: Option<ValidationConfig>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("path", &self.path)
            .field(
                "middleware",
                &self.middleware.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("validation", &self.validation)
            .finish_non_exhaustive()
    }
}

impl Route {
    /// Declares a route for `method` and `path`.
    #[must_use]
    pub fn new<H: Handler>(method: Method, path: impl Into<String>, handler: H) -> Self {
        Self::boxed(method, path, Arc::new(handler))
    }

    /// Declares a route with an already-shared handler.
    #[must_use]
    pub fn boxed(method: Method, path: impl Into<String>, handler: BoxedHandler) -> Self {
        Self {
            method,
            path: path.into(),
            middleware: Vec::new(),
            handler,
            validation: None,
        }
    }

    /// `GET` route.
    #[must_use]
    pub fn get<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::GET, path, handler)
    }

    /// `POST` route.
    #[must_use]
    pub fn post<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::POST, path, handler)
    }

    /// `PUT` route.
    #[must_use]
    pub fn put<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::PUT, path, handler)
    }

    /// `PATCH` route.
    #[must_use]
    pub fn patch<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::PATCH, path, handler)
    }

    /// `DELETE` route.
    #[must_use]
    pub fn delete<H: Handler>(path: impl Into<String>, handler: H) -> Self {
        Self::new(Method::DELETE, path, handler)
    }

    /// Appends a middleware. Middleware run in the order they are added.
    #[must_use]
    pub fn middleware<M: Middleware>(self, middleware: M) -> Self {
        self.boxed_middleware(Arc::new(middleware))
    }

    /// Appends an already-shared middleware.
    #[must_use]
    pub fn boxed_middleware(mut self, middleware: BoxedMiddleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    /// Declares request and/or response validation.
    #[must_use]
    pub fn validate(mut self, config: ValidationConfig) -> Self {
        self.validation = Some(config);
        self
    }

    /// The route's method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// The route's path pattern, as declared.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The declared validation, if any.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationConfig> {
        self.validation.as_ref()
    }

    /// Builds the chain: request validation, user middleware, response
    /// validation, handler. Validation stages are only present when
    /// declared.
    pub(crate) fn into_pipeline(self) -> Pipeline {
        let mut builder = Pipeline::builder();
        if let Some(config) = &self.validation {
            builder = builder.stage(config.request_stage());
        }
        builder = builder.stages(self.middleware);
        if let Some(stage) = self.validation.as_ref().and_then(ValidationConfig::response_stage) {
            builder = builder.stage(stage);
        }
        builder.boxed_handler(self.handler)
    }
}
