//! Error-to-response translation.

use gatehouse_core::{Response, RouteError};
use http::StatusCode;

/// Maps a [`RouteError`] to the response the caller sees.
///
/// | Error | Status | `error` | `details` |
/// |-------|--------|---------|-----------|
/// | Request validation | 422 | `RequestValidationError` | `{ issues }` |
/// | Response validation | 500 | `ResponseValidationError` | `{ issues }` if exposed |
/// | Not found | 404 | `NotFoundError` | `{ message }` |
/// | Route miss | 404 | `NotFoundError` | none |
/// | Internal | 500 | `InternalError` | `{ message }` if exposed |
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorTranslator {
    expose_internal_errors: bool,
}

impl ErrorTranslator {
    /// Creates a translator. With `expose_internal_errors` set, 500 bodies
    /// carry their issues or messages.
    #[must_use]
    pub const fn new(expose_internal_errors: bool) -> Self {
        Self {
            expose_internal_errors,
        }
    }

    /// Whether 500 bodies carry detail.
    #[must_use]
    pub const fn expose_internal_errors(&self) -> bool {
        self.expose_internal_errors
    }

    /// Builds the error response.
    #[must_use]
    pub fn translate(&self, error: &RouteError) -> Response {
        let envelope = error.to_envelope(self.expose_internal_errors);
        match serde_json::to_value(&envelope) {
            Ok(body) => Response::json(error.status_code(), body),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize error envelope");
                Response::new(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::ValidationError;
    use serde_json::json;

    fn body(response: &Response) -> serde_json::Value {
        response.body().as_json().cloned().unwrap()
    }

    #[test]
    fn test_request_validation() {
        let err = RouteError::RequestValidation(ValidationError::single(
            vec!["price".into()],
            "Number must be greater than 0",
        ));
        let response = ErrorTranslator::default().translate(&err);

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(
            body(&response),
            json!({
                "error": "RequestValidationError",
                "details": {"issues": [{"path": ["price"], "message": "Number must be greater than 0"}]}
            })
        );
    }

    #[test]
    fn test_response_validation_hidden_by_default() {
        let err = RouteError::ResponseValidation(ValidationError::single(
            vec!["id".into()],
            "Required",
        ));

        let hidden = ErrorTranslator::default().translate(&err);
        assert_eq!(hidden.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&hidden), json!({"error": "ResponseValidationError"}));

        let exposed = ErrorTranslator::new(true).translate(&err);
        assert_eq!(body(&exposed)["details"]["issues"][0]["path"], json!(["id"]));
    }

    #[test]
    fn test_not_found_and_route_miss() {
        let response = ErrorTranslator::default().translate(&RouteError::not_found("Product not found"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body(&response),
            json!({"error": "NotFoundError", "details": {"message": "Product not found"}})
        );

        let response =
            ErrorTranslator::default().translate(&RouteError::route_not_matched("GET", "/nope"));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&response), json!({"error": "NotFoundError"}));
    }

    #[test]
    fn test_internal_does_not_leak() {
        let err = RouteError::internal("connection refused: db-7.internal:5432");
        let response = ErrorTranslator::default().translate(&err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&response), json!({"error": "InternalError"}));
    }
}
