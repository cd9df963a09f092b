//! API-gateway proxy event adapter.
//!
//! Converts the JSON event shape used by REST API gateways into an
//! [`Event`], and a [`Response`] back into the gateway's response shape.
//! Binary bodies travel base64-encoded in both directions.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use gatehouse_core::{Body, Event, RequestId, Response, ResponseBody, RouteError, ValidationError};
use http::Method;
use serde::{Deserialize, Serialize};

use crate::router::{Router, REQUEST_ID_HEADER};

/// An inbound gateway proxy event.
///
/// ```
/// use gatehouse::GatewayEvent;
///
/// let event: GatewayEvent = serde_json::from_str(r#"{
///     "httpMethod": "GET",
///     "path": "/products",
///     "queryStringParameters": {"category": "Electronics"},
///     "headers": {"X-Api-Key": "secret"}
/// }"#).unwrap();
///
/// let event = event.into_event().unwrap();
/// assert_eq!(event.query.get("category").map(String::as_str), Some("Electronics"));
/// assert!(event.headers.contains_key("x-api-key"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayEvent {
    /// Request method, e.g. `"POST"`.
    pub http_method: String,

    /// Request path, e.g. `"/products/42"`.
    pub path: String,

    /// Single-valued query parameters.
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,

    /// Multi-valued query parameters; only the first value of each key is
    /// used, and only for keys missing from `queryStringParameters`.
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<BTreeMap<String, Vec<String>>>,

    /// Request headers.
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,

    /// Request body, base64-encoded when `isBase64Encoded` is set.
    #[serde(default)]
    pub body: Option<String>,

    /// Whether `body` is base64-encoded.
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl GatewayEvent {
    /// Reads a well-formed `x-request-id` header, matching the name
    /// case-insensitively.
    #[must_use]
    pub fn request_id(&self) -> Option<RequestId> {
        self.headers
            .iter()
            .flatten()
            .find(|(name, _)| name.eq_ignore_ascii_case(REQUEST_ID_HEADER))
            .and_then(|(_, value)| RequestId::parse(value))
    }

    /// Converts into a router [`Event`].
    ///
    /// # Errors
    ///
    /// - `RouteNotMatched` when the method is not a valid HTTP token
    /// - `RequestValidation` when a base64 body does not decode
    pub fn into_event(self) -> Result<Event, RouteError> {
        let method = Method::from_bytes(self.http_method.as_bytes())
            .map_err(|_| RouteError::route_not_matched(self.http_method.as_str(), self.path.as_str()))?;

        let mut event = Event::new(method, self.path);

        if let Some(query) = self.query_string_parameters {
            event.query.extend(query);
        }
        if let Some(multi) = self.multi_value_query_string_parameters {
            for (key, values) in multi {
                if let Some(first) = values.into_iter().next() {
                    event.query.entry(key).or_insert(first);
                }
            }
        }

        for (name, value) in self.headers.into_iter().flatten() {
            event.insert_header(&name, &value);
        }

        event.body = match self.body {
            None => Body::Empty,
            Some(text) if self.is_base64_encoded => {
                let bytes = STANDARD.decode(text.as_bytes()).map_err(|e| {
                    RouteError::RequestValidation(ValidationError::single(
                        Vec::new(),
                        format!("Invalid base64 body: {e}"),
                    ))
                })?;
                Body::Bytes(Bytes::from(bytes))
            }
            Some(text) => Body::from(text),
        };

        Ok(event)
    }
}

/// An outbound gateway proxy response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status_code: u16,

    /// Response headers; repeated names are joined with `", "`.
    pub headers: BTreeMap<String, String>,

    /// Response body; `None` for an empty body.
    pub body: Option<String>,

    /// Whether `body` is base64-encoded.
    pub is_base64_encoded: bool,
}

impl From<Response> for GatewayResponse {
    fn from(response: Response) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let Ok(value) = value.to_str() else {
                tracing::warn!(header = %name, "dropping non-ASCII response header");
                continue;
            };
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }

        let (body, is_base64_encoded) = match response.body() {
            ResponseBody::Empty => (None, false),
            ResponseBody::Json(value) => {
                headers
                    .entry("content-type".to_string())
                    .or_insert_with(|| "application/json".to_string());
                (Some(value.to_string()), false)
            }
            ResponseBody::Bytes(bytes) => match std::str::from_utf8(bytes) {
                Ok(text) => (Some(text.to_string()), false),
                Err(_) => (Some(STANDARD.encode(bytes)), true),
            },
        };

        Self {
            status_code: response.status().as_u16(),
            headers,
            body,
            is_base64_encoded,
        }
    }
}

impl Router {
    /// Dispatches a gateway proxy event.
    ///
    /// Events that cannot be converted are answered like any other failed
    /// dispatch: a bad method is a route miss, a bad base64 body is a
    /// request-validation failure.
    pub async fn dispatch_gateway(&self, event: GatewayEvent) -> GatewayResponse {
        let request_id = event.request_id().unwrap_or_default();
        match event.into_event() {
            Ok(event) => self.dispatch(event).await.into(),
            Err(error) => self.reject(request_id, &error).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use serde_json::json;

    fn event(method: &str, path: &str) -> GatewayEvent {
        GatewayEvent {
            http_method: method.to_string(),
            path: path.to_string(),
            ..GatewayEvent::default()
        }
    }

    #[test]
    fn test_query_prefers_single_values() {
        let mut gateway = event("GET", "/products");
        gateway.query_string_parameters =
            Some(BTreeMap::from([("category".to_string(), "Books".to_string())]));
        gateway.multi_value_query_string_parameters = Some(BTreeMap::from([
            ("category".to_string(), vec!["Toys".to_string()]),
            ("tag".to_string(), vec!["a".to_string(), "b".to_string()]),
        ]));

        let event = gateway.into_event().unwrap();
        assert_eq!(event.query.get("category").map(String::as_str), Some("Books"));
        assert_eq!(event.query.get("tag").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_base64_body() {
        let mut gateway = event("POST", "/products");
        gateway.body = Some(STANDARD.encode(br#"{"name":"Desk"}"#));
        gateway.is_base64_encoded = true;

        let event = gateway.into_event().unwrap();
        assert_eq!(event.body.to_json().unwrap(), json!({"name": "Desk"}));
    }

    #[test]
    fn test_bad_base64_is_request_validation() {
        let mut gateway = event("POST", "/products");
        gateway.body = Some("%%%".to_string());
        gateway.is_base64_encoded = true;

        let err = gateway.into_event().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_method_is_route_miss() {
        let err = event("GE T", "/products").into_event().unwrap_err();
        assert!(matches!(err, RouteError::RouteNotMatched { .. }));
    }

    #[test]
    fn test_response_conversion() {
        let mut response = Response::json(StatusCode::CREATED, json!({"id": "1"}));
        response.set_header("x-request-id", "abc");

        let gateway = GatewayResponse::from(response);
        assert_eq!(gateway.status_code, 201);
        assert_eq!(gateway.body.as_deref(), Some(r#"{"id":"1"}"#));
        assert_eq!(
            gateway.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert!(!gateway.is_base64_encoded);
    }

    #[test]
    fn test_binary_response_is_base64() {
        let mut response = Response::new(StatusCode::OK);
        response.set_body(ResponseBody::Bytes(Bytes::from_static(&[0xff, 0xfe])));

        let gateway = GatewayResponse::from(response);
        assert!(gateway.is_base64_encoded);
        assert_eq!(gateway.body.as_deref(), Some("//4="));
    }

    #[test]
    fn test_no_content_has_null_body() {
        let gateway = GatewayResponse::from(Response::new(StatusCode::NO_CONTENT));
        assert_eq!(gateway.status_code, 204);
        assert!(gateway.body.is_none());
        assert_eq!(serde_json::to_value(&gateway).unwrap()["body"], json!(null));
    }

    #[tokio::test]
    async fn test_dispatch_gateway_rejects_bad_method() {
        let router = Router::new();
        let response = router.dispatch_gateway(event("GE T", "/")).await;
        assert_eq!(response.status_code, 404);
        assert!(response.headers.contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_rejected_event_keeps_incoming_request_id() {
        let id = RequestId::new().to_string();
        let mut gateway = event("POST", "/products");
        gateway.headers = Some(BTreeMap::from([("X-Request-Id".to_string(), id.clone())]));
        gateway.body = Some("%%%".to_string());
        gateway.is_base64_encoded = true;

        let response = Router::new().dispatch_gateway(gateway).await;
        assert_eq!(response.status_code, 422);
        assert_eq!(response.headers.get(REQUEST_ID_HEADER), Some(&id));
    }
}
