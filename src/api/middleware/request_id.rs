//! Request correlation id middleware.
//!
//! Every request leaves this layer with an `x-request-id` header: the
//! caller's value, byte for byte, when one was supplied, a fresh UUID v4
//! otherwise. The same value is written back into the request headers (so
//! handlers and inner layers read it from there), stored as a [`RequestId`]
//! extension, and set on the response whatever the outcome.

use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config::REQUEST_ID_HEADER;

/// Correlation id of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<RequestId>() {
            return Ok(id.clone());
        }
        Ok(resolve_request_id(&parts.headers).0)
    }
}

/// The caller-supplied header value, if present and non-empty.
///
/// No format check is applied; any bytes a header may carry are accepted.
pub fn incoming_request_header(headers: &HeaderMap) -> Option<HeaderValue> {
    headers
        .get(REQUEST_ID_HEADER)
        .filter(|value| !value.is_empty())
        .cloned()
}

/// Text form of the caller-supplied id. Bytes that are not UTF-8 are replaced.
pub fn incoming_request_id(headers: &HeaderMap) -> Option<String> {
    incoming_request_header(headers).map(|value| request_id_text(&value))
}

fn request_id_text(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// The correlation id for a request and the header value that carries it:
/// the caller's value unchanged, or a fresh UUID v4.
pub fn resolve_request_id(headers: &HeaderMap) -> (RequestId, Option<HeaderValue>) {
    match incoming_request_header(headers) {
        Some(value) => (RequestId(request_id_text(&value)), Some(value)),
        None => {
            let id = Uuid::new_v4().to_string();
            let value = HeaderValue::from_str(&id).ok();
            (RequestId(id), value)
        }
    }
}

/// Tag the request and its response with a correlation id.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let (id, header) = resolve_request_id(req.headers());

    if let Some(value) = &header {
        req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
    }
    req.extensions_mut().insert(id);

    let mut response = next.run(req).await;

    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
