//! Problem-details translator.
//!
//! The single place where failures become HTTP bodies. A response carrying
//! a [`Failure`] extension (set by `AppError`, the panic handler or the
//! fallback) is rendered as `application/problem+json`. Error responses
//! produced by the framework itself (405, body limits) are bridged into a
//! known failure.

use std::any::Any;

use axum::{
    body::Body,
    extract::{OriginalUri, Request},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use crate::config::{MAX_BRIDGED_BODY_BYTES, PROBLEM_JSON_CONTENT_TYPE, REQUEST_ID_HEADER};
use crate::errors::{AppError, Failure};
use crate::types::ProblemResponse;

use super::request_id::resolve_request_id;

/// Render every failed response as a problem document.
pub async fn problem_details_middleware(req: Request, next: Next) -> Response {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| req.uri());
    let instance = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let (correlation_id, request_id) = resolve_request_id(req.headers());

    let response = next.run(req).await;

    let (mut parts, body) = response.into_parts();
    let failure = match parts.extensions.remove::<Failure>() {
        Some(failure) => failure,
        None if needs_bridging(&parts) => bridge(parts.status, body).await,
        None => return Response::from_parts(parts, body),
    };

    if failure.is_unknown() || failure.status().is_server_error() {
        tracing::error!(
            correlation_id = %correlation_id,
            instance = %instance,
            status = failure.status().as_u16(),
            detail = failure.detail().unwrap_or_default(),
            "Request failed"
        );
    } else {
        tracing::debug!(
            correlation_id = %correlation_id,
            instance = %instance,
            status = failure.status().as_u16(),
            detail = failure.detail().unwrap_or_default(),
            "Request rejected"
        );
    }

    let problem = ProblemResponse::new(&failure, instance, correlation_id.0);
    let mut rendered = (failure.status(), Json(problem)).into_response();

    parts.headers.remove(header::CONTENT_TYPE);
    parts.headers.remove(header::CONTENT_LENGTH);
    let headers = rendered.headers_mut();
    headers.extend(parts.headers);
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(PROBLEM_JSON_CONTENT_TYPE),
    );
    if let Some(value) = request_id {
        headers.insert(REQUEST_ID_HEADER, value);
    }

    rendered
}

/// 4xx/5xx responses that did not come from our own error types.
fn needs_bridging(parts: &axum::http::response::Parts) -> bool {
    let is_error = parts.status.is_client_error() || parts.status.is_server_error();
    let already_problem = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with(PROBLEM_JSON_CONTENT_TYPE));

    is_error && !already_problem
}

/// Known failure from a framework error response; its text body becomes the detail.
async fn bridge(status: StatusCode, body: Body) -> Failure {
    let detail = axum::body::to_bytes(body, MAX_BRIDGED_BODY_BYTES)
        .await
        .ok()
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .filter(|text| !text.is_empty());

    Failure::from_status(status, detail)
}

/// Turn a handler panic into an unknown failure.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    tracing::error!(panic = %message, "Handler panicked");
    AppError::internal("Unexpected error while handling the request").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        http::Request as HttpRequest,
        middleware::from_fn,
        routing::{get, post},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;
    use uuid::Uuid;

    use crate::api::middleware::request_id_middleware;

    async fn known() -> Result<(), AppError> {
        Err(AppError::not_found("Usuário com ID 42 não encontrado"))
    }

    async fn unknown() -> Result<(), AppError> {
        Err(AppError::internal("boom"))
    }

    async fn boom() -> &'static str {
        panic!("kaboom")
    }

    async fn teapot() -> (StatusCode, &'static str) {
        (StatusCode::IM_A_TEAPOT, "short and stout")
    }

    async fn ok() -> &'static str {
        "fine"
    }

    fn app() -> Router {
        Router::new()
            .route("/known", get(known))
            .route("/unknown", get(unknown))
            .route("/panic", get(boom))
            .route("/teapot", get(teapot))
            .route("/ok", get(ok))
            .route("/only-post", post(ok))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(from_fn(problem_details_middleware))
            .layer(from_fn(request_id_middleware))
    }

    async fn send(method: &str, uri: &str, id: Option<&str>) -> (StatusCode, String, String, Value) {
        let mut builder = HttpRequest::builder().method(method).uri(uri);
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        let response = app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string())
            .unwrap_or_default();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, content_type, request_id, body)
    }

    #[tokio::test]
    async fn test_known_failure_is_rendered() {
        let (status, content_type, request_id, body) = send("GET", "/known", Some("abc")).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type, PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(request_id, "abc");
        assert_eq!(
            body,
            json!({
                "type": "about:blank",
                "title": "Not Found",
                "status": 404,
                "detail": "Usuário com ID 42 não encontrado",
                "instance": "/known",
                "correlationId": "abc"
            })
        );
    }

    #[tokio::test]
    async fn test_unknown_failure_is_500() {
        let (status, _, request_id, body) = send("GET", "/unknown", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["title"], "Internal Server Error");
        assert_eq!(body["status"], 500);
        assert_eq!(body["detail"], "boom");
        assert_eq!(body["correlationId"], request_id.as_str());
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_panic_is_unknown_failure() {
        let (status, content_type, request_id, body) = send("GET", "/panic", Some("p-1")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type, PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(request_id, "p-1");
        assert_eq!(body["title"], "Internal Server Error");
        assert_eq!(body["instance"], "/panic");
    }

    #[tokio::test]
    async fn test_non_ascii_correlation_id_is_kept() {
        let value = HeaderValue::from_bytes(b"caf\xc3\xa9-42").unwrap();
        let req = HttpRequest::builder()
            .uri("/known")
            .header(REQUEST_ID_HEADER, value.clone())
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(req).await.unwrap();

        assert_eq!(response.headers().get(REQUEST_ID_HEADER), Some(&value));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["correlationId"], "café-42");
    }

    #[tokio::test]
    async fn test_instance_keeps_query_string() {
        let (_, _, _, body) = send("GET", "/known?page=2&x=y", None).await;

        assert_eq!(body["instance"], "/known?page=2&x=y");
    }

    #[tokio::test]
    async fn test_plain_error_response_is_bridged() {
        let (status, content_type, _, body) = send("GET", "/teapot", None).await;

        assert_eq!(status, StatusCode::IM_A_TEAPOT);
        assert_eq!(content_type, PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(body["title"], "I'm a teapot");
        assert_eq!(body["detail"], "short and stout");
    }

    #[tokio::test]
    async fn test_method_not_allowed_is_bridged() {
        let (status, content_type, _, body) = send("GET", "/only-post", None).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(content_type, PROBLEM_JSON_CONTENT_TYPE);
        assert_eq!(body["title"], "Method Not Allowed");
        assert_eq!(body["instance"], "/only-post");
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REQUEST_ID_HEADER).is_some());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"fine");
    }

    #[tokio::test]
    async fn test_without_tagger_a_correlation_id_is_generated() {
        let app = Router::new()
            .route("/known", get(known))
            .layer(from_fn(problem_details_middleware));

        let response = app
            .oneshot(HttpRequest::builder().uri("/known").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
