//! Application route configuration.

use axum::{
    body::Body,
    http::{header::HeaderName, HeaderValue, Request},
    middleware::from_fn,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{app_routes, health_routes, not_found, user_routes};
use super::middleware::{
    handle_panic, incoming_request_id, problem_details_middleware, request_id_middleware,
};
use super::openapi::ApiDoc;
use super::AppState;
use crate::config::{CorsConfig, REQUEST_ID_HEADER};

/// Create the application router with all routes configured.
///
/// Layers, outermost first: request id tagging, tracing, CORS (when
/// enabled), problem-details translation, panic catching.
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let mut router = Router::new()
        .merge(app_routes())
        .nest("/health", health_routes())
        .nest("/users", user_routes());

    if !config.app_env.is_production() {
        router = router.merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()));
    }

    let mut router = router
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(from_fn(problem_details_middleware));

    if config.cors.enabled {
        router = router.layer(cors_layer(&config.cors));
    }

    router
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            let request_id =
                incoming_request_id(req.headers()).unwrap_or_else(|| "-".to_string());
            tracing::info_span!(
                "http_request",
                method = %req.method(),
                uri = %req.uri(),
                request_id = %request_id,
            )
        }))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// CORS policy from configuration; `*` allows any origin, otherwise a comma-separated list.
fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origin = if cors.origin.trim() == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cors
            .origin
            .split(',')
            .filter_map(|o| HeaderValue::from_str(o.trim()).ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
}
