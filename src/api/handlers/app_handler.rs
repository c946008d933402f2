//! Application-level handlers: welcome, API info and the route fallback.

use axum::{
    extract::{OriginalUri, State},
    http::Method,
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::errors::AppError;
use crate::types::ApiResponse;

/// Version and environment of the running API
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiInfo {
    #[schema(example = "1.0.0")]
    pub version: String,
    #[schema(example = "development")]
    pub environment: String,
}

/// Create application routes
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/info", get(info))
}

/// Welcome message
#[utoipa::path(
    get,
    path = "/",
    tag = "App",
    responses((status = 200, description = "Welcome message", body = String))
)]
pub async fn root() -> &'static str {
    "Welcome to Day Guard API"
}

/// API version and environment, wrapped in the standard envelope
#[utoipa::path(
    get,
    path = "/info",
    tag = "App",
    responses((status = 200, description = "API information (envelope `data` field)", body = ApiInfo))
)]
pub async fn info(State(state): State<AppState>) -> ApiResponse<ApiInfo> {
    ApiResponse::success(
        ApiInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: state.config.app_env.to_string(),
        },
        "Informações da API",
    )
}

/// Unmatched routes become a known 404
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(format!("Cannot {} {}", method, uri.path()))
}
