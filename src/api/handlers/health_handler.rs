//! Health check handler.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::api::AppState;
use crate::config::HEALTH_DB_TIMEOUT_MS;
use crate::errors::{AppError, AppResult};
use crate::types::ProblemResponse;

/// Status of a single dependency
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndicatorStatus {
    #[schema(example = "up")]
    pub status: String,
}

/// Health check report
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub info: BTreeMap<String, IndicatorStatus>,
    pub error: BTreeMap<String, IndicatorStatus>,
    pub details: BTreeMap<String, IndicatorStatus>,
}

/// Create health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

/// Check application health (database ping)
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Application is healthy", body = HealthResponse),
        (status = 503, description = "A dependency is down", body = ProblemResponse,
            content_type = "application/problem+json")
    )
)]
pub async fn health_check(State(state): State<AppState>) -> AppResult<Json<HealthResponse>> {
    let timeout = Duration::from_millis(HEALTH_DB_TIMEOUT_MS);

    let message = match tokio::time::timeout(timeout, state.database.ping()).await {
        Ok(Ok(())) => {
            let up = BTreeMap::from([(
                "database".to_string(),
                IndicatorStatus {
                    status: "up".to_string(),
                },
            )]);
            return Ok(Json(HealthResponse {
                status: "ok".to_string(),
                info: up.clone(),
                error: BTreeMap::new(),
                details: up,
            }));
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => format!("timeout of {}ms exceeded", HEALTH_DB_TIMEOUT_MS),
    };

    tracing::warn!(reason = %message, "Database health check failed");

    Err(AppError::Status {
        status: StatusCode::SERVICE_UNAVAILABLE,
        title: None,
        message: "Health check failed".to_string(),
        errors: Some(json!({ "database": { "status": "down", "message": message } })),
    })
}
