//! User handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::RequestId;
use crate::api::AppState;
use crate::domain::{CreateUser, UpdateUser, UserResponse};
use crate::errors::{AppError, AppResult};
use crate::types::{Created, NoContent, ProblemResponse};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/active", get(list_active_users))
        .route("/email/:email", get(get_user_by_email))
        .route(
            "/:id",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .route("/:id/active", get(get_active_user))
        .route("/:id/deactivate", patch(deactivate_user))
}

/// Path ids are validated here so a malformed id is a 400, not a 404.
fn parse_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::validation("id must be a UUID"))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error", body = ProblemResponse),
        (status = 409, description = "Email already in use", body = ProblemResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    request_id: RequestId,
    ValidatedJson(payload): ValidatedJson<CreateUser>,
) -> AppResult<Created<UserResponse>> {
    let user = state.user_service.create(payload).await?;
    tracing::info!(request_id = %request_id, user_id = %user.id, "User created");
    Ok(Created(UserResponse::from(user)))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses((status = 200, description = "All users", body = Vec<UserResponse>))
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.find_all().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// List active users
#[utoipa::path(
    get,
    path = "/users/active",
    tag = "Users",
    responses((status = 200, description = "Active users", body = Vec<UserResponse>))
)]
pub async fn list_active_users(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users = state.user_service.find_all_active().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Get user by email
#[utoipa::path(
    get,
    path = "/users/email/{email}",
    tag = "Users",
    params(("email" = String, Path, description = "User email", example = "joao@example.com")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ProblemResponse)
    )
)]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.find_by_email(&email).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Malformed ID", body = ProblemResponse),
        (status = 404, description = "User not found", body = ProblemResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.find_one(parse_id(&id)?).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Get active user by ID
#[utoipa::path(
    get,
    path = "/users/{id}/active",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active user found", body = UserResponse),
        (status = 400, description = "Malformed ID", body = ProblemResponse),
        (status = 404, description = "Active user not found", body = ProblemResponse)
    )
)]
pub async fn get_active_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.find_active_by_id(parse_id(&id)?).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update a user
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error", body = ProblemResponse),
        (status = 404, description = "User not found", body = ProblemResponse),
        (status = 409, description = "Email already in use", body = ProblemResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request_id: RequestId,
    ValidatedJson(payload): ValidatedJson<UpdateUser>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.update(parse_id(&id)?, payload).await?;
    tracing::info!(request_id = %request_id, user_id = %user.id, "User updated");
    Ok(Json(UserResponse::from(user)))
}

/// Permanently delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Malformed ID", body = ProblemResponse),
        (status = 404, description = "User not found", body = ProblemResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request_id: RequestId,
) -> AppResult<NoContent> {
    let id = parse_id(&id)?;
    state.user_service.remove(id).await?;
    tracing::info!(request_id = %request_id, user_id = %id, "User deleted");
    Ok(NoContent)
}

/// Deactivate a user
#[utoipa::path(
    patch,
    path = "/users/{id}/deactivate",
    tag = "Users",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deactivated", body = UserResponse),
        (status = 400, description = "Malformed ID", body = ProblemResponse),
        (status = 404, description = "User not found", body = ProblemResponse)
    )
)]
pub async fn deactivate_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    request_id: RequestId,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.deactivate(parse_id(&id)?).await?;
    tracing::info!(request_id = %request_id, user_id = %user.id, "User deactivated");
    Ok(Json(UserResponse::from(user)))
}
