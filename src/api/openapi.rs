//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::api::handlers::{app_handler, health_handler, user_handler};
use crate::domain::{CreateUser, UpdateUser, UserResponse};
use crate::types::ProblemResponse;

/// OpenAPI documentation for the Day Guard API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Day Guard API",
        version = "1.0.0",
        description = "Users, health checks and RFC 7807 problem-details errors",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        app_handler::root,
        app_handler::info,
        health_handler::health_check,
        user_handler::create_user,
        user_handler::list_users,
        user_handler::list_active_users,
        user_handler::get_user_by_email,
        user_handler::get_user,
        user_handler::get_active_user,
        user_handler::update_user,
        user_handler::delete_user,
        user_handler::deactivate_user,
    ),
    components(
        schemas(
            UserResponse,
            CreateUser,
            UpdateUser,
            ProblemResponse,
            app_handler::ApiInfo,
            health_handler::HealthResponse,
            health_handler::IndicatorStatus,
        )
    ),
    tags(
        (name = "App", description = "Welcome and API information"),
        (name = "Health", description = "Dependency health checks"),
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;
