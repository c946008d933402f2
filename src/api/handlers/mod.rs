//! HTTP request handlers.

pub mod app_handler;
pub mod health_handler;
pub mod user_handler;

pub use app_handler::{app_routes, not_found};
pub use health_handler::health_routes;
pub use user_handler::user_routes;
