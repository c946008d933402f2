//! Application services layer - Use cases and business logic.
//!
//! Services depend on repository traits, never on SeaORM directly.

mod user_service;

pub use user_service::{UserManager, UserService};
