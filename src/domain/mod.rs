//! Domain layer - Core business entities and logic
//!
//! Types here know nothing about HTTP or the database.

pub mod password;
pub mod user;

pub use password::Password;
pub use user::{CreateUser, NewUser, UpdateUser, User, UserChanges, UserResponse};
