//! Infrastructure layer - Database connection, migrations and repositories

pub mod db;
pub mod repositories;

pub use db::{Database, DatabaseHealth, Migrator};
pub use repositories::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use db::MockDatabaseHealth;
#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
