//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{Database, DatabaseHealth, UserStore};
use crate::services::{UserManager, UserService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// User use cases
    pub user_service: Arc<dyn UserService>,
    /// Database liveness probe
    pub database: Arc<dyn DatabaseHealth>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the SeaORM-backed services on top of an open connection.
    pub fn from_database(database: Database, config: Config) -> Self {
        let repo = Arc::new(UserStore::new(database.get_connection()));

        Self {
            user_service: Arc::new(UserManager::new(repo)),
            database: Arc::new(database),
            config: Arc::new(config),
        }
    }

    /// Create state with manually injected services.
    pub fn new(
        user_service: Arc<dyn UserService>,
        database: Arc<dyn DatabaseHealth>,
        config: Config,
    ) -> Self {
        Self {
            user_service,
            database,
            config: Arc::new(config),
        }
    }
}
