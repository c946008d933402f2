//! Application settings loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::constants::{
    DEFAULT_CORS_ORIGIN, DEFAULT_DATABASE_MAX_CONNECTIONS, DEFAULT_DATABASE_URL,
    DEFAULT_LOG_LEVEL, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, VALID_LOG_LEVELS,
};

/// Configuration loading errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set in production")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

impl ConfigError {
    fn invalid(name: &'static str, value: impl Into<String>) -> Self {
        ConfigError::Invalid {
            name,
            value: value.into(),
        }
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Test,
    Production,
}

impl AppEnv {
    pub fn is_development(&self) -> bool {
        matches!(self, AppEnv::Development)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, AppEnv::Production)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppEnv::Development => "development",
            AppEnv::Test => "test",
            AppEnv::Production => "production",
        }
    }
}

impl FromStr for AppEnv {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(AppEnv::Development),
            "test" => Ok(AppEnv::Test),
            "production" => Ok(AppEnv::Production),
            other => Err(ConfigError::invalid("APP_ENV", other)),
        }
    }
}

impl fmt::Display for AppEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cross-origin settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: String,
    pub server_host: String,
    pub server_port: u16,
    pub cors: CorsConfig,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("log_level", &self.log_level)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("cors", &self.cors)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_env: AppEnv::Development,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_env = match var("APP_ENV").or_else(|| var("NODE_ENV")) {
            Some(value) => value.parse()?,
            None => AppEnv::default(),
        };

        let database_url = match var("DATABASE_URL") {
            Some(url) if is_uri(&url) => url,
            Some(url) => return Err(ConfigError::invalid("DATABASE_URL", url)),
            None if app_env.is_production() => return Err(ConfigError::Missing("DATABASE_URL")),
            None => DEFAULT_DATABASE_URL.to_string(),
        };

        let log_level = var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        if !VALID_LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(ConfigError::invalid("LOG_LEVEL", log_level));
        }

        let server_port = match var("SERVER_PORT").or_else(|| var("PORT")) {
            Some(port) => port
                .parse()
                .map_err(|_| ConfigError::invalid("SERVER_PORT", port))?,
            None => DEFAULT_SERVER_PORT,
        };

        let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
            Some(max) => max
                .parse()
                .map_err(|_| ConfigError::invalid("DATABASE_MAX_CONNECTIONS", max))?,
            None => DEFAULT_DATABASE_MAX_CONNECTIONS,
        };

        Ok(Self {
            app_env,
            database_url,
            database_max_connections,
            log_level,
            server_host: var("SERVER_HOST").unwrap_or_else(|| DEFAULT_SERVER_HOST.to_string()),
            server_port,
            cors: CorsConfig {
                enabled: var("CORS_ENABLED").as_deref() == Some("true"),
                origin: var("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            },
        })
    }

    /// Tracing filter directive derived from `LOG_LEVEL`.
    pub fn tracing_filter(&self) -> &str {
        match self.log_level.as_str() {
            "fatal" => "error",
            "silent" => "off",
            other => other,
        }
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn is_uri(value: &str) -> bool {
    value
        .split_once("://")
        .is_some_and(|(scheme, rest)| !scheme.is_empty() && !rest.is_empty())
}
