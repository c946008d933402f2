//! Centralized error handling.
//!
//! Every handler failure is an [`AppError`]. Converting it into a response
//! only sets the status and attaches its [`Failure`] classification to the
//! response extensions. The problem-details middleware renders the body
//! with the request path and correlation id.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use thiserror::Error;

use crate::config::INTERNAL_SERVER_ERROR_TITLE;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    // Validation
    #[error("{message}")]
    Validation {
        message: String,
        errors: Option<Value>,
    },

    #[error("{0}")]
    BadRequest(String),

    /// Any other known failure with an explicit status.
    #[error("{message}")]
    Status {
        status: StatusCode,
        title: Option<String>,
        message: String,
        errors: Option<Value>,
    },

    // External service errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("{0}")]
    Internal(String),
}

/// Classification of a failure, as seen by the problem-details translator.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// A failure raised on purpose, carrying its own status and details.
    Known {
        status: StatusCode,
        title: String,
        detail: Option<String>,
        errors: Option<Value>,
    },
    /// Anything unexpected. Always rendered as a 500.
    Unknown { message: Option<String> },
}

impl Failure {
    pub fn status(&self) -> StatusCode {
        match self {
            Failure::Known { status, .. } => *status,
            Failure::Unknown { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Failure::Known { title, .. } => title,
            Failure::Unknown { .. } => INTERNAL_SERVER_ERROR_TITLE,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            Failure::Known { detail, .. } => detail.as_deref(),
            Failure::Unknown { message } => message.as_deref(),
        }
    }

    pub fn errors(&self) -> Option<&Value> {
        match self {
            Failure::Known { errors, .. } => errors.as_ref(),
            Failure::Unknown { .. } => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Failure::Unknown { .. })
    }

    /// Known failure from a bare status, titled with its canonical reason.
    pub fn from_status(status: StatusCode, detail: Option<String>) -> Self {
        Failure::Known {
            status,
            title: status
                .canonical_reason()
                .unwrap_or(INTERNAL_SERVER_ERROR_TITLE)
                .to_string(),
            detail,
            errors: None,
        }
    }
}

impl AppError {
    /// Get error kind name, used as title when the status has no reason phrase
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NotFoundException",
            AppError::Conflict(_) => "ConflictException",
            AppError::Validation { .. } => "ValidationException",
            AppError::BadRequest(_) => "BadRequestException",
            AppError::Status { .. } => "HttpException",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        self.failure().status()
    }

    /// Classify this error for rendering.
    pub fn failure(&self) -> Failure {
        let (status, title, errors) = match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, None, None),
            AppError::Conflict(_) => (StatusCode::CONFLICT, None, None),
            AppError::Validation { errors, .. } => (StatusCode::BAD_REQUEST, None, errors.clone()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, None, None),
            AppError::Status {
                status,
                title,
                errors,
                ..
            } => (*status, title.clone(), errors.clone()),
            AppError::Database(_) => {
                return Failure::Unknown {
                    message: Some("A database error occurred".to_string()),
                }
            }
            AppError::Internal(msg) => {
                return Failure::Unknown {
                    message: (!msg.is_empty()).then(|| msg.clone()),
                }
            }
        };

        let title = title.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or_else(|| self.code())
                .to_string()
        });

        Failure::Known {
            status,
            title,
            detail: Some(self.to_string()),
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Database(e) = &self {
            tracing::error!("Database error: {:?}", e);
        }

        let failure = self.failure();
        let mut response = failure.status().into_response();
        response.extensions_mut().insert(failure);
        response
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation {
            message: msg.into(),
            errors: None,
        }
    }

    pub fn validation_with(msg: impl Into<String>, errors: Value) -> Self {
        AppError::Validation {
            message: msg.into(),
            errors: Some(errors),
        }
    }

    pub fn with_status(status: StatusCode, msg: impl Into<String>) -> Self {
        AppError::Status {
            status,
            title: None,
            message: msg.into(),
            errors: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
