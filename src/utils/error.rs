//! Error types and handling
//!
//! Every failure a handler can produce is an [`AppError`]. Errors render to a
//! consistent JSON body with `success: false`, a machine-readable kind, a
//! human-readable message and, for validation failures, a field-keyed map.

use std::collections::BTreeMap;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Field-keyed validation messages (`"email" -> ["The email has already been taken."]`)
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Bad request - malformed body or multipart stream (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unauthorized - authentication required or failed (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Forbidden - authenticated but not entitled (403)
    #[error("{0}")]
    Forbidden(String),

    /// Conflict - duplicate request or occupied slot (409)
    #[error("{0}")]
    Conflict(String),

    /// Unprocessable entity - field-level validation failed (422)
    #[error("{message}")]
    ValidationFailed { message: String, errors: FieldErrors },

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error (500)
    #[error("Database error: {0}")]
    Database(String),

    /// Blob storage error (500)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AppError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::Internal(message.into())
    }

    /// Validation failure on a single field
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), vec![message.clone()]);
        AppError::ValidationFailed { message, errors }
    }

    /// Validation failure from an accumulated field map
    ///
    /// The top-level message is the first field message, like the mobile
    /// client expects.
    pub fn validation(errors: FieldErrors) -> Self {
        let message = errors
            .values()
            .flat_map(|msgs| msgs.first())
            .next()
            .cloned()
            .unwrap_or_else(|| "The given data was invalid.".to_string());
        AppError::ValidationFailed { message, errors }
    }

    fn status_and_kind(&self) -> (StatusCode, &'static str, bool) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", false),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", false),
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized", false),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden", true),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict", false),
            AppError::ValidationFailed { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", false)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", true),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error", true),
            AppError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error", true),
        }
    }
}

/// Error response body
#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level messages, present for validation failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            errors: None,
        }
    }

    /// Attach field errors
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, should_log) = self.status_and_kind();

        if should_log {
            error!(error = %self, error_type = error_type, "Request error");
        }

        let body = match self {
            AppError::ValidationFailed { message, errors } => {
                ErrorResponse::new(error_type, message).with_errors(errors)
            }
            // Internal details stay in the log
            AppError::Internal(_) | AppError::Database(_) | AppError::Storage(_) => {
                ErrorResponse::new(error_type, "Internal server error")
            }
            other => ErrorResponse::new(error_type, other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        // Repositories wrap sqlx errors in context; surface constraint conflicts
        if is_unique_violation(&err) {
            return AppError::Conflict("Resource already exists".to_string());
        }
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                if db_err.message().contains("UNIQUE constraint failed") {
                    AppError::Conflict("Resource already exists".to_string())
                } else {
                    AppError::Database(db_err.to_string())
                }
            }
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::validation(field_errors(&err))
    }
}

/// Whether a repository error was caused by a UNIQUE constraint
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE constraint failed")
    )
}

/// Flatten `validator` errors into the response field map
pub fn field_errors(err: &validator::ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errors) in err.field_errors() {
        let field = field.to_string();
        let messages = errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", field.replace('_', " ")))
            })
            .collect();
        out.insert(field, messages);
    }
    out
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
