use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::auth::policy::PolicyError;

/// State conflicts raised by the attendance ledger and the request workflow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("Already checked in today")]
    AlreadyCheckedIn,
    #[error("Already checked out today")]
    AlreadyCheckedOut,
    #[error("You haven't checked in today")]
    NotCheckedIn,
    #[error("Request has already been processed")]
    InvalidState,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Conflict(#[from] Conflict),
    #[error("No employee profile")]
    NoEmployeeRecord,
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Logs `err` and keeps only `context` for the response.
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!(error = %err, "{context}");
        AppError::Internal(context.to_string())
    }

    /// Machine-readable kind, as rendered in the `error` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Auth(_) => "auth_error",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(Conflict::AlreadyCheckedIn) => "already_checked_in",
            AppError::Conflict(Conflict::AlreadyCheckedOut) => "already_checked_out",
            AppError::Conflict(Conflict::NotCheckedIn) => "not_checked_in",
            AppError::Conflict(Conflict::InvalidState) => "invalid_state",
            AppError::NoEmployeeRecord => "no_employee_record",
            AppError::Policy(_) => "invalid_role",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
            other => {
                tracing::error!(error = %other, "Database error");
                AppError::StorageUnavailable(other.to_string())
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) | AppError::NoEmployeeRecord | AppError::Policy(_) => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Backend details stay in the logs.
        let message = match self {
            AppError::StorageUnavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Internal(_) => "Something went wrong, Contact with system admin".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "error": self.kind(),
            "message": message,
        }))
    }
}
