use crate::modules::common::error_codes::INTERNAL_ERROR;
use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use sea_orm::DbErr;
use shared::{queue::QueueError, responses::ErrorBody};
use thiserror::Error;
use tracing::error;

/// Crate-wide error taxonomy, convertible from every backend error type this
/// service produces and mapped to the uniform `{error, message}` HTTP body.
///
/// Database and queue failures are logged at `error` level and never leak
/// their internals to the caller; every other variant carries its own
/// caller-facing message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Auth { code: &'static str, message: String },

    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{message}")]
    Validation { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Quota { message: String },

    #[error("database error: {0}")]
    Db(#[from] DbErr),

    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
}

impl ApiError {
    pub fn auth(code: &'static str, message: impl Into<String>) -> Self {
        Self::Auth { code, message: message.into() }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden { code, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: crate::modules::common::error_codes::VALIDATION_ERROR,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound { code, message: message.into() }
    }

    pub fn quota(message: impl Into<String>) -> Self {
        Self::Quota { message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Auth { code, .. } => (StatusCode::UNAUTHORIZED, *code),
            ApiError::Forbidden { code, .. } => (StatusCode::FORBIDDEN, *code),
            ApiError::Validation { code, .. } => (StatusCode::BAD_REQUEST, *code),
            ApiError::NotFound { code, .. } => (StatusCode::NOT_FOUND, *code),
            ApiError::Quota { .. } => (StatusCode::TOO_MANY_REQUESTS, "QUOTA_EXCEEDED"),
            ApiError::Db(err) => {
                error!(error = %err, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
            ApiError::Queue(err) => {
                error!(error = %err, "queue error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
        };

        let message = match &self {
            ApiError::Db(_) | ApiError::Queue(_) => String::from("internal server error"),
            other => other.to_string(),
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}
