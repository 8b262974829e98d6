//! API error taxonomy and status-code mapping
//!
//! Handlers return `Result<_, ApiError>`; the `IntoResponse` impl is the
//! single place where error kinds become HTTP status codes. Authentication
//! failures deliberately collapse into one generic 401 body so a caller
//! cannot distinguish a bad signature from an expired token or an unknown
//! subject.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

use crate::api::common::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing/invalid/expired token, or unknown token subject.
    #[error("Not authenticated")]
    Unauthorized,

    /// Bad login. Identical for unknown user and wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthorized | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(e) => {
                error!("database error: {e}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Internal(msg) => {
                error!("internal error: {msg}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Do not leak internals to the client.
        let message = match &self {
            ApiError::Database(_) => "Database operation failed".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = Json(ApiResponse::<()>::error(message));
        if matches!(self, ApiError::Unauthorized) {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}
