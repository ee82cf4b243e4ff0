use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::models::ErrorResponse;
use crate::repository::RepoError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{error}: {message}")]
    BadRequest { error: &'static str, message: &'static str },
    #[error("unsupported content type")]
    UnsupportedMediaType,
    #[error("employee not found")]
    NotFound,
    #[error("duplicate employee")]
    Conflict,
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("storage error: {0}")]
    Storage(#[source] RepoError),
}

impl AppError {
    pub fn invalid_id() -> Self {
        AppError::BadRequest {
            error: "Invalid ID",
            message: "Employee ID must be a positive integer",
        }
    }

    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::BadRequest { error, message } => (StatusCode::BAD_REQUEST, *error, *message),
            AppError::UnsupportedMediaType => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Invalid content type",
                "Content-Type must be application/json",
            ),
            AppError::NotFound => (StatusCode::NOT_FOUND, "Employee not found", "Employee not found"),
            AppError::Conflict => (
                StatusCode::CONFLICT,
                "Duplicate employee",
                "An employee with this email or phone already exists",
            ),
            AppError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded",
                "Too many requests. Please try again later.",
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error",
                "Failed to process the request",
            ),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Duplicate => AppError::Conflict,
            other => AppError::Storage(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::UnsupportedMediaType,
            _ => AppError::BadRequest {
                error: "Invalid JSON format",
                message: "Request body must be valid JSON",
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Storage(e) = &self {
            // details stay in the log
            tracing::error!("Database error: {}", e);
        }

        let (status, error, message) = self.parts();
        let body = ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
