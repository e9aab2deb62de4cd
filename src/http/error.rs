//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::scheduling::SchedulingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Scheduling engine error
    Scheduling(SchedulingError),
    /// Repository error
    Repository(RepositoryError),
}

fn repository_response(e: &RepositoryError) -> (StatusCode, ApiError) {
    match e {
        RepositoryError::NotFound { .. } => {
            (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", e.to_string()))
        }
        RepositoryError::ValidationError { .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("VALIDATION_ERROR", e.to_string()),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::new("REPOSITORY_ERROR", e.to_string()),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", msg),
            ),
            AppError::Scheduling(e) => match &e {
                SchedulingError::CapacityExhausted { .. } => (
                    StatusCode::CONFLICT,
                    ApiError::new("CAPACITY_EXHAUSTED", e.to_string()),
                ),
                SchedulingError::SessionFull { .. } => (
                    StatusCode::CONFLICT,
                    ApiError::new("SESSION_FULL", e.to_string()),
                ),
                SchedulingError::InvalidCapacity { .. } => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_CAPACITY", e.to_string()),
                ),
                SchedulingError::InvalidTimeSlot(_) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("INVALID_TIME_SLOT", e.to_string()),
                ),
                SchedulingError::Repository(inner) => repository_response(inner),
            },
            AppError::Repository(e) => repository_response(&e),
        };

        (status, Json(error)).into_response()
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError::Scheduling(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
