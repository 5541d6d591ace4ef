//! Custom error types for the catalog service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;

/// Typed outcome of a book repository operation
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// No book with this id
    #[error("Book {0} not found")]
    NotFound(i64),

    /// Another book already holds this title
    #[error("Title already in use: {0}")]
    DuplicateTitle(String),

    /// Database error
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        RepositoryError::Database(DatabaseError::Query(err))
    }
}

/// Type alias for repository results
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Custom error type for the HTTP layer
#[derive(Error, Debug)]
pub enum ApiError {
    /// No authenticated principal
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated, but the access gate denied the request
    #[error("Forbidden")]
    Forbidden,

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => ApiError::NotFound(format!("Book {} not found", id)),
            RepositoryError::DuplicateTitle(_) => ApiError::BadRequest(err.to_string()),
            RepositoryError::Database(e) => ApiError::Database(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
