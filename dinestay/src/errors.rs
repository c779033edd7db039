use crate::db::errors::DbError;
use crate::media::MediaError;
use crate::query::QueryError;
use crate::types::Role;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

pub const LOGIN_REQUIRED: &str = "Please Login to access this resource";

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided, or the session token is invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated, but the role is not allowed on this route
    #[error("Role: {role} is not allowed to access this resource")]
    RoleNotAllowed { role: Role },

    /// Authenticated, but not permitted to act on this particular entity
    #[error("{message}")]
    Forbidden { message: String },

    /// Invalid request data, e.g. malformed ids or query parameters
    #[error("{message}")]
    BadRequest { message: String },

    /// Request body failed validation
    #[error("{message}")]
    Validation { message: String },

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Concurrent writes kept winning over this request
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Media host failure
    #[error(transparent)]
    Media(#[from] MediaError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Error for a path or query id that is not a valid resource id
    pub fn invalid_id() -> Self {
        Error::BadRequest {
            message: "Resource not found. Invalid: _id".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::RoleNotAllowed { .. } | Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::BadRequest { .. } | Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::Media(MediaError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Media(_) => StatusCode::BAD_GATEWAY,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::StaleVersion | DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| LOGIN_REQUIRED.to_string()),
            Error::RoleNotAllowed { role } => format!("Role: {role} is not allowed to access this resource"),
            Error::Forbidden { message } | Error::BadRequest { message } | Error::Validation { message } => message.clone(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::Conflict { message } => message.clone(),
            Error::Media(media_err) => match media_err {
                MediaError::Config(_) => "Internal server error".to_string(),
                e if e.is_removal() => "Image removal failed".to_string(),
                _ => "Image upload failed".to_string(),
            },
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::StaleVersion => "Resource was modified concurrently, please retry".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) | Error::Media(MediaError::Config(_)) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Media(_) => {
                tracing::warn!("Media host error: {}", self);
            }
            Error::Unauthenticated { .. } | Error::RoleNotAllowed { .. } | Error::Forbidden { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
            Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
        }

        let body = json!({
            "success": false,
            "message": self.user_message(),
        });

        (self.status_code(), Json(body)).into_response()
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::BadRequest { message: err.to_string() }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
