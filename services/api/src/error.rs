//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how it is
//! turned into an HTTP response.

use crate::config::ConfigError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use store_locator_core::ports::PortError;
use store_locator_core::validation::{FieldError, ValidationError};
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Input failed write-time validation.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was malformed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Credentials were missing or wrong.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl From<FieldError> for ApiError {
    fn from(field: FieldError) -> Self {
        Self::Validation(field.into())
    }
}

/// JSON body sent with every error response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldErrorBody>,
}

#[derive(Serialize)]
struct FieldErrorBody {
    field: String,
    message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Port(PortError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Port(PortError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Port(PortError::Unauthorized) | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Port(PortError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Port(PortError::Unexpected(_))
            | Self::Config(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Don't expose internal error details to clients
        let body = match self {
            Self::Validation(err) => ErrorBody {
                error: "Validation failed".to_string(),
                fields: err
                    .fields
                    .into_iter()
                    .map(|f| FieldErrorBody {
                        field: f.field,
                        message: f.message,
                    })
                    .collect(),
            },
            Self::Port(PortError::NotFound(msg)) | Self::Port(PortError::Conflict(msg)) => {
                ErrorBody {
                    error: msg,
                    fields: Vec::new(),
                }
            }
            Self::Port(PortError::Forbidden(msg))
            | Self::BadRequest(msg)
            | Self::Unauthorized(msg) => ErrorBody {
                error: msg,
                fields: Vec::new(),
            },
            Self::Port(PortError::Unauthorized) => ErrorBody {
                error: "Unauthorized".to_string(),
                fields: Vec::new(),
            },
            other => {
                error!(error = %other, "Request failed");
                ErrorBody {
                    error: "Internal server error".to_string(),
                    fields: Vec::new(),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
