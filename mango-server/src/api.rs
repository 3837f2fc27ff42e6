//! Mapping from vault and validation errors onto HTTP responses.

use crate::validate::ValidationError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use mango_vault::{ErrorKind, VaultError};
use thiserror::Error;
use tracing::{error, warn};

pub type ApiResult<T> = Result<T, ApiError>;

/// An error as the client sees it. Messages are plain text and never carry
/// backend details.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request body")]
    InvalidBody,

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Missing site in URL path")]
    MissingSite,

    #[error("Credentials not found")]
    NotFound,

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody | ApiError::Validation(_) | ApiError::MissingSite => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<VaultError> for ApiError {
    fn from(err: VaultError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => ApiError::NotFound,
            ErrorKind::Timeout => {
                warn!(error = %err, "vault operation timed out");
                ApiError::Timeout
            }
            ErrorKind::Internal => {
                error!(error = %err, "vault operation failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}
