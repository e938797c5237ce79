//! API error types
//!
//! Every error response has the shape
//! `{"error": {"code": "...", "message": "..."}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::token::TokenError;

/// Error codes returned to API callers
pub mod codes {
    pub const MISSING_AUTH_HEADER: &str = "MISSING_AUTH_HEADER";
    pub const INVALID_AUTH_FORMAT: &str = "INVALID_AUTH_FORMAT";
    pub const INVALID_TOKEN: &str = "INVALID_TOKEN";
    pub const TOKEN_DISABLED: &str = "TOKEN_DISABLED";
    pub const TOKEN_EXPIRED: &str = "TOKEN_EXPIRED";
    pub const AUTH_ERROR: &str = "AUTH_ERROR";

    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const INVALID_EXPIRES_AT: &str = "INVALID_EXPIRES_AT";
    pub const INVALID_CUSTOM_TOKEN: &str = "INVALID_CUSTOM_TOKEN";
    pub const TOKEN_VALUE_EXISTS: &str = "TOKEN_VALUE_EXISTS";
    pub const TOKEN_NOT_FOUND: &str = "TOKEN_NOT_FOUND";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ApiErrorResponse,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            response: ApiErrorResponse {
                error: ApiErrorDetail {
                    code: code.into(),
                    message: message.into(),
                },
            },
        }
    }

    pub fn code(&self) -> &str {
        &self.response.error.code
    }

    /// Bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_REQUEST, message)
    }

    /// Authentication error
    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// Not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message)
    }

    /// Internal server error; the message never carries error details
    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::INTERNAL_ERROR,
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let message = err.to_string();

        match err {
            TokenError::InvalidExpiresAt => {
                Self::new(StatusCode::BAD_REQUEST, codes::INVALID_EXPIRES_AT, message)
            }
            TokenError::InvalidName(_) => Self::bad_request(message),
            TokenError::InvalidCustomToken => {
                Self::new(StatusCode::BAD_REQUEST, codes::INVALID_CUSTOM_TOKEN, message)
            }
            TokenError::TokenValueExists => {
                Self::new(StatusCode::CONFLICT, codes::TOKEN_VALUE_EXISTS, message)
            }
            TokenError::TokenNotFound => {
                Self::new(StatusCode::NOT_FOUND, codes::TOKEN_NOT_FOUND, message)
            }
            TokenError::InvalidToken => Self::unauthorized(codes::INVALID_TOKEN, message),
            TokenError::TokenDisabled => Self::unauthorized(codes::TOKEN_DISABLED, message),
            TokenError::TokenExpired => Self::unauthorized(codes::TOKEN_EXPIRED, message),
            TokenError::SecretGeneration(_) | TokenError::Store(_) => {
                error!(error = %message, "Token operation failed");
                Self::internal()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.response.error.code, self.response.error.message
        )
    }
}

impl std::error::Error for ApiError {}
