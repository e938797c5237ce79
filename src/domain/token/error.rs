//! Token service error taxonomy

use thiserror::Error;

use crate::domain::DomainError;

use super::validation::TokenValidationError;

/// Errors returned by token lifecycle operations
///
/// Every caller-correctable condition has its own variant. Store and random
/// source failures are carried as-is and treated as internal errors.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Expiration time must be in the future")]
    InvalidExpiresAt,

    #[error(transparent)]
    InvalidName(#[from] TokenValidationError),

    #[error("Custom token must be at least 8 characters and start with 'sk-'")]
    InvalidCustomToken,

    #[error("Token value already exists")]
    TokenValueExists,

    #[error("Token not found")]
    TokenNotFound,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token is disabled")]
    TokenDisabled,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Failed to generate token secret: {0}")]
    SecretGeneration(String),

    #[error(transparent)]
    Store(#[from] DomainError),
}

impl TokenError {
    /// Whether the error is an internal failure rather than a caller mistake
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::SecretGeneration(_) | Self::Store(_))
    }
}
