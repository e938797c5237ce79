//! Token input validation utilities

use thiserror::Error;

/// Errors that can occur while validating token input
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TokenValidationError {
    #[error("Token name cannot be empty")]
    EmptyName,

    #[error("Token name exceeds maximum length of {0} characters")]
    NameTooLong(usize),
}

pub const MAX_TOKEN_NAME_LENGTH: usize = 100;

/// Validate a token name
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - Maximum 100 characters
pub fn validate_token_name(name: &str) -> Result<(), TokenValidationError> {
    if name.trim().is_empty() {
        return Err(TokenValidationError::EmptyName);
    }

    if name.chars().count() > MAX_TOKEN_NAME_LENGTH {
        return Err(TokenValidationError::NameTooLong(MAX_TOKEN_NAME_LENGTH));
    }

    Ok(())
}
