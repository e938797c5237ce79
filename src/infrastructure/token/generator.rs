//! Token secret generation
//!
//! Generates cryptographically secure token secrets and checks the format of
//! caller-supplied ones.

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::domain::token::TokenError;

/// Prefix shared by every token secret
pub const SECRET_PREFIX: &str = "sk-";

const SECRET_BYTES: usize = 32;
const MIN_CUSTOM_SECRET_LENGTH: usize = 8;

/// Generator for token secrets
#[derive(Debug, Clone, Default)]
pub struct TokenGenerator;

impl TokenGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new secret: `sk-` followed by 32 random bytes encoded as
    /// padded URL-safe base64.
    pub fn generate_secret(&self) -> Result<String, TokenError> {
        let mut random_bytes = [0u8; SECRET_BYTES];
        OsRng
            .try_fill_bytes(&mut random_bytes)
            .map_err(|e| TokenError::SecretGeneration(e.to_string()))?;

        Ok(format!("{}{}", SECRET_PREFIX, URL_SAFE.encode(random_bytes)))
    }

    /// Check a caller-supplied secret against the format policy.
    ///
    /// This never consults the store.
    pub fn validate_custom_format(&self, candidate: &str) -> Result<(), TokenError> {
        if candidate.chars().count() < MIN_CUSTOM_SECRET_LENGTH
            || !candidate.starts_with(SECRET_PREFIX)
        {
            return Err(TokenError::InvalidCustomToken);
        }

        Ok(())
    }
}
