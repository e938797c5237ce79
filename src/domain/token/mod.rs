//! Token domain
//!
//! Access tokens authenticate callers of the gateway API. This module holds
//! the entity, the store contract, the error taxonomy and secret masking.

mod entity;
mod error;
mod mask;
mod repository;
mod validation;

pub use entity::{NewToken, Token, TokenId};
pub use error::TokenError;
pub use mask::mask;
#[cfg(test)]
pub use repository::MockTokenRepository;
pub use repository::TokenRepository;
pub use validation::{validate_token_name, TokenValidationError, MAX_TOKEN_NAME_LENGTH};
