//! Token repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{NewToken, Token, TokenId};
use crate::domain::DomainError;

/// Durable storage for token records
///
/// Implementations must enforce uniqueness of the secret and report a
/// violation as `DomainError::Conflict`. Deleted secrets stay reserved.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a new token; the store assigns id and timestamps
    async fn create(&self, token: NewToken) -> Result<Token, DomainError>;

    /// Find an active token by id
    async fn find_by_id(&self, id: TokenId) -> Result<Option<Token>, DomainError>;

    /// Find an active token by its secret
    async fn find_by_secret(&self, secret: &str) -> Result<Option<Token>, DomainError>;

    /// All active tokens, newest first
    async fn find_all(&self) -> Result<Vec<Token>, DomainError>;

    /// Update mutable fields of an existing token
    async fn update(&self, token: &Token) -> Result<Token, DomainError>;

    /// Remove a token from the active set; returns false when absent
    async fn delete(&self, id: TokenId) -> Result<bool, DomainError>;

    /// Whether the secret has ever been issued, including deleted tokens
    async fn exists_by_secret(&self, secret: &str) -> Result<bool, DomainError>;
}
