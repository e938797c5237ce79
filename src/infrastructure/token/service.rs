//! Token service
//!
//! Provides the token lifecycle: creation with uniqueness checks, validation
//! for authentication, administration and deletion.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::domain::token::{
    mask, validate_token_name, NewToken, Token, TokenError, TokenId, TokenRepository,
};
use crate::domain::DomainError;

use super::generator::TokenGenerator;

/// Upper bound on generate-and-check attempts for a fresh secret
pub const MAX_GENERATION_ATTEMPTS: usize = 5;

/// Token service orchestrating the token store and the secret generator
pub struct TokenService {
    repository: Arc<dyn TokenRepository>,
    generator: TokenGenerator,
}

impl TokenService {
    /// Create a new token service
    pub fn new(repository: Arc<dyn TokenRepository>) -> Self {
        Self {
            repository,
            generator: TokenGenerator::new(),
        }
    }

    /// Create a new token.
    ///
    /// The name is stored trimmed. When `custom_secret` is empty or absent a
    /// random secret is generated. The returned record carries the cleartext
    /// secret; this is the only call that hands it out.
    pub async fn create_token(
        &self,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
        custom_secret: Option<&str>,
    ) -> Result<Token, TokenError> {
        if let Some(expires_at) = expires_at {
            if expires_at <= Utc::now() {
                return Err(TokenError::InvalidExpiresAt);
            }
        }

        let name = normalize_name(name)?;

        let secret = match custom_secret.filter(|s| !s.is_empty()) {
            Some(custom) => self.claim_custom_secret(custom).await?,
            None => self.generate_unique_secret().await?,
        };

        let new_token = NewToken::new(&name, &secret).with_expiration(expires_at);

        let created = self.repository.create(new_token).await.map_err(|e| {
            if e.is_conflict() {
                warn!(secret = %mask(&secret), "Token value taken concurrently");
                TokenError::TokenValueExists
            } else {
                TokenError::Store(e)
            }
        })?;

        info!(
            token_id = %created.id(),
            name = %created.name(),
            secret = %created.masked_secret(),
            "Token created"
        );

        Ok(created)
    }

    async fn claim_custom_secret(&self, custom: &str) -> Result<String, TokenError> {
        self.generator.validate_custom_format(custom)?;

        if self.repository.exists_by_secret(custom).await? {
            debug!(secret = %mask(custom), "Custom token value already exists");
            return Err(TokenError::TokenValueExists);
        }

        Ok(custom.to_string())
    }

    async fn generate_unique_secret(&self) -> Result<String, TokenError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let candidate = self.generator.generate_secret()?;

            if !self.repository.exists_by_secret(&candidate).await? {
                return Ok(candidate);
            }

            warn!(attempt, "Generated token value collided with an existing token");
        }

        Err(TokenError::TokenValueExists)
    }

    /// Validate a bearer secret.
    ///
    /// Checks run in a fixed order: existence, enabled flag, expiry.
    pub async fn validate_token(&self, secret: &str) -> Result<Token, TokenError> {
        let token = self
            .repository
            .find_by_secret(secret)
            .await?
            .ok_or(TokenError::InvalidToken)?;

        if !token.is_enabled() {
            debug!(token_id = %token.id(), "Token is disabled");
            return Err(TokenError::TokenDisabled);
        }

        if token.is_expired_at(Utc::now()) {
            debug!(token_id = %token.id(), "Token has expired");
            return Err(TokenError::TokenExpired);
        }

        Ok(token)
    }

    /// Get a token by id
    pub async fn get_token(&self, id: TokenId) -> Result<Token, TokenError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TokenError::TokenNotFound)
    }

    /// List all tokens, newest first
    pub async fn list_tokens(&self) -> Result<Vec<Token>, TokenError> {
        Ok(self.repository.find_all().await?)
    }

    /// Update the name and/or enabled flag of a token
    pub async fn update_token(
        &self,
        id: TokenId,
        name: Option<String>,
        enabled: Option<bool>,
    ) -> Result<Token, TokenError> {
        let name = name.as_deref().map(normalize_name).transpose()?;
        let mut token = self.get_token(id).await?;

        if let Some(name) = name {
            token.set_name(name);
        }

        if let Some(enabled) = enabled {
            token.set_enabled(enabled);
        }

        let updated = self.repository.update(&token).await.map_err(|e| match e {
            DomainError::NotFound { .. } => TokenError::TokenNotFound,
            other => TokenError::Store(other),
        })?;

        info!(token_id = %id, enabled = updated.is_enabled(), "Token updated");

        Ok(updated)
    }

    /// Cheap store round-trip used by readiness probes
    pub async fn check_store(&self) -> Result<(), TokenError> {
        self.repository.find_by_id(TokenId::new(0)).await?;
        Ok(())
    }

    /// Delete a token
    pub async fn delete_token(&self, id: TokenId) -> Result<(), TokenError> {
        if !self.repository.delete(id).await? {
            return Err(TokenError::TokenNotFound);
        }

        info!(token_id = %id, "Token deleted");
        Ok(())
    }
}

fn normalize_name(name: &str) -> Result<String, TokenError> {
    let name = name.trim();
    validate_token_name(name)?;
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::token::{MockTokenRepository, TokenValidationError};
    use crate::infrastructure::token::InMemoryTokenRepository;

    fn create_service() -> TokenService {
        TokenService::new(Arc::new(InMemoryTokenRepository::new()))
    }

    #[tokio::test]
    async fn test_create_generated_token() {
        let service = create_service();

        let token = service.create_token("CI pipeline", None, None).await.unwrap();

        assert!(token.secret().starts_with("sk-"));
        assert_eq!(token.secret().len(), 3 + 44);
        assert_eq!(token.name(), "CI pipeline");
        assert!(token.is_enabled());
        assert!(token.expires_at().is_none());
    }

    #[tokio::test]
    async fn test_create_with_future_expiry() {
        let service = create_service();
        let expires_at = Utc::now() + Duration::days(30);

        let token = service
            .create_token("expiring", Some(expires_at), None)
            .await
            .unwrap();

        assert_eq!(token.expires_at(), Some(expires_at));
    }

    #[tokio::test]
    async fn test_create_with_past_expiry_fails() {
        let service = create_service();
        let past = Utc::now() - Duration::minutes(1);

        let result = service.create_token("expired", Some(past), None).await;
        assert!(matches!(result, Err(TokenError::InvalidExpiresAt)));

        // Expiry is checked before the custom secret
        let result = service.create_token("expired", Some(past), Some("bad")).await;
        assert!(matches!(result, Err(TokenError::InvalidExpiresAt)));

        assert!(service.list_tokens().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_past_expiry_wins_over_invalid_name() {
        let service = create_service();
        let past = Utc::now() - Duration::hours(1);
        let long_name = "x".repeat(500);

        for name in ["", "   ", long_name.as_str()] {
            let result = service.create_token(name, Some(past), None).await;
            assert!(matches!(result, Err(TokenError::InvalidExpiresAt)));
        }
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_names() {
        let service = create_service();

        let result = service.create_token("", None, None).await;
        assert!(matches!(
            result,
            Err(TokenError::InvalidName(TokenValidationError::EmptyName))
        ));

        let result = service.create_token(&"x".repeat(500), None, None).await;
        assert!(matches!(
            result,
            Err(TokenError::InvalidName(TokenValidationError::NameTooLong(100)))
        ));

        assert!(service.list_tokens().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_name_is_trimmed_before_length_check() {
        let service = create_service();
        let padded = format!("     {}  ", "n".repeat(100));

        let token = service.create_token(&padded, None, None).await.unwrap();

        assert_eq!(token.name(), "n".repeat(100));
    }

    #[tokio::test]
    async fn test_create_with_custom_secret() {
        let service = create_service();

        let token = service
            .create_token("custom", None, Some("sk-my-custom-token"))
            .await
            .unwrap();

        assert_eq!(token.secret(), "sk-my-custom-token");
    }

    #[tokio::test]
    async fn test_empty_custom_secret_generates() {
        let service = create_service();

        let token = service.create_token("blank", None, Some("")).await.unwrap();

        assert!(token.secret().starts_with("sk-"));
        assert_eq!(token.secret().len(), 47);
    }

    #[tokio::test]
    async fn test_create_with_invalid_custom_secret() {
        let service = create_service();

        for candidate in ["sk-123", "pk-123456789", "abcdefghijkl"] {
            let result = service.create_token("custom", None, Some(candidate)).await;
            assert!(
                matches!(result, Err(TokenError::InvalidCustomToken)),
                "expected InvalidCustomToken for {candidate}"
            );
        }
    }

    #[tokio::test]
    async fn test_create_with_duplicate_custom_secret() {
        let service = create_service();

        let existing = service
            .create_token("first", None, Some("sk-duplicate-value"))
            .await
            .unwrap();

        let result = service
            .create_token("second", None, Some("sk-duplicate-value"))
            .await;
        assert!(matches!(result, Err(TokenError::TokenValueExists)));

        let unchanged = service.get_token(existing.id()).await.unwrap();
        assert_eq!(unchanged, existing);
        assert_eq!(service.list_tokens().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_secret_cannot_be_reused() {
        let service = create_service();

        let token = service
            .create_token("first", None, Some("sk-recycled-value"))
            .await
            .unwrap();
        service.delete_token(token.id()).await.unwrap();

        let result = service
            .create_token("second", None, Some("sk-recycled-value"))
            .await;
        assert!(matches!(result, Err(TokenError::TokenValueExists)));
    }

    #[tokio::test]
    async fn test_generation_gives_up_after_five_collisions() {
        let mut repo = MockTokenRepository::new();
        repo.expect_exists_by_secret()
            .times(MAX_GENERATION_ATTEMPTS)
            .returning(|_| Ok(true));
        repo.expect_create().never();

        let service = TokenService::new(Arc::new(repo));

        let result = service.create_token("unlucky", None, None).await;
        assert!(matches!(result, Err(TokenError::TokenValueExists)));
    }

    #[tokio::test]
    async fn test_generation_retries_until_free_value() {
        let mut repo = MockTokenRepository::new();
        let mut calls = 0;
        repo.expect_exists_by_secret().times(3).returning(move |_| {
            calls += 1;
            Ok(calls < 3)
        });
        repo.expect_create().times(1).returning(|new_token| {
            let now = Utc::now();
            Ok(Token::from_new(TokenId::new(9), new_token, now, now))
        });

        let service = TokenService::new(Arc::new(repo));

        let token = service.create_token("lucky", None, None).await.unwrap();
        assert_eq!(token.id(), TokenId::new(9));
    }

    #[tokio::test]
    async fn test_store_conflict_on_create_surfaces_as_value_exists() {
        let mut repo = MockTokenRepository::new();
        repo.expect_exists_by_secret().returning(|_| Ok(false));
        repo.expect_create()
            .times(1)
            .returning(|_| Err(DomainError::conflict("duplicate key value")));

        let service = TokenService::new(Arc::new(repo));

        let result = service.create_token("racer", None, None).await;
        assert!(matches!(result, Err(TokenError::TokenValueExists)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut repo = MockTokenRepository::new();
        repo.expect_find_by_secret()
            .returning(|_| Err(DomainError::storage("connection refused")));

        let service = TokenService::new(Arc::new(repo));

        let result = service.validate_token("sk-anything").await;
        match result {
            Err(TokenError::Store(DomainError::Storage { message })) => {
                assert_eq!(message, "connection refused")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_validate_token() {
        let service = create_service();
        let created = service.create_token("valid", None, None).await.unwrap();

        let validated = service.validate_token(created.secret()).await.unwrap();
        assert_eq!(validated.id(), created.id());
    }

    #[tokio::test]
    async fn test_validate_unknown_token() {
        let service = create_service();

        let result = service.validate_token("sk-doesnotexist").await;
        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_validate_disabled_token() {
        let service = create_service();
        let created = service.create_token("disabled", None, None).await.unwrap();

        service
            .update_token(created.id(), None, Some(false))
            .await
            .unwrap();

        let result = service.validate_token(created.secret()).await;
        assert!(matches!(result, Err(TokenError::TokenDisabled)));
    }

    #[tokio::test]
    async fn test_validate_disabled_and_expired_reports_disabled() {
        let mut repo = MockTokenRepository::new();
        repo.expect_find_by_secret().returning(|secret| {
            let created = Utc::now() - Duration::days(2);
            let new_token = NewToken::new("stale", secret)
                .with_expiration(Some(Utc::now() - Duration::days(1)));
            let mut token = Token::from_new(TokenId::new(3), new_token, created, created);
            token.set_enabled(false);
            Ok(Some(token))
        });

        let service = TokenService::new(Arc::new(repo));

        let result = service.validate_token("sk-stale-token").await;
        assert!(matches!(result, Err(TokenError::TokenDisabled)));
    }

    #[tokio::test]
    async fn test_validate_expired_token() {
        let mut repo = MockTokenRepository::new();
        repo.expect_find_by_secret().returning(|secret| {
            let created = Utc::now() - Duration::days(2);
            let new_token = NewToken::new("stale", secret)
                .with_expiration(Some(Utc::now() - Duration::seconds(1)));
            Ok(Some(Token::from_new(TokenId::new(4), new_token, created, created)))
        });

        let service = TokenService::new(Arc::new(repo));

        let result = service.validate_token("sk-stale-token").await;
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_get_missing_token() {
        let service = create_service();

        let result = service.get_token(TokenId::new(404)).await;
        assert!(matches!(result, Err(TokenError::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let service = create_service();

        let first = service.create_token("first", None, None).await.unwrap();
        let second = service.create_token("second", None, None).await.unwrap();

        let tokens = service.list_tokens().await.unwrap();
        let ids: Vec<TokenId> = tokens.iter().map(|t| t.id()).collect();
        assert_eq!(ids, vec![second.id(), first.id()]);
    }

    #[tokio::test]
    async fn test_update_token_name() {
        let service = create_service();
        let created = service.create_token("old", None, None).await.unwrap();

        let updated = service
            .update_token(created.id(), Some("new".to_string()), None)
            .await
            .unwrap();

        assert_eq!(updated.name(), "new");
        assert_eq!(updated.secret(), created.secret());
        assert!(updated.is_enabled());
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_name() {
        let service = create_service();
        let created = service.create_token("keep", None, None).await.unwrap();

        for name in ["  ".to_string(), "y".repeat(101)] {
            let result = service.update_token(created.id(), Some(name), None).await;
            assert!(matches!(result, Err(TokenError::InvalidName(_))));
        }

        let updated = service
            .update_token(created.id(), Some("  renamed ".to_string()), None)
            .await
            .unwrap();
        assert_eq!(updated.name(), "renamed");
    }

    #[tokio::test]
    async fn test_check_store() {
        assert!(create_service().check_store().await.is_ok());

        let mut repo = MockTokenRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .returning(|_| Err(DomainError::storage("connection refused")));
        repo.expect_find_all().never();

        let service = TokenService::new(Arc::new(repo));
        assert!(matches!(service.check_store().await, Err(TokenError::Store(_))));
    }

    #[tokio::test]
    async fn test_update_missing_token() {
        let service = create_service();

        let result = service.update_token(TokenId::new(1), None, Some(true)).await;
        assert!(matches!(result, Err(TokenError::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_delete_token() {
        let service = create_service();
        let created = service.create_token("doomed", None, None).await.unwrap();

        service.delete_token(created.id()).await.unwrap();

        assert!(matches!(
            service.get_token(created.id()).await,
            Err(TokenError::TokenNotFound)
        ));
        assert!(matches!(
            service.validate_token(created.secret()).await,
            Err(TokenError::InvalidToken)
        ));
        assert!(matches!(
            service.delete_token(created.id()).await,
            Err(TokenError::TokenNotFound)
        ));
    }
}
