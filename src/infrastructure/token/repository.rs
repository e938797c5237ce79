//! In-memory token repository implementation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::token::{NewToken, Token, TokenId, TokenRepository};
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    tokens: HashMap<TokenId, Token>,
    secret_index: HashMap<String, TokenId>,
    /// Secrets of deleted tokens; they are never issued again
    retired_secrets: HashSet<String>,
}

/// In-memory implementation of TokenRepository
#[derive(Debug, Default)]
pub struct InMemoryTokenRepository {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryTokenRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: NewToken) -> Result<Token, DomainError> {
        let mut inner = self.inner.write().await;

        if inner.secret_index.contains_key(&token.secret)
            || inner.retired_secrets.contains(&token.secret)
        {
            return Err(DomainError::conflict("Token value already exists"));
        }

        inner.next_id += 1;
        let id = TokenId::new(inner.next_id);
        let now = Utc::now();
        let created = Token::from_new(id, token, now, now);

        inner.secret_index.insert(created.secret().to_string(), id);
        inner.tokens.insert(id, created.clone());

        Ok(created)
    }

    async fn find_by_id(&self, id: TokenId) -> Result<Option<Token>, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.tokens.get(&id).cloned())
    }

    async fn find_by_secret(&self, secret: &str) -> Result<Option<Token>, DomainError> {
        let inner = self.inner.read().await;

        Ok(inner
            .secret_index
            .get(secret)
            .and_then(|id| inner.tokens.get(id))
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Token>, DomainError> {
        let inner = self.inner.read().await;

        let mut tokens: Vec<Token> = inner.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });

        Ok(tokens)
    }

    async fn update(&self, token: &Token) -> Result<Token, DomainError> {
        let mut inner = self.inner.write().await;

        let stored = inner
            .tokens
            .get_mut(&token.id())
            .ok_or_else(|| DomainError::not_found(format!("Token '{}' not found", token.id())))?;

        if stored.secret() != token.secret() {
            return Err(DomainError::validation("Token value is immutable"));
        }

        *stored = token.clone();
        Ok(token.clone())
    }

    async fn delete(&self, id: TokenId) -> Result<bool, DomainError> {
        let mut inner = self.inner.write().await;

        match inner.tokens.remove(&id) {
            Some(token) => {
                inner.secret_index.remove(token.secret());
                inner.retired_secrets.insert(token.secret().to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exists_by_secret(&self, secret: &str) -> Result<bool, DomainError> {
        let inner = self.inner.read().await;
        Ok(inner.secret_index.contains_key(secret) || inner.retired_secrets.contains(secret))
    }
}
