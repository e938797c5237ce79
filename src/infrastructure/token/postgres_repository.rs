//! PostgreSQL token repository implementation
//!
//! Deleted tokens are soft deleted so their secrets stay covered by the
//! unique index on `value`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::token::{NewToken, Token, TokenId, TokenRepository};
use crate::domain::DomainError;

/// PostgreSQL implementation of TokenRepository
#[derive(Debug, Clone)]
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn create(&self, token: NewToken) -> Result<Token, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO tokens (name, value, enabled, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at, updated_at
            "#,
        )
        .bind(&token.name)
        .bind(&token.secret)
        .bind(token.enabled)
        .bind(token.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::conflict("Token value already exists")
            }
            other => DomainError::storage(format!("Failed to create token: {}", other)),
        })?;

        let id: i64 = row.try_get("id").map_err(row_error)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(row_error)?;

        Ok(Token::from_new(TokenId::new(id), token, created_at, updated_at))
    }

    async fn find_by_id(&self, id: TokenId) -> Result<Option<Token>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, value, enabled, expires_at, created_at, updated_at
            FROM tokens
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get token: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn find_by_secret(&self, secret: &str) -> Result<Option<Token>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, value, enabled, expires_at, created_at, updated_at
            FROM tokens
            WHERE value = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(secret)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get token by value: {}", e)))?;

        row.as_ref().map(row_to_token).transpose()
    }

    async fn find_all(&self) -> Result<Vec<Token>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, value, enabled, expires_at, created_at, updated_at
            FROM tokens
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to list tokens: {}", e)))?;

        rows.iter().map(row_to_token).collect()
    }

    async fn update(&self, token: &Token) -> Result<Token, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE tokens
            SET name = $2, enabled = $3, updated_at = $4
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, value, enabled, expires_at, created_at, updated_at
            "#,
        )
        .bind(token.id().value())
        .bind(token.name())
        .bind(token.is_enabled())
        .bind(token.updated_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update token: {}", e)))?;

        match row {
            Some(row) => row_to_token(&row),
            None => Err(DomainError::not_found(format!(
                "Token '{}' not found",
                token.id()
            ))),
        }
    }

    async fn delete(&self, id: TokenId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE tokens SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id.value())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to delete token: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_secret(&self, secret: &str) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tokens WHERE value = $1)")
            .bind(secret)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check token value: {}", e)))
    }
}

fn row_error(e: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to read token row: {}", e))
}

fn row_to_token(row: &PgRow) -> Result<Token, DomainError> {
    let id: i64 = row.try_get("id").map_err(row_error)?;
    let name: String = row.try_get("name").map_err(row_error)?;
    let secret: String = row.try_get("value").map_err(row_error)?;
    let enabled: bool = row.try_get("enabled").map_err(row_error)?;
    let expires_at: Option<DateTime<Utc>> = row.try_get("expires_at").map_err(row_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(row_error)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(row_error)?;

    let mut new_token = NewToken::new(name, secret).with_expiration(expires_at);
    new_token.enabled = enabled;

    Ok(Token::from_new(TokenId::new(id), new_token, created_at, updated_at))
}
