//! Token management admin endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::token::{Token, TokenError, TokenId};

/// Request to create a new token
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTokenRequest {
    pub name: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Caller-chosen secret; generated when absent or empty
    #[serde(default)]
    pub token: Option<String>,
}

/// Request to update a token
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTokenRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Token as rendered to administrators; the secret is always masked
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub id: TokenId,
    pub name: String,
    pub token: String,
    pub enabled: bool,
    pub expires_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id(),
            name: token.name().to_string(),
            token: token.masked_secret(),
            enabled: token.is_enabled(),
            expires_at: token.expires_at().map(|dt| dt.to_rfc3339()),
            created_at: token.created_at().to_rfc3339(),
            updated_at: token.updated_at().to_rfc3339(),
        }
    }
}

/// Creation response, the only one carrying the cleartext secret
#[derive(Debug, Clone, Serialize)]
pub struct CreatedTokenResponse {
    #[serde(flatten)]
    pub token: TokenResponse,
    pub secret: String,
}

impl From<&Token> for CreatedTokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            token: TokenResponse::from(token),
            secret: token.secret().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListTokensResponse {
    pub tokens: Vec<TokenResponse>,
    pub total: usize,
}

/// Ids that do not parse cannot name an existing token
fn parse_token_id(raw: &str) -> Result<TokenId, ApiError> {
    raw.parse::<TokenId>()
        .map_err(|_| ApiError::from(TokenError::TokenNotFound))
}

/// GET /admin/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
) -> Result<Json<ListTokensResponse>, ApiError> {
    debug!("Admin listing tokens");

    let tokens = state.token_service.list_tokens().await?;
    let tokens: Vec<TokenResponse> = tokens.iter().map(TokenResponse::from).collect();
    let total = tokens.len();

    Ok(Json(ListTokensResponse { tokens, total }))
}

/// POST /admin/tokens
pub async fn create_token(
    State(state): State<AppState>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(name = %request.name, "Admin creating token");

    let token = state
        .token_service
        .create_token(&request.name, request.expires_at, request.token.as_deref())
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedTokenResponse::from(&token))))
}

/// GET /admin/tokens/:token_id
pub async fn get_token(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    debug!(token_id = %token_id, "Admin getting token");

    let id = parse_token_id(&token_id)?;
    let token = state.token_service.get_token(id).await?;

    Ok(Json(TokenResponse::from(&token)))
}

/// PATCH /admin/tokens/:token_id
pub async fn update_token(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
    Json(request): Json<UpdateTokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    debug!(token_id = %token_id, "Admin updating token");

    let id = parse_token_id(&token_id)?;

    let token = state
        .token_service
        .update_token(id, request.name, request.enabled)
        .await?;

    Ok(Json(TokenResponse::from(&token)))
}

/// DELETE /admin/tokens/:token_id
pub async fn delete_token(
    State(state): State<AppState>,
    Path(token_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(token_id = %token_id, "Admin deleting token");

    let id = parse_token_id(&token_id)?;
    state.token_service.delete_token(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::token::NewToken;

    fn sample_token() -> Token {
        let now = Utc::now();
        Token::from_new(
            TokenId::new(7),
            NewToken::new("ci", "sk-abcdefghijklmnopqrstuvwxyz"),
            now,
            now,
        )
    }

    #[test]
    fn test_token_response_masks_secret() {
        let response = TokenResponse::from(&sample_token());

        assert_eq!(response.token, "sk-****wxyz");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("abcdefghijklmnop"));
        assert!(json.contains("\"id\":7"));
    }

    #[test]
    fn test_created_response_carries_secret() {
        let response = CreatedTokenResponse::from(&sample_token());
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["secret"], "sk-abcdefghijklmnopqrstuvwxyz");
        assert_eq!(json["token"], "sk-****wxyz");
        assert_eq!(json["name"], "ci");
    }

    #[test]
    fn test_parse_token_id() {
        assert_eq!(parse_token_id("42").unwrap(), TokenId::new(42));

        let err = parse_token_id("abc").unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
