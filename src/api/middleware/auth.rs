//! Bearer token authentication middleware

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::{codes, ApiError};
use crate::domain::token::{mask, Token, TokenError, TokenId};

const BEARER_SCHEME: &str = "Bearer";

/// Identity attached to a request once its bearer token has been validated
#[derive(Debug, Clone)]
pub struct AuthenticatedToken {
    pub token_id: TokenId,
    pub token: Token,
}

/// Reasons a protected request is turned away
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Invalid authorization header format. Expected 'Bearer <token>'")]
    InvalidAuthFormat,

    #[error(transparent)]
    Token(#[from] TokenError),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingAuthHeader => codes::MISSING_AUTH_HEADER,
            Self::InvalidAuthFormat => codes::INVALID_AUTH_FORMAT,
            Self::Token(TokenError::InvalidToken) => codes::INVALID_TOKEN,
            Self::Token(TokenError::TokenDisabled) => codes::TOKEN_DISABLED,
            Self::Token(TokenError::TokenExpired) => codes::TOKEN_EXPIRED,
            Self::Token(_) => codes::AUTH_ERROR,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.code();

        match err {
            AuthError::Token(inner) if inner.is_internal() => {
                error!(error = %inner, "Token validation failed");
                ApiError::unauthorized(code, "Authentication failed")
            }
            other => ApiError::unauthorized(code, other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Pull the credential out of an `Authorization: Bearer <secret>` header.
///
/// The value is split on its first space into exactly two parts; the first
/// must be the `Bearer` scheme and the second must be non-empty once trimmed.
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) if !value.is_empty() => value,
        _ => return Err(AuthError::MissingAuthHeader),
    };

    let value = value.to_str().map_err(|_| AuthError::InvalidAuthFormat)?;

    parse_bearer(value)
}

fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let (scheme, credential) = value.split_once(' ').ok_or(AuthError::InvalidAuthFormat)?;

    let credential = credential.trim();

    if scheme != BEARER_SCHEME || credential.is_empty() {
        return Err(AuthError::InvalidAuthFormat);
    }

    Ok(credential)
}

/// Middleware guarding protected routes.
///
/// On success the validated token is stored in the request extensions as an
/// [`AuthenticatedToken`]; any rejection short-circuits with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let secret = extract_bearer_token(request.headers())?;

    debug!(token = %mask(secret), "Validating bearer token");

    let token = state.token_service.validate_token(secret).await?;

    request.extensions_mut().insert(AuthenticatedToken {
        token_id: token.id(),
        token,
    });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedToken>()
            .cloned()
            .ok_or_else(|| {
                ApiError::unauthorized(codes::MISSING_AUTH_HEADER, "Authentication required")
            })
    }
}
