//! Identity of the calling token

use crate::api::admin::tokens::TokenResponse;
use crate::api::middleware::AuthenticatedToken;
use crate::api::types::Json;

/// GET /v1/me
pub async fn get_me(auth: AuthenticatedToken) -> Json<TokenResponse> {
    Json(TokenResponse::from(&auth.token))
}
