use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::claims::TokenIdentity;
use crate::{error::AuthError, state::AppState};

/// Bearer-token identity of the caller.
pub struct AuthUser(pub TokenIdentity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Read Authorization header
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                warn!("missing Authorization header");
                AuthError::TokenInvalid
            })?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| {
                warn!("invalid auth scheme");
                AuthError::TokenInvalid
            })?;

        let identity = state.auth.authenticate(token.trim())?;
        Ok(AuthUser(identity))
    }
}
