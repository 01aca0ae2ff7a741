use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{
    auth::{jwt::JwtKeys, repo_types::Identity, services::resolve_identity},
    error::AppError,
    state::AppState,
};

/// Gate for protected routes: verifies the bearer token and re-loads the
/// user on every request.
pub struct AuthUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        let keys = JwtKeys::from_ref(state);
        let identity = resolve_identity(state.users.as_ref(), &keys, header).await?;
        Ok(AuthUser(identity))
    }
}
