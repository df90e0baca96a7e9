use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::{User, UserRole};
use crate::error::ApiError;
use crate::state::AppState;

/// The protect step: bearer token -> verified claims -> live user ->
/// freshness check. Handlers that take `CurrentUser` only run for requests
/// that passed all four.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("you are not logged in, please log in to get access".into())
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("invalid authorization header".into())
        })?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token rejected");
            ApiError::Unauthorized("invalid or expired token".into())
        })?;

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| {
                ApiError::Unauthorized(
                    "the user belonging to this token no longer exists".into(),
                )
            })?;

        // A token signed before the last password change is stale.
        if user.changed_password_after(claims.iat) {
            return Err(ApiError::Unauthorized(
                "password was recently changed, please log in again".into(),
            ));
        }

        Ok(CurrentUser(user))
    }
}

/// Role gate; requires the protect step to have resolved the user already.
pub fn restrict_to(user: &User, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "you do not have permission to perform this action".into(),
        ))
    }
}
