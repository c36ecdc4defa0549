//! Request-scoped authorization context.
//!
//! The authentication filter attaches an `AuthContext` to the request
//! extensions; route handlers consume it through extractors. There is no
//! process-wide authentication state.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::api::error::ApiError;
use crate::db::UserRole;

/// Identity and authority established by the authentication filter.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Account email the verified token was issued for
    pub subject: String,
    /// Account uuid
    pub uuid: String,
    /// Role claim from the verified payload
    pub role: UserRole,
    /// Authority token, `ROLE_<role>`
    pub authority: String,
}

/// Extractor for routes that require an authenticated caller.
/// Rejects with 401 when the filter established no context.
pub struct RequireAuth(pub AuthContext);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .map(RequireAuth)
            .ok_or_else(|| ApiError::unauthorized("Not authenticated", parts.uri.path()))
    }
}

/// Extractor for routes restricted to the admin authority.
/// Rejects with 401 when unauthenticated and 403 for any other authority.
pub struct AdminOnly(pub AuthContext);

impl<S> FromRequestParts<S> for AdminOnly
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAuth(ctx) = RequireAuth::from_request_parts(parts, state).await?;

        if ctx.authority != "ROLE_ADMIN" {
            return Err(ApiError::forbidden("Access denied", parts.uri.path()));
        }

        Ok(AdminOnly(ctx))
    }
}
