//! Per-request authentication filter.
//!
//! Runs once per inbound request as router-wide middleware. Public routes
//! bypass it; everything else gets token extraction, codec verification,
//! ledger and account checks, and finally an `AuthContext` attached to the
//! request. Only codec failures short-circuit with a 401 here; every other
//! non-identity condition forwards the request unauthenticated and leaves
//! the decision to the route's own authorization requirement. Ambiguity
//! never grants trust.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::context::AuthContext;
use crate::api::error::ErrorBody;
use crate::db::Database;
use crate::jwt::{JwtConfig, TokenError};

const BEARER_PREFIX: &str = "Bearer ";

/// Routes that never require authentication.
const PUBLIC_PREFIXES: &[&str] = &["/auth", "/health"];

/// Shared state for the authentication filter.
pub struct FilterState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

/// Authenticate one inbound request.
pub async fn authenticate_request(
    State(state): State<Arc<FilterState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return next.run(request).await;
    }

    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::to_string);
    let Some(token) = bearer else {
        // Missing header is not an error at this layer; protected routes
        // reject unauthenticated callers themselves.
        return next.run(request).await;
    };

    let claims = match state.jwt.verify(&token) {
        Ok(claims) => claims,
        Err(TokenError::Expired) => {
            return reject(&path, "Token expired");
        }
        Err(_) => {
            return reject(&path, "Invalid or malformed token");
        }
    };

    // Idempotency guard: an upstream layer already established identity.
    if request.extensions().get::<AuthContext>().is_some() || claims.sub.is_empty() {
        return next.run(request).await;
    }

    let record = match state.db.tokens().find_by_value(&token).await {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Ledger lookup failed; forwarding unauthenticated");
            return next.run(request).await;
        }
    };
    match record {
        Some(record) if !record.revoked && !record.expired => {}
        // Unknown, revoked, or superseded token: silently unauthenticated.
        _ => return next.run(request).await,
    }

    let user = match state.db.users().get_by_email(&claims.sub).await {
        Ok(user) => user,
        Err(e) => {
            warn!(error = %e, "Account lookup failed; forwarding unauthenticated");
            return next.run(request).await;
        }
    };
    let Some(user) = user else {
        return next.run(request).await;
    };

    // The decoded subject must match the resolved account. A mismatch means
    // the ledger and the signed payload disagree: fail closed.
    if claims.sub != user.email {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let context = AuthContext {
        subject: user.email,
        uuid: user.uuid,
        role: claims.role,
        authority: claims.role.authority().to_string(),
    };
    request.extensions_mut().insert(context);

    next.run(request).await
}

fn reject(path: &str, message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new(StatusCode::UNAUTHORIZED, message, path)),
    )
        .into_response()
}
