//! Identity and admin endpoints.
//!
//! These consume the authorization context established by the filter;
//! role enforcement (403) happens here, never in the filter itself.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use super::error::{ApiError, ResultPathExt};
use crate::auth::{AdminOnly, RequireAuth};
use crate::db::{Database, UserRole, UserSummary};

#[derive(Clone)]
pub struct UsersApiState {
    pub db: Database,
}

pub fn router(state: UsersApiState) -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/admin/users", get(list_users))
        .with_state(state)
}

#[derive(Serialize)]
struct MeResponse {
    uuid: String,
    email: String,
    role: UserRole,
    authority: String,
}

/// Echo the identity established by the authentication filter.
async fn me(RequireAuth(ctx): RequireAuth) -> impl IntoResponse {
    Json(MeResponse {
        uuid: ctx.uuid,
        email: ctx.subject,
        role: ctx.role,
        authority: ctx.authority,
    })
}

#[derive(Serialize)]
struct ListUsersResponse {
    users: Vec<UserSummary>,
}

/// List account summaries. Admin authority only.
async fn list_users(
    State(state): State<UsersApiState>,
    AdminOnly(_ctx): AdminOnly,
) -> Result<impl IntoResponse, ApiError> {
    let users = state
        .db
        .users()
        .list()
        .await
        .db_err("Failed to list accounts", "/admin/users")?;

    Ok((StatusCode::OK, Json(ListUsersResponse { users })))
}
