mod auth;
pub mod error;
mod users;

use std::sync::Arc;

use axum::{Json, Router, http::StatusCode, response::IntoResponse, routing::get};

use crate::auth::AuthGateway;
use crate::db::Database;

/// Create the API router: authentication endpoints plus the routes that
/// consume the authorization context.
pub fn create_api_router(db: Database, gateway: Arc<AuthGateway>) -> Router {
    let auth_state = auth::AuthApiState { gateway };
    let users_state = users::UsersApiState { db };

    Router::new()
        .nest("/auth", auth::router(auth_state))
        .route("/health", get(health))
        .merge(users::router(users_state))
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
