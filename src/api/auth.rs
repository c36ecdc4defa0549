//! Authentication endpoints.
//!
//! - POST `/register` - Create an account and issue the first token pair
//! - POST `/login` - Verify credentials, supersede prior tokens, issue anew
//! - POST `/refresh` - Exchange a refresh token for a new access token
//! - POST `/logout` - Revoke the presented access token

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{OriginalUri, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::auth::AuthGateway;

#[derive(Clone)]
pub struct AuthApiState {
    pub gateway: Arc<AuthGateway>,
}

pub fn router(state: AuthApiState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .with_state(state)
}

#[derive(Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Small status object returned by logout.
#[derive(Serialize)]
struct StatusBody {
    timestamp: i64,
    status: u16,
    error: &'static str,
    message: &'static str,
    path: String,
}

async fn register(
    State(state): State<AuthApiState>,
    OriginalUri(uri): OriginalUri,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();

    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(
            "Email and password are required",
            uri.path(),
        ));
    }

    let pair = state
        .gateway
        .register(email, &payload.password)
        .await
        .map_err(|e| ApiError::from_auth(e, uri.path()))?;

    Ok((StatusCode::CREATED, Json(pair)))
}

async fn login(
    State(state): State<AuthApiState>,
    OriginalUri(uri): OriginalUri,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state
        .gateway
        .login(payload.email.trim(), &payload.password)
        .await
        .map_err(|e| ApiError::from_auth(e, uri.path()))?;

    Ok((StatusCode::OK, Json(pair)))
}

async fn refresh(
    State(state): State<AuthApiState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let pair = state
        .gateway
        .refresh(auth_header)
        .await
        .map_err(|e| ApiError::from_auth(e, uri.path()))?;

    Ok((StatusCode::OK, Json(pair)))
}

async fn logout(
    State(state): State<AuthApiState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    state
        .gateway
        .logout(auth_header)
        .await
        .map_err(|e| ApiError::from_auth(e, uri.path()))?;

    Ok((
        StatusCode::OK,
        Json(StatusBody {
            timestamp: chrono::Utc::now().timestamp_millis(),
            status: StatusCode::OK.as_u16(),
            error: "OK",
            message: "Logout successful",
            path: uri.path().to_string(),
        }),
    ))
}
