pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod password;

use std::sync::Arc;

use axum::{Router, middleware};
use tokio::net::TcpListener;

use auth::{AuthGateway, FilterState, authenticate_request};
use db::Database;
use jwt::JwtConfig;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Access token time-to-live in seconds
    pub access_ttl_secs: i64,
    /// Refresh token time-to-live in seconds
    pub refresh_ttl_secs: i64,
}

/// Create the application router with the given configuration.
///
/// The authentication filter wraps every route; `/auth` and `/health` are on
/// its public allowlist and pass through untouched.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));

    let gateway = Arc::new(AuthGateway::new(
        config.db.clone(),
        jwt.clone(),
        config.access_ttl_secs,
        config.refresh_ttl_secs,
    ));

    let filter_state = Arc::new(FilterState {
        db: config.db.clone(),
        jwt,
    });

    api::create_api_router(config.db.clone(), gateway).layer(middleware::from_fn_with_state(
        filter_state,
        authenticate_request,
    ))
}

/// Run the server on the given listener. This function blocks until the
/// server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
