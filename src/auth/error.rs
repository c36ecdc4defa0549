//! Typed failures for the authentication gateway.

use crate::jwt::TokenError;

/// Errors surfaced by register/login/refresh/logout.
///
/// These propagate to the HTTP boundary, which maps them onto status codes
/// and the structured error body.
#[derive(Debug)]
pub enum AuthError {
    /// Unknown email or failed password comparison
    BadCredentials,
    /// Token subject does not resolve to an account
    AccountNotFound,
    /// Token failed verification, is unknown to the ledger, or is already
    /// revoked
    InvalidToken(&'static str),
    /// Missing or malformed Authorization header
    InvalidArgument(&'static str),
    /// Register with an email that already has an account
    EmailTaken,
    /// Token issuance failure
    Token(TokenError),
    /// Durable store failure
    Database(sqlx::Error),
    /// Password hashing failure
    Hash,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::BadCredentials => write!(f, "Invalid credentials"),
            AuthError::AccountNotFound => write!(f, "Account not found"),
            AuthError::InvalidToken(msg) => write!(f, "{}", msg),
            AuthError::InvalidArgument(msg) => write!(f, "{}", msg),
            AuthError::EmailTaken => write!(f, "An account with this email already exists"),
            AuthError::Token(e) => write!(f, "Token error: {}", e),
            AuthError::Database(e) => write!(f, "Database error: {}", e),
            AuthError::Hash => write!(f, "Password hashing error"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        AuthError::Token(e)
    }
}
