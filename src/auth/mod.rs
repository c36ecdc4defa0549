//! Bearer-token authentication and session lifecycle.
//!
//! Access tokens are short-lived and recorded in a durable ledger so they
//! can be revoked before their signed expiry. Refresh tokens share the same
//! codec with a longer time-to-live and are never persisted.

mod context;
mod error;
mod filter;
mod gateway;

pub use context::{AdminOnly, AuthContext, RequireAuth};
pub use error::AuthError;
pub use filter::{FilterState, authenticate_request};
pub use gateway::{AuthGateway, TokenPair};
