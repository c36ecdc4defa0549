//! Credential verification and session lifecycle.
//!
//! Orchestrates the token codec, the issued-token ledger, and the account
//! store. Access tokens are persisted in the ledger so they can be revoked;
//! refresh tokens are only ever returned to the client, never stored, and
//! never rotated.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::error::AuthError;
use crate::db::{Database, UserRole};
use crate::jwt::{Claims, JwtConfig};
use crate::password::{hash_password, verify_password};

const BEARER_PREFIX: &str = "Bearer ";

/// The pair returned by every credential operation.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates register/login/refresh/logout.
pub struct AuthGateway {
    db: Database,
    jwt: Arc<JwtConfig>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl AuthGateway {
    pub fn new(
        db: Database,
        jwt: Arc<JwtConfig>,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            db,
            jwt,
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    /// Create an account and issue its first token pair.
    ///
    /// The raw password is hashed before it reaches the store; plaintext is
    /// never persisted. The access token lands in the ledger, the refresh
    /// token is only returned.
    pub async fn register(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let password_hash = hash_password(password).map_err(|_| AuthError::Hash)?;
        let uuid = uuid::Uuid::new_v4().to_string();

        self.db
            .users()
            .create(&uuid, email, &password_hash, UserRole::Normal)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db_err) if db_err.is_unique_violation() => AuthError::EmailTaken,
                _ => AuthError::Database(e),
            })?;

        info!(email = %email, "Account registered");
        self.issue_pair(&uuid, email, UserRole::Normal).await
    }

    /// Verify credentials and issue a fresh token pair.
    ///
    /// All previously active ledger rows for the subject are revoked before
    /// the new access token is issued, so under sequential operation at most
    /// one row per subject is active at a time.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let user = self
            .db
            .users()
            .get_by_email(email)
            .await?
            .ok_or(AuthError::BadCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::BadCredentials);
        }

        self.revoke_active(&user.email).await?;

        info!(email = %user.email, "Login");
        self.issue_pair(&user.uuid, &user.email, user.role).await
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The inbound refresh token is echoed back unchanged; refresh tokens
    /// are not rotated.
    pub async fn refresh(&self, auth_header: Option<&str>) -> Result<TokenPair, AuthError> {
        let refresh_token = bearer_token(auth_header)?;

        let claims: Claims = self
            .jwt
            .verify(refresh_token)
            .map_err(|_| AuthError::InvalidToken("Invalid refresh token"))?;

        let user = self
            .db
            .users()
            .get_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if claims.sub != user.email {
            return Err(AuthError::InvalidToken("Refresh token subject mismatch"));
        }

        self.revoke_active(&user.email).await?;

        let access = self
            .jwt
            .issue(&user.uuid, &user.email, user.role, self.access_ttl_secs)?;
        self.db
            .tokens()
            .save(&user.email, &access.token, access.issued_at, access.expires_at)
            .await?;

        info!(email = %user.email, "Access token refreshed");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh_token.to_string(),
        })
    }

    /// Revoke the exact token named by the Authorization header.
    pub async fn logout(&self, auth_header: Option<&str>) -> Result<(), AuthError> {
        let token = bearer_token(auth_header)?;

        let record = self
            .db
            .tokens()
            .find_by_value(token)
            .await?
            .ok_or(AuthError::InvalidToken("Unknown token"))?;

        if record.revoked || record.expired {
            return Err(AuthError::InvalidToken("Token is already revoked"));
        }

        self.db.tokens().mark_revoked(record.id).await?;
        info!(subject = %record.subject, "Logout");
        Ok(())
    }

    /// Flag every still-active ledger row for the subject.
    ///
    /// Not wrapped in a transaction with the subsequent insert: two
    /// concurrent logins for the same subject can each see no active rows
    /// and both persist, leaving two valid tokens until the next
    /// login/refresh. This mirrors the original behavior; see DESIGN.md.
    async fn revoke_active(&self, subject: &str) -> Result<(), AuthError> {
        let active = self.db.tokens().find_active_for_subject(subject).await?;
        if !active.is_empty() {
            self.db.tokens().revoke_all(&active).await?;
        }
        Ok(())
    }

    /// Issue an access+refresh pair and persist the access token.
    /// Revocation of prior rows, where required, happens before this.
    async fn issue_pair(
        &self,
        uuid: &str,
        email: &str,
        role: UserRole,
    ) -> Result<TokenPair, AuthError> {
        let access = self.jwt.issue(uuid, email, role, self.access_ttl_secs)?;
        let refresh = self.jwt.issue(uuid, email, role, self.refresh_ttl_secs)?;

        self.db
            .tokens()
            .save(email, &access.token, access.issued_at, access.expires_at)
            .await?;

        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
        })
    }
}

/// Extract the token substring from a `Bearer` Authorization header.
fn bearer_token(auth_header: Option<&str>) -> Result<&str, AuthError> {
    let header = auth_header.ok_or(AuthError::InvalidArgument(
        "Authorization header is required",
    ))?;
    header
        .strip_prefix(BEARER_PREFIX)
        .ok_or(AuthError::InvalidArgument(
            "Authorization header is not a Bearer token",
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_jwt() -> Arc<JwtConfig> {
        Arc::new(JwtConfig::new(b"test-secret-key-for-the-gateway!"))
    }

    async fn test_gateway() -> AuthGateway {
        let db = Database::open(":memory:").await.unwrap();
        AuthGateway::new(db, test_jwt(), 900, 604800)
    }

    #[tokio::test]
    async fn test_register_issues_and_persists_access_token() {
        let gateway = test_gateway().await;

        let pair = gateway.register("a@x.com", "secret1").await.unwrap();

        let record = gateway
            .db
            .tokens()
            .find_by_value(&pair.access_token)
            .await
            .unwrap();
        assert!(record.is_some(), "access token must be in the ledger");

        // Refresh tokens are never persisted.
        let record = gateway
            .db
            .tokens()
            .find_by_value(&pair.refresh_token)
            .await
            .unwrap();
        assert!(record.is_none(), "refresh token must not be in the ledger");
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let gateway = test_gateway().await;

        gateway.register("a@x.com", "secret1").await.unwrap();
        let result = gateway.register("a@x.com", "other").await;

        assert!(matches!(result, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_login_wrong_password_issues_nothing() {
        let gateway = test_gateway().await;
        gateway.register("a@x.com", "secret1").await.unwrap();

        let result = gateway.login("a@x.com", "wrong").await;
        assert!(matches!(result, Err(AuthError::BadCredentials)));

        // Exactly the registration token exists; no new row appeared.
        let active = gateway
            .db
            .tokens()
            .find_active_for_subject("a@x.com")
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let gateway = test_gateway().await;

        let result = gateway.login("ghost@x.com", "whatever").await;
        assert!(matches!(result, Err(AuthError::BadCredentials)));
    }

    #[tokio::test]
    async fn test_login_revokes_previously_active_tokens() {
        let gateway = test_gateway().await;
        let first = gateway.register("a@x.com", "secret1").await.unwrap();

        let second = gateway.login("a@x.com", "secret1").await.unwrap();

        let old = gateway
            .db
            .tokens()
            .find_by_value(&first.access_token)
            .await
            .unwrap()
            .unwrap();
        assert!(old.revoked);
        assert!(old.expired);

        let active = gateway
            .db
            .tokens()
            .find_active_for_subject("a@x.com")
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].token, second.access_token);
    }

    #[tokio::test]
    async fn test_refresh_returns_same_refresh_token() {
        let gateway = test_gateway().await;
        let pair = gateway.register("a@x.com", "secret1").await.unwrap();

        let header = format!("Bearer {}", pair.refresh_token);
        let refreshed = gateway.refresh(Some(&header)).await.unwrap();

        assert_eq!(refreshed.refresh_token, pair.refresh_token);
        assert_ne!(refreshed.access_token, pair.access_token);

        // The new access token carries the same subject.
        let claims = gateway.jwt.verify(&refreshed.access_token).unwrap();
        assert_eq!(claims.sub, "a@x.com");

        // The registration access token was superseded.
        let old = gateway
            .db
            .tokens()
            .find_by_value(&pair.access_token)
            .await
            .unwrap()
            .unwrap();
        assert!(old.revoked);
    }

    #[tokio::test]
    async fn test_refresh_header_errors() {
        let gateway = test_gateway().await;

        assert!(matches!(
            gateway.refresh(None).await,
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.refresh(Some("Basic dXNlcjpwdw==")).await,
            Err(AuthError::InvalidArgument(_))
        ));
        assert!(matches!(
            gateway.refresh(Some("Bearer not-a-token")).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_account() {
        let gateway = test_gateway().await;
        let pair = gateway.register("a@x.com", "secret1").await.unwrap();

        sqlx::query("DELETE FROM users WHERE email = 'a@x.com'")
            .execute(gateway.db.pool())
            .await
            .unwrap();

        let header = format!("Bearer {}", pair.refresh_token);
        assert!(matches!(
            gateway.refresh(Some(&header)).await,
            Err(AuthError::AccountNotFound)
        ));
    }

    #[tokio::test]
    async fn test_logout_flags_token_once() {
        let gateway = test_gateway().await;
        let pair = gateway.register("a@x.com", "secret1").await.unwrap();

        let header = format!("Bearer {}", pair.access_token);
        gateway.logout(Some(&header)).await.unwrap();

        let record = gateway
            .db
            .tokens()
            .find_by_value(&pair.access_token)
            .await
            .unwrap()
            .unwrap();
        assert!(record.revoked);
        assert!(record.expired);

        // Second logout with the same token is rejected.
        assert!(matches!(
            gateway.logout(Some(&header)).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_logout_unknown_token() {
        let gateway = test_gateway().await;

        assert!(matches!(
            gateway.logout(Some("Bearer never-issued")).await,
            Err(AuthError::InvalidToken(_))
        ));
        assert!(matches!(
            gateway.logout(None).await,
            Err(AuthError::InvalidArgument(_))
        ));
    }
}
