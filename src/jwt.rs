//! Signed-token issuance and verification.
//!
//! Access and refresh tokens share the same claim set and signing key and
//! differ only in time-to-live. Verification recomputes the signature before
//! any semantic check; expiry is evaluated only after the signature matches.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::db::UserRole;

/// Claim set carried inside every signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token id, derived from the account uuid
    pub jti: String,
    /// Account role at issuance time
    pub role: UserRole,
    /// Subject (account email)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// A freshly signed token together with its timestamps.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The compact signed string handed to the client
    pub token: String,
    /// Issued at (Unix seconds)
    pub issued_at: i64,
    /// Expiration (Unix seconds)
    pub expires_at: i64,
}

/// Symmetric signing configuration. Stateless and safe to share across tasks.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtConfig {
    /// Create a new signing configuration with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a signed token for the given subject with the given lifetime.
    ///
    /// Deterministic for identical inputs and clock reading. A negative
    /// `ttl_secs` produces an already-expired token.
    pub fn issue(
        &self,
        uuid: &str,
        email: &str,
        role: UserRole,
        ttl_secs: i64,
    ) -> Result<IssuedToken, TokenError> {
        let now = unix_now()?;
        let exp = now + ttl_secs;

        let claims = Claims {
            jti: uuid.to_string(),
            role,
            sub: email.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(TokenError::Encoding)?;

        Ok(IssuedToken {
            token,
            issued_at: now,
            expires_at: exp,
        })
    }

    /// Verify a compact token and return its claims.
    ///
    /// Rejects with `SignatureInvalid` on any signature mismatch, `Expired`
    /// when the signature is valid but `exp` has passed, and `Malformed` for
    /// anything that does not decode as a token at all.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })?;

        Ok(token_data.claims)
    }
}

fn unix_now() -> Result<i64, TokenError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TokenError::Time)?;
    Ok(now.as_secs() as i64)
}

/// Errors from token issuance and verification.
#[derive(Debug)]
pub enum TokenError {
    /// Error signing the claim set
    Encoding(jsonwebtoken::errors::Error),
    /// Token does not decode as a signed token
    Malformed,
    /// Signature mismatch (tampered token or wrong key)
    SignatureInvalid,
    /// Signature is valid but the token has expired
    Expired,
    /// System clock error
    Time,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::Encoding(e) => write!(f, "Failed to sign token: {}", e),
            TokenError::Malformed => write!(f, "Malformed token"),
            TokenError::SignatureInvalid => write!(f, "Token signature is invalid"),
            TokenError::Expired => write!(f, "Token expired"),
            TokenError::Time => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for TokenError {}
