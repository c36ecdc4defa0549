//! Durable ledger of issued access tokens.
//!
//! Every access token handed to a client gets a row here so it can be
//! invalidated server-side before its signed expiry. Rows are never deleted,
//! only flagged; the audit trail survives logout and re-login. Refresh
//! tokens are not persisted.

use sqlx::sqlite::SqlitePool;

/// A ledger row for one issued access token.
#[derive(Debug, Clone)]
pub struct TokenRecord {
    pub id: i64,
    /// Account email the token was issued for
    pub subject: String,
    /// The exact compact signed string handed to the client
    pub token: String,
    pub issued_at: i64,
    pub expires_at: i64,
    /// Set on logout or when superseded by a newer login/refresh
    pub revoked: bool,
    /// Set when superseded; distinct from time-based expiry, which is
    /// computed from the signed payload and never stored
    pub expired: bool,
}

#[derive(sqlx::FromRow)]
struct TokenRow {
    id: i64,
    subject: String,
    token: String,
    issued_at: i64,
    expires_at: i64,
    revoked: i32,
    expired: i32,
}

impl From<TokenRow> for TokenRecord {
    fn from(row: TokenRow) -> Self {
        Self {
            id: row.id,
            subject: row.subject,
            token: row.token,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            revoked: row.revoked != 0,
            expired: row.expired != 0,
        }
    }
}

/// Store for the issued-token ledger.
pub struct TokenLedger {
    pool: SqlitePool,
}

impl TokenLedger {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a freshly issued access token. Returns the row ID.
    pub async fn save(
        &self,
        subject: &str,
        token: &str,
        issued_at: i64,
        expires_at: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO tokens (subject, token, kind, issued_at, expires_at, revoked, expired) \
             VALUES (?, ?, 'access', ?, ?, 0, 0)",
        )
        .bind(subject)
        .bind(token)
        .bind(issued_at)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Look up a row by the literal compact token string.
    pub async fn find_by_value(&self, token: &str) -> Result<Option<TokenRecord>, sqlx::Error> {
        let row: Option<TokenRow> = sqlx::query_as(
            "SELECT id, subject, token, issued_at, expires_at, revoked, expired \
             FROM tokens WHERE token = ?",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TokenRecord::from))
    }

    /// All rows for a subject that are neither revoked nor superseded.
    pub async fn find_active_for_subject(
        &self,
        subject: &str,
    ) -> Result<Vec<TokenRecord>, sqlx::Error> {
        let rows: Vec<TokenRow> = sqlx::query_as(
            "SELECT id, subject, token, issued_at, expires_at, revoked, expired \
             FROM tokens WHERE subject = ? AND revoked = 0 AND expired = 0",
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TokenRecord::from).collect())
    }

    /// Bulk-set both flags on the given rows in a single statement.
    pub async fn revoke_all(&self, tokens: &[TokenRecord]) -> Result<u64, sqlx::Error> {
        if tokens.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; tokens.len()].join(", ");
        let sql = format!(
            "UPDATE tokens SET revoked = 1, expired = 1 WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for token in tokens {
            query = query.bind(token.id);
        }

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Set both flags on one row (logout).
    pub async fn mark_revoked(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tokens SET revoked = 1, expired = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
