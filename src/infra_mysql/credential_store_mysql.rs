use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

/// Session records in the `refresh_session` table (see `sql/schema.sql`).
/// The primary key on `identity` turns the insert into an atomic replace.
pub struct MySqlCredentialStore {
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlCredentialStore { pool }
    }

    fn row_to_record(row: MySqlRow) -> Result<SessionRecord, TokenError> {
        let identity: String = row
            .try_get("identity")
            .map_err(|e| TokenError::Store(e.to_string()))?;
        let hash: String = row
            .try_get("hash")
            .map_err(|e| TokenError::Store(e.to_string()))?;

        Ok(SessionRecord {
            identity: Identity(identity),
            hash,
        })
    }
}

#[async_trait::async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn upsert(
        &self,
        identity: &Identity,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        sqlx::query(
            r#"
INSERT INTO refresh_session (identity, hash, expires_at)
VALUES (?, ?, ?)
ON DUPLICATE KEY UPDATE hash = VALUES(hash), expires_at = VALUES(expires_at)
"#,
        )
        .bind(identity.as_str())
        .bind(hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| TokenError::Store(e.to_string()))?;

        debug!(%identity, "session record stored in mysql");
        Ok(())
    }

    async fn lookup(&self, identity: &Identity) -> Result<Option<SessionRecord>, TokenError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT identity, hash
FROM refresh_session
WHERE identity = ? AND expires_at > UTC_TIMESTAMP(6)
"#,
        )
        .bind(identity.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TokenError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_record).transpose()
    }
}
