use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

/// One string key per identity holding the fragment hash. `SET .. EX` is a
/// single atomic command, so racing upserts resolve to the last writer and
/// Redis drops the record once the refresh token it guards has expired.
pub struct RedisCredentialStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisCredentialStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisCredentialStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn key(&self, identity: &Identity) -> String {
        format!("{}:{}", self.prefix, identity)
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let secs = (until - Utc::now()).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }
}

#[async_trait::async_trait]
impl CredentialStore for RedisCredentialStore {
    async fn upsert(
        &self,
        identity: &Identity,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        let key = self.key(identity);
        let ttl_secs = Self::ttl_secs(expires_at);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, hash, ttl_secs)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?;
        debug!(%identity, ttl_secs, "session record stored in redis");
        Ok(())
    }

    async fn lookup(&self, identity: &Identity) -> Result<Option<SessionRecord>, TokenError> {
        let key = self.key(identity);
        let mut conn = self.conn.clone();
        let hash: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| TokenError::Store(e.to_string()))?;
        Ok(hash.map(|hash| SessionRecord {
            identity: identity.clone(),
            hash,
        }))
    }
}
