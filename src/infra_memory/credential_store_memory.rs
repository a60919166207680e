use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredHash {
    hash: String,
    expires_at: DateTime<Utc>,
}

/// Process-local store for development and tests. `DashMap::insert` replaces
/// under the shard lock, which gives the last-write-wins upsert the engine
/// expects.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    sessions: DashMap<Identity, StoredHash>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn upsert(
        &self,
        identity: &Identity,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TokenError> {
        self.sessions.insert(
            identity.clone(),
            StoredHash {
                hash: hash.to_owned(),
                expires_at,
            },
        );
        debug!(%identity, "session record stored");
        Ok(())
    }

    async fn lookup(&self, identity: &Identity) -> Result<Option<SessionRecord>, TokenError> {
        let record = self
            .sessions
            .get(identity)
            .filter(|stored| stored.expires_at > Utc::now())
            .map(|stored| SessionRecord {
                identity: identity.clone(),
                hash: stored.hash.clone(),
            });
        Ok(record)
    }
}
