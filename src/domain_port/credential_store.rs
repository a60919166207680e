use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Durable home of the one session record per identity.
///
/// Implementations must make `upsert` atomic per identity: two racing writes
/// leave exactly one of them in place (last write wins, never a merge). The
/// token engine relies on this and adds no locking of its own.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Create or replace the record of `identity`. `expires_at` is the expiry
    /// of the refresh token behind `hash`; stores may drop the record after it.
    async fn upsert(
        &self,
        identity: &Identity,
        hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), TokenError>;

    async fn lookup(&self, identity: &Identity) -> Result<Option<SessionRecord>, TokenError>;
}
