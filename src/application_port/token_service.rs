use crate::domain_model::Identity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("incorrect token")]
    IncorrectToken,
    #[error("token has been expired")]
    Expired,
    #[error("id not found")]
    NotFound,
    #[error("permission denied")]
    PermissionDenied,
    #[error("store error: {0}")]
    Store(String),
    #[error("hash error: {0}")]
    Hash(String),
    #[error("internal error: {0}")]
    Internal(String),
    #[error("operation cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct CredentialPair {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

/// What a valid access token proves to a downstream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub identity: Identity,
    pub reference: String,
    pub expires_at: DateTime<Utc>,
}

/// Slow, salted one-way function over the refresh signature fragment.
#[async_trait::async_trait]
pub trait SecretHasher: Send + Sync {
    async fn hash(&self, secret: &str) -> Result<String, TokenError>;
    /// `Ok(false)` on mismatch; `Err` only for malformed hashes or hasher failure.
    async fn verify(&self, hash: &str, candidate: &str) -> Result<bool, TokenError>;
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Mints a fresh pair for `identity` and overwrites its session record.
    async fn issue(
        &self,
        identity: &Identity,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError>;

    /// Exchanges the current refresh token of a session for a new pair.
    async fn rotate(
        &self,
        refresh_token: &str,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError>;

    /// Like `rotate`, but also requires the access token minted alongside
    /// `refresh_token`. The access token may be expired.
    async fn rotate_bound(
        &self,
        access_token: &str,
        refresh_token: &str,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError>;

    async fn verify_access(&self, access_token: &str) -> Result<AccessGrant, TokenError>;
}
