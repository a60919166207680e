use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Issues and rotates access/refresh pairs against a single session record
/// per identity. Holds no mutable state; every cross-call fact lives in the
/// credential store, whose atomic upsert is the only serialization point.
pub struct RealTokenService {
    credential_store: Arc<dyn CredentialStore>,
    secret_hasher: Arc<dyn SecretHasher>,
    token_codec: Arc<dyn TokenCodec>,
}

impl RealTokenService {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        secret_hasher: Arc<dyn SecretHasher>,
        token_codec: Arc<dyn TokenCodec>,
    ) -> Self {
        Self {
            credential_store,
            secret_hasher,
            token_codec,
        }
    }

    /// The fragment must match the stored hash of the latest issuance; an
    /// already rotated refresh token fails here.
    async fn check_session(
        &self,
        identity: &Identity,
        fragment: &SignatureFragment,
        cancel: &CancellationToken,
    ) -> Result<(), TokenError> {
        let record = guarded(cancel, self.credential_store.lookup(identity))
            .await?
            .ok_or(TokenError::NotFound)?;

        let matches = guarded(
            cancel,
            self.secret_hasher.verify(&record.hash, fragment.as_str()),
        )
        .await?;
        if !matches {
            return Err(TokenError::PermissionDenied);
        }
        Ok(())
    }

    fn verify_refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(RefreshClaims, SignatureFragment), TokenError> {
        let claims = self
            .token_codec
            .verify_refresh_token(&RefreshToken(refresh_token.to_string()))?;
        let fragment =
            SignatureFragment::extract(refresh_token).ok_or(TokenError::IncorrectToken)?;
        Ok((claims, fragment))
    }
}

/// Races `fut` against `cancel`. A pre-cancelled token wins before `fut` is
/// polled, so no side effect of `fut` can start.
async fn guarded<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, TokenError>
where
    F: Future<Output = Result<T, TokenError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TokenError::Cancelled),
        res = fut => res,
    }
}

#[async_trait::async_trait]
impl TokenService for RealTokenService {
    async fn issue(
        &self,
        identity: &Identity,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError> {
        let (refresh_token, refresh_exp) = self.token_codec.issue_refresh_token(identity)?;
        let fragment = SignatureFragment::extract(&refresh_token.0).ok_or_else(|| {
            TokenError::Internal("signed refresh token has no signature segment".to_string())
        })?;

        let hash = guarded(cancel, self.secret_hasher.hash(fragment.as_str())).await?;

        // Overwrites any previous session of this identity.
        guarded(
            cancel,
            self.credential_store.upsert(identity, &hash, refresh_exp),
        )
        .await?;

        let (access_token, access_exp) =
            self.token_codec.issue_access_token(identity, &fragment)?;

        Ok(CredentialPair {
            access_token,
            refresh_token,
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError> {
        let (claims, fragment) = self.verify_refresh(refresh_token)?;

        self.check_session(&claims.sub, &fragment, cancel).await?;

        self.issue(&claims.sub, cancel).await
    }

    async fn rotate_bound(
        &self,
        access_token: &str,
        refresh_token: &str,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, TokenError> {
        let (claims, fragment) = self.verify_refresh(refresh_token)?;

        let access = match self
            .token_codec
            .verify_access_token(&AccessToken(access_token.to_string()))
        {
            Ok(access) | Err(VerifyError::Expired(access)) => access,
            Err(VerifyError::Incorrect) => return Err(TokenError::IncorrectToken),
        };
        if access.sub != claims.sub || access.reference != fragment.as_str() {
            return Err(TokenError::PermissionDenied);
        }

        self.check_session(&claims.sub, &fragment, cancel).await?;

        self.issue(&claims.sub, cancel).await
    }

    async fn verify_access(&self, access_token: &str) -> Result<AccessGrant, TokenError> {
        let claims = self
            .token_codec
            .verify_access_token(&AccessToken(access_token.to_string()))?;
        let expires_at =
            chrono::DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::IncorrectToken)?;

        Ok(AccessGrant {
            identity: claims.sub,
            reference: claims.reference,
            expires_at,
        })
    }
}
