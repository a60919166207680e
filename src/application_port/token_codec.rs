use super::{AccessToken, RefreshToken, TokenError};
use crate::domain_model::{AccessClaims, Identity, RefreshClaims, SignatureFragment};
use chrono::{DateTime, Utc};

/// Verification failure of a signed token. A token whose signature checks out
/// but whose expiry has passed still hands its claims back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError<C> {
    Incorrect,
    Expired(C),
}

impl<C> From<VerifyError<C>> for TokenError {
    fn from(err: VerifyError<C>) -> Self {
        match err {
            VerifyError::Incorrect => TokenError::IncorrectToken,
            VerifyError::Expired(_) => TokenError::Expired,
        }
    }
}

pub trait TokenCodec: Send + Sync {
    fn issue_refresh_token(
        &self,
        identity: &Identity,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError>;
    fn issue_access_token(
        &self,
        identity: &Identity,
        reference: &SignatureFragment,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError>;
    fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<RefreshClaims, VerifyError<RefreshClaims>>;
    fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<AccessClaims, VerifyError<AccessClaims>>;
}
