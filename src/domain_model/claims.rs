use super::Identity;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Identity,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Identity,
    /// Signature fragment of the refresh token minted in the same pair.
    #[serde(rename = "ref")]
    pub reference: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}
