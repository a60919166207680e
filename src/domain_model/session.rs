use super::Identity;

/// The single persisted session of an identity: a one-way hash of the
/// signature fragment of the latest refresh token issued to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub identity: Identity,
    pub hash: String,
}

/// Third segment of a compact signed token. Unpredictable without the signing
/// secret, so it stands in for the whole refresh token in the session record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureFragment(String);

impl SignatureFragment {
    /// Splits `token` on `.` and returns its signature segment. No
    /// cryptographic check happens here; `None` means the token does not
    /// have the `header.payload.signature` shape.
    pub fn extract(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(_), Some(signature), None) if !signature.is_empty() => {
                Some(SignatureFragment(signature.to_owned()))
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
