use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
    pub access_ttl: TimeDelta,
    pub refresh_ttl: TimeDelta,
    /// Seconds of clock skew tolerated on `exp`.
    pub leeway: u64,
}

pub fn sign<C: Serialize>(
    claims: &C,
    algorithm: Algorithm,
    secret: &[u8],
) -> Result<String, TokenError> {
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| TokenError::Internal(e.to_string()))
}

/// Checks signature, algorithm and shape of `token`, then its expiry.
/// An expired token is decoded a second time without the expiry check so its
/// claims can travel inside `VerifyError::Expired`.
pub fn verify<C: DeserializeOwned>(
    token: &str,
    algorithm: Algorithm,
    secret: &[u8],
    leeway: u64,
) -> Result<C, VerifyError<C>> {
    let key = DecodingKey::from_secret(secret);
    let mut validation = Validation::new(algorithm);
    validation.leeway = leeway;
    validation.set_required_spec_claims(&["exp", "sub"]);

    match decode::<C>(token, &key, &validation) {
        Ok(data) => Ok(data.claims),
        Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => {
            validation.validate_exp = false;
            match decode::<C>(token, &key, &validation) {
                Ok(data) => Err(VerifyError::Expired(data.claims)),
                Err(_) => Err(VerifyError::Incorrect),
            }
        }
        Err(_) => Err(VerifyError::Incorrect),
    }
}

fn expiry_after(iat: DateTime<Utc>, ttl: TimeDelta) -> Result<DateTime<Utc>, TokenError> {
    iat.checked_add_signed(ttl)
        .ok_or_else(|| TokenError::Internal(format!("token ttl {} overflows the clock", ttl)))
}

pub struct JwtHmacCodec {
    cfg: JwtConfig,
}

impl JwtHmacCodec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHmacCodec { cfg }
    }

    #[inline]
    fn new_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

impl TokenCodec for JwtHmacCodec {
    fn issue_refresh_token(
        &self,
        identity: &Identity,
    ) -> Result<(RefreshToken, DateTime<Utc>), TokenError> {
        let iat_dt = Utc::now();
        let exp_dt = expiry_after(iat_dt, self.cfg.refresh_ttl)?;
        let claims = RefreshClaims {
            sub: identity.clone(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            jti: Self::new_jti(),
        };
        let token = sign(&claims, self.cfg.algorithm, &self.cfg.refresh_secret)?;
        Ok((RefreshToken(token), exp_dt))
    }

    fn issue_access_token(
        &self,
        identity: &Identity,
        reference: &SignatureFragment,
    ) -> Result<(AccessToken, DateTime<Utc>), TokenError> {
        let iat_dt = Utc::now();
        let exp_dt = expiry_after(iat_dt, self.cfg.access_ttl)?;
        let claims = AccessClaims {
            sub: identity.clone(),
            reference: reference.as_str().to_owned(),
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            jti: Self::new_jti(),
        };
        let token = sign(&claims, self.cfg.algorithm, &self.cfg.access_secret)?;
        Ok((AccessToken(token), exp_dt))
    }

    fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<RefreshClaims, VerifyError<RefreshClaims>> {
        verify(
            &token.0,
            self.cfg.algorithm,
            &self.cfg.refresh_secret,
            self.cfg.leeway,
        )
    }

    fn verify_access_token(
        &self,
        token: &AccessToken,
    ) -> Result<AccessClaims, VerifyError<AccessClaims>> {
        verify(
            &token.0,
            self.cfg.algorithm,
            &self.cfg.access_secret,
            self.cfg.leeway,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &[u8] = b"test-access-secret";
    const REFRESH_SECRET: &[u8] = b"test-refresh-secret";

    fn config() -> JwtConfig {
        JwtConfig {
            algorithm: Algorithm::HS512,
            access_secret: ACCESS_SECRET.to_vec(),
            refresh_secret: REFRESH_SECRET.to_vec(),
            access_ttl: TimeDelta::minutes(5),
            refresh_ttl: TimeDelta::days(30),
            leeway: 0,
        }
    }

    fn refresh_claims(exp: i64) -> RefreshClaims {
        RefreshClaims {
            sub: Identity::from("u1"),
            exp,
            iat: Utc::now().timestamp(),
            jti: "jti-1".to_string(),
        }
    }

    #[test]
    fn sign_then_verify_returns_same_claims() {
        let claims = refresh_claims(Utc::now().timestamp() + 3600);
        let token = sign(&claims, Algorithm::HS512, REFRESH_SECRET).unwrap();

        let decoded: RefreshClaims = verify(&token, Algorithm::HS512, REFRESH_SECRET, 0).unwrap();
        assert_eq!(decoded, claims);
    }

    #[test]
    fn expired_token_reports_expired_with_claims() {
        let claims = refresh_claims(Utc::now().timestamp() - 1);
        let token = sign(&claims, Algorithm::HS512, REFRESH_SECRET).unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, REFRESH_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Expired(claims)));
    }

    #[test]
    fn wrong_secret_is_incorrect() {
        let claims = refresh_claims(Utc::now().timestamp() + 3600);
        let token = sign(&claims, Algorithm::HS512, REFRESH_SECRET).unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, ACCESS_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn expired_token_with_wrong_secret_is_incorrect() {
        let claims = refresh_claims(Utc::now().timestamp() - 60);
        let token = sign(&claims, Algorithm::HS512, REFRESH_SECRET).unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, ACCESS_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn unexpected_algorithm_is_incorrect() {
        let claims = refresh_claims(Utc::now().timestamp() + 3600);
        let token = sign(&claims, Algorithm::HS256, REFRESH_SECRET).unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, REFRESH_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn missing_subject_is_incorrect() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }
        let token = sign(
            &NoSubject {
                exp: Utc::now().timestamp() + 3600,
            },
            Algorithm::HS512,
            REFRESH_SECRET,
        )
        .unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, REFRESH_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn wrong_typed_subject_is_incorrect() {
        #[derive(Serialize)]
        struct NumericSubject {
            sub: u64,
            exp: i64,
            iat: i64,
            jti: String,
        }
        let token = sign(
            &NumericSubject {
                sub: 42,
                exp: Utc::now().timestamp() + 3600,
                iat: Utc::now().timestamp(),
                jti: "jti".to_string(),
            },
            Algorithm::HS512,
            REFRESH_SECRET,
        )
        .unwrap();

        let result: Result<RefreshClaims, _> = verify(&token, Algorithm::HS512, REFRESH_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn garbage_is_incorrect() {
        let result: Result<RefreshClaims, _> =
            verify("not-a-token", Algorithm::HS512, REFRESH_SECRET, 0);
        assert_eq!(result, Err(VerifyError::Incorrect));
    }

    #[test]
    fn access_token_references_refresh_signature() {
        let codec = JwtHmacCodec::new(config());
        let identity = Identity::from("u1");

        let (refresh, _) = codec.issue_refresh_token(&identity).unwrap();
        let fragment = SignatureFragment::extract(&refresh.0).unwrap();
        let (access, _) = codec.issue_access_token(&identity, &fragment).unwrap();

        let access_claims = codec.verify_access_token(&access).unwrap();
        assert_eq!(access_claims.sub, identity);
        assert_eq!(access_claims.reference, fragment.as_str());

        let refresh_claims = codec.verify_refresh_token(&refresh).unwrap();
        assert_eq!(refresh_claims.sub, identity);
    }

    #[test]
    fn tokens_are_bound_to_their_own_secret() {
        let codec = JwtHmacCodec::new(config());
        let identity = Identity::from("u1");

        let (refresh, _) = codec.issue_refresh_token(&identity).unwrap();
        let as_access = AccessToken(refresh.0.clone());
        assert_eq!(
            codec.verify_access_token(&as_access),
            Err(VerifyError::Incorrect)
        );
    }

    #[test]
    fn refresh_tokens_differ_within_one_second() {
        let codec = JwtHmacCodec::new(config());
        let identity = Identity::from("u1");

        let (first, _) = codec.issue_refresh_token(&identity).unwrap();
        let (second, _) = codec.issue_refresh_token(&identity).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn oversized_ttl_is_an_internal_error() {
        let codec = JwtHmacCodec::new(JwtConfig {
            refresh_ttl: TimeDelta::seconds(10_000_000_000_000),
            ..config()
        });
        let result = codec.issue_refresh_token(&Identity::from("u1"));
        assert!(matches!(result, Err(TokenError::Internal(_))));
    }

    #[test]
    fn negative_ttl_mints_expired_access_token() {
        let codec = JwtHmacCodec::new(JwtConfig {
            access_ttl: TimeDelta::minutes(-1),
            ..config()
        });
        let identity = Identity::from("u1");
        let (refresh, _) = codec.issue_refresh_token(&identity).unwrap();
        let fragment = SignatureFragment::extract(&refresh.0).unwrap();
        let (access, _) = codec.issue_access_token(&identity, &fragment).unwrap();

        match codec.verify_access_token(&access) {
            Err(VerifyError::Expired(claims)) => assert_eq!(claims.sub, identity),
            other => panic!("expected expired access token, got {:?}", other),
        }
    }
}
