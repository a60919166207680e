use crate::application_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// Argon2id over the refresh signature fragment. Hashing runs on the blocking
/// pool so a slow parameter set does not stall the async workers.
#[derive(Debug, Clone)]
pub struct Argon2SecretHasher {
    params: Params,
}

impl Argon2SecretHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, TokenError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| TokenError::Hash(format!("invalid argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

#[async_trait::async_trait]
impl SecretHasher for Argon2SecretHasher {
    async fn hash(&self, secret: &str) -> Result<String, TokenError> {
        let argon2 = self.argon2();
        let secret = secret.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(secret.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| TokenError::Hash(e.to_string()))
        })
        .await
        .map_err(|e| TokenError::Hash(format!("hasher task failed: {}", e)))?
    }

    async fn verify(&self, hash: &str, candidate: &str) -> Result<bool, TokenError> {
        let argon2 = self.argon2();
        let hash = hash.to_owned();
        let candidate = candidate.to_owned();
        tokio::task::spawn_blocking(move || {
            let parsed = PasswordHash::new(&hash)
                .map_err(|e| TokenError::Hash(format!("invalid PHC hash: {}", e)))?;

            match argon2.verify_password(candidate.as_bytes(), &parsed) {
                Ok(_) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(e) => Err(TokenError::Hash(format!("verify error: {}", e))),
            }
        })
        .await
        .map_err(|e| TokenError::Hash(format!("hasher task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2SecretHasher {
        Argon2SecretHasher::new(8, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn hash_verifies_original_secret() {
        let hasher = hasher();
        let hash = hasher.hash("c2lnbmF0dXJl").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(&hash, "c2lnbmF0dXJl").await.unwrap());
    }

    #[tokio::test]
    async fn hash_rejects_other_secret() {
        let hasher = hasher();
        let hash = hasher.hash("c2lnbmF0dXJl").await.unwrap();

        assert!(!hasher.verify(&hash, "b3RoZXI").await.unwrap());
    }

    #[tokio::test]
    async fn hashes_are_salted() {
        let hasher = hasher();
        let first = hasher.hash("same").await.unwrap();
        let second = hasher.hash("same").await.unwrap();

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hash_is_hash_error() {
        let result = hasher().verify("not-a-phc-string", "value").await;
        assert!(matches!(result, Err(TokenError::Hash(_))));
    }

    #[test]
    fn invalid_params_are_rejected() {
        assert!(matches!(
            Argon2SecretHasher::new(0, 0, 0),
            Err(TokenError::Hash(_))
        ));
    }
}
