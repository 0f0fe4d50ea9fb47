//! One-way password hashing.

use anyhow::Result;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::config::SecurityConfig;

/// Opaque one-way hash with a matching verify.
///
/// Implementations are CPU-bound; async callers should run them on a blocking thread.
pub trait HashProvider: Send + Sync {
    fn hash(&self, plaintext: &str) -> Result<String>;

    /// Returns `false` for a wrong password. Errors only on a malformed hash.
    fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool>;
}

/// Argon2id hasher producing PHC strings.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None, // output length (use default)
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl HashProvider for Argon2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = self
            .argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hashed)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        // Parameters come from the PHC string, so hashes made under older
        // settings still verify.
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> Argon2Hasher {
        Argon2Hasher::new(&SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        })
        .unwrap()
    }

    #[test]
    fn hash_is_not_plaintext_and_verifies() {
        let hasher = fast_hasher();
        let hashed = hasher.hash("abc123").unwrap();

        assert_ne!(hashed, "abc123");
        assert!(hashed.starts_with("$argon2id$"));
        assert!(hasher.verify("abc123", &hashed).unwrap());
        assert!(!hasher.verify("wrong", &hashed).unwrap());
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let hasher = fast_hasher();
        assert_ne!(hasher.hash("abc123").unwrap(), hasher.hash("abc123").unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(fast_hasher().verify("abc123", "not-a-hash").is_err());
    }

    #[test]
    fn invalid_params_are_rejected() {
        let config = SecurityConfig {
            argon2_time_cost: 0,
            ..SecurityConfig::default()
        };
        assert!(Argon2Hasher::new(&config).is_err());
    }
}
