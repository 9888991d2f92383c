//! Password credential: an Argon2id hash, never the plaintext.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use std::fmt;
use thiserror::Error;
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Invalid Argon2 params: {0}")]
    Params(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error("Invalid password hash format: {0}")]
    MalformedHash(String),

    #[error("Password verification error: {0}")]
    Verify(String),

    #[error("Password hashing task panicked: {0}")]
    Task(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(..)")
    }
}

impl Password {
    /// Wraps a stored PHC hash string.
    ///
    /// # Panics
    ///
    /// An empty hash means a user record was built without a credential,
    /// which is a bug rather than bad input.
    #[must_use]
    pub fn from_hash(hash: String) -> Self {
        assert!(!hash.is_empty(), "missing password hash for user");
        Self { hash }
    }

    #[must_use]
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hashes `plaintext` with a fresh salt.
    pub fn set(plaintext: &str, config: &SecurityConfig) -> Result<Self, CredentialError> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| CredentialError::Params(e.to_string()))?;

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        Ok(Self {
            hash: hash.to_string(),
        })
    }

    /// `Ok(false)` only when the password does not match; any other
    /// failure is an error.
    pub fn matches(&self, plaintext: &str) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(&self.hash)
            .map_err(|e| CredentialError::MalformedHash(e.to_string()))?;

        match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::Verify(e.to_string())),
        }
    }

    /// [`Password::set`] on the blocking pool; Argon2 is CPU and memory heavy.
    pub async fn set_blocking(
        plaintext: String,
        config: SecurityConfig,
    ) -> Result<Self, CredentialError> {
        task::spawn_blocking(move || Self::set(&plaintext, &config))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }

    /// [`Password::matches`] on the blocking pool.
    pub async fn matches_blocking(&self, plaintext: String) -> Result<bool, CredentialError> {
        let password = self.clone();
        task::spawn_blocking(move || password.matches(&plaintext))
            .await
            .map_err(|e| CredentialError::Task(e.to_string()))?
    }
}
