//! Scoped bearer tokens. The plaintext leaves the process once; only its
//! SHA-256 digest is stored.

use chrono::{DateTime, Utc};
use data_encoding::BASE32_NOPAD;
use rand::{TryRngCore, rngs::OsRng};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::constants;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to read from the OS entropy source: {0}")]
    Entropy(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Activation,
    Authentication,
    PasswordReset,
}

impl Scope {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activation => "activation",
            Self::Authentication => "authentication",
            Self::PasswordReset => "password-reset",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes as `{"token": ..., "expiry": ...}`; hash, owner and scope
/// never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,

    #[serde(skip)]
    pub hash: Vec<u8>,

    #[serde(skip)]
    pub user_id: Uuid,

    pub expiry: DateTime<Utc>,

    #[serde(skip)]
    pub scope: Scope,
}

impl Token {
    /// Draws a fresh plaintext and derives its hash in one step.
    pub fn generate(
        user_id: Uuid,
        ttl: chrono::Duration,
        scope: Scope,
    ) -> Result<Self, TokenError> {
        let mut bytes = [0u8; constants::token::ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| TokenError::Entropy(e.to_string()))?;

        let plaintext = BASE32_NOPAD.encode(&bytes);
        let hash = hash_plaintext(&plaintext);

        Ok(Self {
            plaintext,
            hash,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        })
    }
}

#[must_use]
pub fn hash_plaintext(plaintext: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hasher.finalize().to_vec()
}
