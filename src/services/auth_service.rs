//! Domain service for registration, credentials and scoped tokens.
//!
//! Every token lookup goes through the hash of its plaintext. Expired,
//! unknown and malformed tokens are indistinguishable to callers.

use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{CredentialError, Permissions, Scope, Token, TokenError, User};
use crate::validation::FieldErrors;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Record not found")]
    NotFound,

    #[error("Edit conflict")]
    EditConflict,

    #[error("Duplicate email address")]
    DuplicateEmail,

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::EditConflict => Self::EditConflict,
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Timeout(_) | StoreError::Database(_) => Self::Storage(err.to_string()),
        }
    }
}

impl From<FieldErrors> for AuthError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Where authorization checks read a user's permission codes from.
#[async_trait::async_trait]
pub trait PermissionSource: Send + Sync {
    async fn permissions_for(&self, user_id: Uuid) -> Result<Permissions, AuthError>;
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: PermissionSource {
    /// Creates an unactivated user, grants the default permissions and
    /// mails an activation token.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] for bad input, [`AuthError::DuplicateEmail`]
    /// if the address is taken.
    async fn register(&self, input: RegisterInput) -> Result<User, AuthError>;

    /// Activates the owner of an activation token and revokes all of the
    /// owner's activation tokens.
    async fn activate(&self, token_plaintext: &str) -> Result<User, AuthError>;

    /// Sets a new password for the owner of a password-reset token and
    /// revokes the owner's password-reset and authentication tokens.
    async fn reset_password(
        &self,
        token_plaintext: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;

    /// Exchanges an email and password for an authentication token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidCredentials`] for an unknown email or a wrong
    /// password, without saying which.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Token, AuthError>;

    async fn issue_activation_token(&self, email: &str) -> Result<(), AuthError>;

    async fn issue_password_reset_token(&self, email: &str) -> Result<(), AuthError>;

    /// Revokes every authentication token of the user.
    async fn logout(&self, user_id: Uuid) -> Result<u64, AuthError>;

    /// Resolves a token to its owner. Any miss is [`AuthError::NotFound`].
    async fn user_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, AuthError>;

    /// Grants catalogue codes to an existing user; returns how many were new.
    async fn grant_permissions(&self, user_id: Uuid, codes: &[String]) -> Result<u64, AuthError>;
}
