//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use chrono::Duration;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Config;
use crate::constants::templates;
use crate::db::{Store, StoreError};
use crate::models::{Password, Permissions, Scope, Token, User};
use crate::services::auth_service::{AuthError, AuthService, PermissionSource, RegisterInput};
use crate::services::mailer::{Mailer, deliver_in_background};
use crate::validation::{
    FieldErrors, is_token_plaintext, validate_email, validate_password_plaintext,
    validate_token_plaintext, validate_user,
};

pub struct SeaOrmAuthService {
    store: Store,
    config: Arc<Config>,
    mailer: Arc<dyn Mailer>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            config,
            mailer,
        }
    }

    async fn issue_token(
        &self,
        user_id: Uuid,
        ttl: Duration,
        scope: Scope,
    ) -> Result<Token, AuthError> {
        let token = Token::generate(user_id, ttl, scope)?;
        self.store.insert_token(&token).await?;
        debug!(user_id = %user_id, scope = %scope, "Issued token");
        Ok(token)
    }

    /// Owner of a consumable token, reporting a miss against the `token`
    /// field.
    async fn token_owner(
        &self,
        scope: Scope,
        plaintext: &str,
        miss_message: &str,
    ) -> Result<User, AuthError> {
        match self.store.get_user_for_token(scope, plaintext).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => Err(FieldErrors::single("token", miss_message).into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn user_by_email_or_field_error(&self, email: &str) -> Result<User, AuthError> {
        match self.store.get_user_by_email(email).await {
            Ok(user) => Ok(user),
            Err(StoreError::NotFound) => {
                Err(FieldErrors::single("email", "no matching email address found").into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PermissionSource for SeaOrmAuthService {
    async fn permissions_for(&self, user_id: Uuid) -> Result<Permissions, AuthError> {
        Ok(self.store.get_permissions_for_user(user_id).await?)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        let mut v = FieldErrors::new();
        validate_user(&mut v, &input.first_name, &input.last_name, &input.email);
        validate_password_plaintext(&mut v, &input.password);
        v.into_result()?;

        let password = Password::set_blocking(input.password, self.config.security.clone()).await?;
        let user = User::new(input.first_name, input.last_name, input.email, password);

        let token = Token::generate(
            user.id,
            self.config.tokens.activation_ttl(),
            Scope::Activation,
        )?;
        self.store
            .insert_registration(&user, &self.config.permissions.default_codes, &token)
            .await?;

        deliver_in_background(
            self.mailer.clone(),
            user.email.clone(),
            templates::USER_WELCOME,
            json!({
                "activation_token": token.plaintext,
                "user_id": user.id,
            }),
        );

        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    async fn activate(&self, token_plaintext: &str) -> Result<User, AuthError> {
        let mut v = FieldErrors::new();
        validate_token_plaintext(&mut v, token_plaintext);
        v.into_result()?;

        let mut user = self
            .token_owner(
                Scope::Activation,
                token_plaintext,
                "invalid or expired activation token",
            )
            .await?;

        let expected = user.last_updated;
        user.activated = true;
        let user = self.store.update_user(&user, expected).await?;

        self.store
            .delete_tokens_for_user(Scope::Activation, user.id)
            .await?;

        info!(user_id = %user.id, "Activated user");
        Ok(user)
    }

    async fn reset_password(
        &self,
        token_plaintext: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut v = FieldErrors::new();
        validate_password_plaintext(&mut v, new_password);
        validate_token_plaintext(&mut v, token_plaintext);
        v.into_result()?;

        let mut user = self
            .token_owner(
                Scope::PasswordReset,
                token_plaintext,
                "invalid or expired password reset token",
            )
            .await?;

        let expected = user.last_updated;
        user.password =
            Password::set_blocking(new_password.to_string(), self.config.security.clone()).await?;
        let user = self.store.update_user(&user, expected).await?;

        self.store
            .delete_tokens_for_user(Scope::PasswordReset, user.id)
            .await?;
        self.store
            .delete_tokens_for_user(Scope::Authentication, user.id)
            .await?;

        info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Token, AuthError> {
        let mut v = FieldErrors::new();
        validate_email(&mut v, email);
        validate_password_plaintext(&mut v, password);
        v.into_result()?;

        let user = match self.store.get_user_by_email(email).await {
            Ok(user) => user,
            Err(StoreError::NotFound) => return Err(AuthError::InvalidCredentials),
            Err(e) => return Err(e.into()),
        };

        if !user.password.matches_blocking(password.to_string()).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(
            user.id,
            self.config.tokens.authentication_ttl(),
            Scope::Authentication,
        )
        .await
    }

    async fn issue_activation_token(&self, email: &str) -> Result<(), AuthError> {
        let mut v = FieldErrors::new();
        validate_email(&mut v, email);
        v.into_result()?;

        let user = self.user_by_email_or_field_error(email).await?;
        if user.activated {
            return Err(FieldErrors::single("email", "user has already been activated").into());
        }

        let token = self
            .issue_token(user.id, self.config.tokens.activation_ttl(), Scope::Activation)
            .await?;

        deliver_in_background(
            self.mailer.clone(),
            user.email,
            templates::TOKEN_ACTIVATION,
            json!({ "activation_token": token.plaintext }),
        );

        Ok(())
    }

    async fn issue_password_reset_token(&self, email: &str) -> Result<(), AuthError> {
        let mut v = FieldErrors::new();
        validate_email(&mut v, email);
        v.into_result()?;

        let user = self.user_by_email_or_field_error(email).await?;
        if !user.activated {
            return Err(FieldErrors::single("email", "user account must be activated").into());
        }

        let token = self
            .issue_token(
                user.id,
                self.config.tokens.password_reset_ttl(),
                Scope::PasswordReset,
            )
            .await?;

        deliver_in_background(
            self.mailer.clone(),
            user.email,
            templates::TOKEN_PASSWORD_RESET,
            json!({ "password_reset_token": token.plaintext }),
        );

        Ok(())
    }

    async fn logout(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(self
            .store
            .delete_tokens_for_user(Scope::Authentication, user_id)
            .await?)
    }

    async fn user_for_token(&self, scope: Scope, plaintext: &str) -> Result<User, AuthError> {
        if !is_token_plaintext(plaintext) {
            return Err(AuthError::NotFound);
        }
        Ok(self.store.get_user_for_token(scope, plaintext).await?)
    }

    async fn grant_permissions(&self, user_id: Uuid, codes: &[String]) -> Result<u64, AuthError> {
        let mut v = FieldErrors::new();
        v.check(!codes.is_empty(), "codes", "must contain at least 1 entry");
        v.check(
            codes.iter().all(|c| !c.is_empty()),
            "codes",
            "must not contain empty values",
        );
        v.into_result()?;

        let user = self.store.get_user_by_id(user_id).await?;
        let granted = self.store.grant_permissions(user.id, codes).await?;

        info!(user_id = %user.id, granted, "Granted permissions");
        Ok(granted)
    }
}
