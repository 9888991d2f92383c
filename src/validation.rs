//! Input validation with per-field error reporting.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use crate::constants;

static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .expect("email regex is valid")
});

/// Field name to message. Only the first failure per field is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add(field, message);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

pub fn validate_email(v: &mut FieldErrors, email: &str) {
    v.check(!email.is_empty(), "email", "must be provided");
    v.check(EMAIL_RX.is_match(email), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut FieldErrors, password: &str) {
    v.check(!password.is_empty(), "password", "must be provided");
    v.check(
        password.len() >= constants::password::MIN_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= constants::password::MAX_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

pub fn validate_token_plaintext(v: &mut FieldErrors, token: &str) {
    v.check(!token.is_empty(), "token", "must be provided");
    v.check(
        token.len() == constants::token::PLAINTEXT_LEN,
        "token",
        "must be 26 bytes long",
    );
}

/// Cheap format check applied before any token lookup.
#[must_use]
pub fn is_token_plaintext(token: &str) -> bool {
    let mut v = FieldErrors::new();
    validate_token_plaintext(&mut v, token);
    v.is_empty()
}

pub fn validate_names(v: &mut FieldErrors, first_name: &str, last_name: &str) {
    let max = constants::user::MAX_NAME_BYTES;
    v.check(!first_name.is_empty(), "first_name", "must be provided");
    v.check(!last_name.is_empty(), "last_name", "must be provided");
    v.check(
        first_name.len() <= max,
        "first_name",
        "must not be more than 50 bytes long",
    );
    v.check(
        last_name.len() <= max,
        "last_name",
        "must not be more than 50 bytes long",
    );
}

pub fn validate_user(v: &mut FieldErrors, first_name: &str, last_name: &str, email: &str) {
    validate_names(v, first_name, last_name);
    validate_email(v, email);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_bounds() {
        let max = "x".repeat(72);
        let too_long = "x".repeat(73);
        for (password, ok) in [
            ("", false),
            ("short", false),
            ("12345678", true),
            (max.as_str(), true),
            (too_long.as_str(), false),
        ] {
            let mut v = FieldErrors::new();
            validate_password_plaintext(&mut v, password);
            assert_eq!(v.is_empty(), ok, "password of {} bytes", password.len());
        }
    }

    #[test]
    fn test_first_error_per_field_wins() {
        let mut v = FieldErrors::new();
        validate_password_plaintext(&mut v, "");
        assert_eq!(v.get("password"), Some("must be provided"));
    }

    #[test]
    fn test_token_format() {
        assert!(is_token_plaintext("ABCDEFGHIJKLMNOPQRSTUVWXYZ"));
        assert!(!is_token_plaintext(""));
        assert!(!is_token_plaintext("ABCDEFGHIJKLMNOPQRSTUVWXY"));
        assert!(!is_token_plaintext("ABCDEFGHIJKLMNOPQRSTUVWXYZ2"));
    }

    #[test]
    fn test_validate_user() {
        let mut v = FieldErrors::new();
        validate_user(&mut v, "Alice", "Smith", "alice@example.com");
        assert!(v.is_empty());

        let mut v = FieldErrors::new();
        validate_user(&mut v, "", &"y".repeat(51), "not-an-email");
        assert_eq!(v.get("first_name"), Some("must be provided"));
        assert_eq!(v.get("last_name"), Some("must not be more than 50 bytes long"));
        assert_eq!(v.get("email"), Some("must be a valid email address"));
    }

    #[test]
    fn test_display_joins_fields() {
        let mut v = FieldErrors::new();
        v.add("token", "must be provided");
        v.add("email", "must be provided");
        assert_eq!(v.to_string(), "email: must be provided; token: must be provided");
    }
}
