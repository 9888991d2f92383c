use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::password::Password;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,

    #[serde(skip)]
    pub password: Password,

    pub activated: bool,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl User {
    /// A fresh, unactivated user. Timestamps are truncated to the
    /// microsecond precision the database keeps.
    #[must_use]
    pub fn new(first_name: String, last_name: String, email: String, password: Password) -> Self {
        let now = now_micros();
        Self {
            id: Uuid::new_v4(),
            email,
            first_name,
            last_name,
            password,
            activated: false,
            created_at: now,
            last_updated: now,
        }
    }
}

#[must_use]
pub fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Who is making the request. Anonymous is a distinct variant rather than
/// a sentinel user.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Identity {
    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    #[must_use]
    pub const fn is_activated(&self) -> bool {
        match self {
            Self::Anonymous => false,
            Self::Authenticated(user) => user.activated,
        }
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new(
            "Alice".to_string(),
            "Smith".to_string(),
            "alice@example.com".to_string(),
            Password::from_hash("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string()),
        )
    }

    #[test]
    fn test_new_user_defaults() {
        let user = sample_user();
        assert!(!user.activated);
        assert_eq!(user.created_at, user.last_updated);
        assert_eq!(user.created_at.timestamp_subsec_nanos() % 1000, 0);
    }

    #[test]
    fn test_json_omits_password() {
        let json = serde_json::to_value(sample_user()).unwrap();
        let object = json.as_object().unwrap();
        assert!(!object.contains_key("password"));
        assert_eq!(object["email"], "alice@example.com");
        assert_eq!(object["activated"], false);
    }

    #[test]
    fn test_identity_predicates() {
        let anonymous = Identity::Anonymous;
        assert!(anonymous.is_anonymous());
        assert!(!anonymous.is_activated());
        assert!(anonymous.user().is_none());

        let mut user = sample_user();
        let inactive = Identity::Authenticated(user.clone());
        assert!(!inactive.is_anonymous());
        assert!(!inactive.is_activated());

        user.activated = true;
        let active = Identity::Authenticated(user);
        assert!(active.is_activated());
        assert_eq!(active.user().map(|u| u.first_name.as_str()), Some("Alice"));
    }
}
