//! Authorization chain: authenticated, then activated, then permission.
//! Checks run in that order and stop at the first failure.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, AppState, context};
use crate::models::Identity;
use crate::services::PermissionSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Activated,
    Permission(String),
}

pub async fn evaluate<P>(
    chain: &[Requirement],
    identity: &Identity,
    source: &P,
) -> Result<(), ApiError>
where
    P: PermissionSource + ?Sized,
{
    for requirement in chain {
        let user = match identity {
            Identity::Anonymous => return Err(ApiError::AuthenticationRequired),
            Identity::Authenticated(user) => user,
        };

        match requirement {
            Requirement::Authenticated => {}
            Requirement::Activated => {
                if !user.activated {
                    return Err(ApiError::InactiveAccount);
                }
            }
            Requirement::Permission(code) => {
                let permissions = source.permissions_for(user.id).await.map_err(|e| {
                    ApiError::InternalError(format!("Failed to load permissions: {e}"))
                })?;

                if !permissions.includes(code) {
                    return Err(ApiError::NotPermitted);
                }
            }
        }
    }

    Ok(())
}

/// Middleware state: the chain to enforce on a group of routes.
#[derive(Clone)]
pub struct Guard {
    state: Arc<AppState>,
    chain: Arc<[Requirement]>,
}

impl Guard {
    #[must_use]
    pub fn authenticated(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
            chain: Arc::from([Requirement::Authenticated]),
        }
    }

    #[must_use]
    pub fn activated(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
            chain: Arc::from([Requirement::Authenticated, Requirement::Activated]),
        }
    }

    #[must_use]
    pub fn permission(state: &Arc<AppState>, code: &str) -> Self {
        Self {
            state: state.clone(),
            chain: Arc::from([
                Requirement::Authenticated,
                Requirement::Activated,
                Requirement::Permission(code.to_string()),
            ]),
        }
    }
}

pub async fn enforce(State(guard): State<Guard>, request: Request, next: Next) -> Response {
    let identity = context::identity(&request).clone();

    let verdict = evaluate(&guard.chain, &identity, guard.state.auth_service.as_ref()).await;
    match verdict {
        Ok(()) => next.run(request).await,
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Password, Permissions, User};
    use crate::services::AuthError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    struct StubSource {
        codes: Vec<&'static str>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubSource {
        fn with(codes: Vec<&'static str>) -> Self {
            Self {
                codes,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }
    }

    #[async_trait::async_trait]
    impl PermissionSource for StubSource {
        async fn permissions_for(&self, _user_id: Uuid) -> Result<Permissions, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AuthError::Storage("pool exhausted".to_string()));
            }
            Ok(self.codes.iter().copied().collect())
        }
    }

    fn user(activated: bool) -> Identity {
        let mut user = User::new(
            "Alice".to_string(),
            "Smith".to_string(),
            "alice@example.com".to_string(),
            Password::from_hash("$argon2id$stub".to_string()),
        );
        user.activated = activated;
        Identity::Authenticated(user)
    }

    fn chain(code: &str) -> Vec<Requirement> {
        vec![
            Requirement::Authenticated,
            Requirement::Activated,
            Requirement::Permission(code.to_string()),
        ]
    }

    #[tokio::test]
    async fn test_anonymous_fails_first() {
        let source = StubSource::with(vec!["movies:read"]);
        for requirements in [
            vec![Requirement::Authenticated],
            vec![Requirement::Authenticated, Requirement::Activated],
            chain("movies:read"),
        ] {
            let result = evaluate(&requirements, &Identity::Anonymous, &source).await;
            assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inactive_stops_before_permission_lookup() {
        let source = StubSource::with(vec!["movies:read"]);
        let result = evaluate(&chain("movies:read"), &user(false), &source).await;
        assert!(matches!(result, Err(ApiError::InactiveAccount)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_inactive_passes_authenticated_only() {
        let source = StubSource::with(vec![]);
        let result = evaluate(&[Requirement::Authenticated], &user(false), &source).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_permission_checked() {
        let source = StubSource::with(vec!["movies:read"]);
        assert!(evaluate(&chain("movies:read"), &user(true), &source).await.is_ok());

        let result = evaluate(&chain("movies:write"), &user(true), &source).await;
        assert!(matches!(result, Err(ApiError::NotPermitted)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_internal() {
        let source = StubSource {
            fail: true,
            ..StubSource::with(vec![])
        };
        let result = evaluate(&chain("movies:read"), &user(true), &source).await;
        assert!(matches!(result, Err(ApiError::InternalError(_))));
    }
}
