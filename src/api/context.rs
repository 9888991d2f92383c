//! Per-request identity, stored in the request's extensions.

use axum::{extract::FromRequestParts, extract::Request, http::request::Parts};

use super::ApiError;
use crate::models::{Identity, User};

pub fn set_identity(req: &mut Request, identity: Identity) {
    req.extensions_mut().insert(identity);
}

/// # Panics
///
/// If the `authenticate` middleware has not run for this request.
#[must_use]
pub fn identity(req: &Request) -> &Identity {
    req.extensions()
        .get::<Identity>()
        .expect("identity read before the authenticate middleware ran")
}

/// The authenticated user, for handlers behind a guard.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Authenticated(user)) => Ok(Self(user.clone())),
            Some(Identity::Anonymous) => Err(ApiError::AuthenticationRequired),
            None => Err(ApiError::InternalError(
                "identity missing from request extensions".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_round_trip() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        set_identity(&mut req, Identity::Anonymous);
        assert!(identity(&req).is_anonymous());
    }

    #[test]
    #[should_panic(expected = "identity read before")]
    fn test_missing_identity_panics() {
        let req = Request::builder().body(Body::empty()).unwrap();
        let _ = identity(&req);
    }

    #[tokio::test]
    async fn test_current_user_rejects_anonymous() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        set_identity(&mut req, Identity::Anonymous);
        let (mut parts, _) = req.into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(ApiError::AuthenticationRequired)));
    }
}
