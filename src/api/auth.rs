//! Resolves the bearer token on every request into an [`Identity`].

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, AppState, context, observability};
use crate::models::{Identity, Scope};
use crate::services::AuthError;
use crate::validation::is_token_plaintext;

/// Attaches the caller's identity to the request. A missing or empty
/// `Authorization` header means anonymous; anything else that is unusable
/// is rejected outright. `Vary: Authorization` is added by the router's
/// outermost layer so that it also covers timeouts and panics.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let authorization = request.headers().get(header::AUTHORIZATION).cloned();

    match resolve(&state, authorization).await {
        Ok(identity) => {
            observability::record_identity(identity.user().map(|u| u.id));
            context::set_identity(&mut request, identity);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

async fn resolve(
    state: &AppState,
    authorization: Option<HeaderValue>,
) -> Result<Identity, ApiError> {
    let Some(authorization) = authorization.filter(|v| !v.is_empty()) else {
        return Ok(Identity::Anonymous);
    };

    let value = authorization
        .to_str()
        .map_err(|_| ApiError::InvalidAuthenticationToken)?;
    let token = parse_bearer(value).ok_or(ApiError::InvalidAuthenticationToken)?;

    if !is_token_plaintext(token) {
        return Err(ApiError::InvalidAuthenticationToken);
    }

    match state
        .auth_service
        .user_for_token(Scope::Authentication, token)
        .await
    {
        Ok(user) => Ok(Identity::Authenticated(user)),
        Err(AuthError::NotFound) => Err(ApiError::InvalidAuthenticationToken),
        Err(e) => Err(ApiError::InternalError(format!(
            "Failed to resolve authentication token: {e}"
        ))),
    }
}

/// `Bearer <token>`, split on a single space into exactly two parts.
fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}
