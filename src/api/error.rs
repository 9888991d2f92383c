use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::AuthError;
use crate::validation::FieldErrors;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),

    Validation(FieldErrors),

    InvalidCredentials,

    InvalidAuthenticationToken,

    AuthenticationRequired,

    InactiveAccount,

    NotPermitted,

    NotFound,

    EditConflict,

    DuplicateEmail,

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            Self::Validation(fields) => write!(f, "Validation failed: {fields}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            _ => f.write_str(self.public_message()),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidCredentials
            | Self::InvalidAuthenticationToken
            | Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::InactiveAccount | Self::NotPermitted => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EditConflict | Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message a client sees. Internal detail never leaves the server.
    const fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "the request body could not be parsed",
            Self::Validation(_) => "validation failed",
            Self::InvalidCredentials => "invalid authentication credentials",
            Self::InvalidAuthenticationToken => "invalid or missing authentication token",
            Self::AuthenticationRequired => "you must be authenticated to access this resource",
            Self::InactiveAccount => "your user account must be activated to access this resource",
            Self::NotPermitted => {
                "your user account doesn't have the necessary permissions to access this resource"
            }
            Self::NotFound => "the requested resource could not be found",
            Self::EditConflict => {
                "unable to update the record due to an edit conflict, please try again"
            }
            Self::DuplicateEmail => "a user with this email address already exists",
            Self::InternalError(_) => {
                "the server encountered a problem and could not process your request"
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let challenge = matches!(self, Self::InvalidAuthenticationToken);

        let body = match self {
            Self::Validation(fields) => ApiResponse::<()>::invalid(fields),
            Self::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                ApiResponse::<()>::error(msg)
            }
            Self::InternalError(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiResponse::<()>::error(self.public_message())
            }
            _ => ApiResponse::<()>::error(self.public_message()),
        };

        let mut response = (status, Json(body)).into_response();
        if challenge {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation(fields) => Self::Validation(fields),
            AuthError::InvalidCredentials => Self::InvalidCredentials,
            AuthError::NotFound => Self::NotFound,
            AuthError::EditConflict => Self::EditConflict,
            AuthError::DuplicateEmail => Self::DuplicateEmail,
            AuthError::Credential(_) | AuthError::Token(_) | AuthError::Storage(_) => {
                Self::InternalError(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_token_carries_challenge() {
        let response = ApiError::InvalidAuthenticationToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "invalid or missing authentication token");
    }

    #[tokio::test]
    async fn test_other_401s_have_no_challenge() {
        for err in [ApiError::AuthenticationRequired, ApiError::InvalidCredentials] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
        }
    }

    #[tokio::test]
    async fn test_validation_lists_fields() {
        let response = ApiError::Validation(FieldErrors::single("email", "must be provided"))
            .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let json = body_json(response).await;
        assert_eq!(json["error"], "validation failed");
        assert_eq!(json["fields"]["email"], "must be provided");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let response = ApiError::InternalError("connection refused at 10.0.0.3".to_string())
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert!(!json["error"].as_str().unwrap().contains("10.0.0.3"));
    }

    #[test]
    fn test_status_table() {
        assert_eq!(ApiError::InactiveAccount.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotPermitted.status(), StatusCode::FORBIDDEN);
        assert_ne!(
            ApiError::InactiveAccount.public_message(),
            ApiError::NotPermitted.public_message()
        );
        assert_eq!(ApiError::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::EditConflict.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_storage_errors_become_internal() {
        let err: ApiError = AuthError::Storage("timeout".to_string()).into();
        assert!(matches!(err, ApiError::InternalError(_)));

        let err: ApiError = AuthError::NotFound.into();
        assert!(matches!(err, ApiError::NotFound));
    }
}
