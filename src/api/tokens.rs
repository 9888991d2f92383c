use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use std::sync::Arc;

use super::context::CurrentUser;
use super::{
    ApiError, ApiResponse, AppState, AuthenticationTokenResponse, CredentialsRequest,
    EmailRequest, MessageResponse,
};

/// POST /v1/tokens/authentication
pub async fn create_authentication_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<AuthenticationTokenResponse>>), ApiError> {
    let Json(payload) = payload?;

    let token = state
        .auth_service
        .authenticate(&payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AuthenticationTokenResponse {
            authentication_token: token,
        })),
    ))
}

/// DELETE /v1/tokens/authentication
pub async fn delete_authentication_tokens(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service.logout(user.id).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "all authentication tokens have been revoked",
    ))))
}

/// POST /v1/tokens/activation
pub async fn create_activation_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let Json(payload) = payload?;
    state
        .auth_service
        .issue_activation_token(&payload.email)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(MessageResponse::new(
            "an email will be sent to you containing activation instructions",
        ))),
    ))
}

/// POST /v1/tokens/password-reset
pub async fn create_password_reset_token(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), ApiError> {
    let Json(payload) = payload?;
    state
        .auth_service
        .issue_password_reset_token(&payload.email)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(MessageResponse::new(
            "an email will be sent to you containing password reset instructions",
        ))),
    ))
}
