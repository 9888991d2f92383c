use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::context::CurrentUser;
use super::{
    ActivateUserRequest, ApiError, ApiResponse, AppState, GrantPermissionsRequest, GrantResponse,
    MessageResponse, RegisterUserRequest, ResetPasswordRequest,
};
use crate::models::{Permissions, User};
use crate::services::RegisterInput;

/// POST /v1/users
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    let Json(payload) = payload?;

    let user = state
        .auth_service
        .register(RegisterInput {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(user))))
}

/// PUT /v1/users/activated
pub async fn activate_user(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ActivateUserRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let Json(payload) = payload?;
    let user = state.auth_service.activate(&payload.token).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// PUT /v1/users/password
pub async fn update_user_password(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ResetPasswordRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let Json(payload) = payload?;

    state
        .auth_service
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "your password was successfully reset",
    ))))
}

/// GET /v1/users/me
pub async fn show_current_user(CurrentUser(user): CurrentUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::success(user))
}

/// GET /v1/users/me/permissions
pub async fn list_current_permissions(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<ApiResponse<Permissions>>, ApiError> {
    let permissions = state.auth_service.permissions_for(user.id).await?;
    Ok(Json(ApiResponse::success(permissions)))
}

/// POST /v1/users/{id}/permissions
pub async fn grant_permissions(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<GrantPermissionsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<GrantResponse>>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    let Json(payload) = payload?;

    let granted = state
        .auth_service
        .grant_permissions(id, &payload.codes)
        .await?;

    Ok(Json(ApiResponse::success(GrantResponse { granted })))
}
