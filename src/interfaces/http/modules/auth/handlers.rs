//! Authentication API handlers

use std::sync::Arc;

use axum::{extract::State, Extension, Json};

use super::dto::{
    ChangePasswordRequest, ForgotPasswordRequest, ForgotPasswordResponse, LoginRequest,
    LoginResponse, MessageResponse, ResetPasswordRequest, VerifyOtpRequest, VerifyOtpResponse,
};
use crate::application::identity::{AuthService, PasswordResetService};
use crate::interfaces::http::common::{ApiError, ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;
use crate::interfaces::http::modules::users::UserDto;

#[derive(Clone)]
pub struct AuthHandlerState {
    pub auth: Arc<AuthService>,
    pub password_reset: Arc<PasswordResetService>,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Successful login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Email not found, wrong password, disabled account or no password set")
    )
)]
pub async fn login(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let result = state.auth.login(&request.email, &request.password).await?;
    Ok(Json(ApiResponse::success(LoginResponse {
        token: result.token,
        token_type: result.token_type,
        expires_in: result.expires_in,
        user: UserDto::from(result.user),
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = ApiResponse<UserDto>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_current_user(
    State(state): State<AuthHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let me = state.auth.me(&user.user_id).await?;
    Ok(Json(ApiResponse::success(UserDto::from(me))))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/change-password",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<MessageResponse>),
        (status = 401, description = "Current password is incorrect")
    )
)]
pub async fn change_password(
    State(state): State<AuthHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .auth
        .change_password(&user.user_id, &request.current_password, &request.new_password)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password changed successfully",
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP issued and mailed", body = ApiResponse<ForgotPasswordResponse>),
        (status = 404, description = "Email not found")
    )
)]
pub async fn forgot_password(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<ForgotPasswordResponse>>, ApiError> {
    let outcome = state.password_reset.forgot_password(&request.email).await?;
    Ok(Json(ApiResponse::success(ForgotPasswordResponse {
        message: outcome.message,
        reset_token: outcome.reset_token,
    })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/verify-otp",
    tag = "Authentication",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "OTP accepted", body = ApiResponse<VerifyOtpResponse>),
        (status = 400, description = "Invalid or expired OTP")
    )
)]
pub async fn verify_otp(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<ApiResponse<VerifyOtpResponse>>, ApiError> {
    let reset_token = state
        .password_reset
        .verify_otp(&request.email, &request.otp)
        .await?;
    Ok(Json(ApiResponse::success(VerifyOtpResponse { reset_token })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    tag = "Authentication",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = ApiResponse<MessageResponse>),
        (status = 400, description = "Invalid or expired reset token")
    )
)]
pub async fn reset_password(
    State(state): State<AuthHandlerState>,
    ValidatedJson(request): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_reset
        .reset_password(&request.token, &request.new_password)
        .await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password reset successfully",
    ))))
}
