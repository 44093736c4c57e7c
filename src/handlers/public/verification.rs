// handlers/public/verification.rs - verification codes, password reset and email activation
use axum::extract::{Query, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, Body, MessagePayload};
use crate::types::{ActivateEmailRequest, ChangeModeQuery, EmailRequest, ResetPasswordRequest};

/// POST /requestValidateCode?changeMode=account|password
pub async fn request_validate_code(
    State(state): State<AppState>,
    Query(query): Query<ChangeModeQuery>,
    Body(request): Body<EmailRequest>,
) -> ApiResult<MessagePayload> {
    let message = state
        .services
        .verification
        .request_code(&query.change_mode, &request.email)
        .await?;
    Ok(ApiResponse::message(message))
}

/// POST /resetPassword
pub async fn reset_password(
    State(state): State<AppState>,
    Body(request): Body<ResetPasswordRequest>,
) -> ApiResult<MessagePayload> {
    let message = state.services.verification.reset_password(request).await?;
    Ok(ApiResponse::message(message))
}

/// POST /sendActivationEmail
pub async fn send_activation_email(
    State(state): State<AppState>,
    Body(request): Body<EmailRequest>,
) -> ApiResult<MessagePayload> {
    let message = state.services.verification.send_activation(&request.email).await?;
    Ok(ApiResponse::message(message))
}

/// POST /activateEmail
pub async fn activate_email(
    State(state): State<AppState>,
    Body(request): Body<ActivateEmailRequest>,
) -> ApiResult<MessagePayload> {
    let message = state.services.verification.activate(&request.token).await?;
    Ok(ApiResponse::message(message))
}
