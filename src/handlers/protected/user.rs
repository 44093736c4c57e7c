// handlers/protected/user.rs - session-scoped reads and user-owned mutations
use axum::extract::{Multipart, State};
use tracing::warn;

use crate::app::AppState;
use crate::database::models::Mail;
use crate::error::ApiError;
use crate::middleware::gate::{Gate, MISSING_FIELD_MESSAGE, NOT_SAME_USER_MESSAGE};
use crate::middleware::{ApiResponse, ApiResult, Authorized, MessagePayload, Session, UserPath};
use crate::types::{
    ChangeUserEmailRequest, ChangeUserNameRequest, CreateFeedbackRequest, LogErrorRequest, ReadMailRequest,
    RecentVisitResponse, UserWordSetRequest,
};

/// GET /getMails/:userID - newest first
pub async fn get_mails(State(state): State<AppState>, UserPath(user_id): UserPath) -> ApiResult<Vec<Mail>> {
    Ok(ApiResponse::success(state.services.activity.mails(&user_id).await?))
}

/// GET /getUnreadMailsCnt/:userID
pub async fn get_unread_mails_cnt(State(state): State<AppState>, UserPath(user_id): UserPath) -> ApiResult<usize> {
    Ok(ApiResponse::success(state.services.activity.unread_count(&user_id).await?))
}

/// GET /getRecentVisit/:userID - in visit order, newest first
pub async fn get_recent_visit(
    State(state): State<AppState>,
    UserPath(user_id): UserPath,
) -> ApiResult<RecentVisitResponse> {
    Ok(ApiResponse::success(state.services.activity.recent_visits(&user_id).await?))
}

/// POST /changeUserName
pub async fn change_user_name(
    State(state): State<AppState>,
    auth: Authorized<ChangeUserNameRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .accounts
        .change_name(&auth.user_id, &auth.request.new_name)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /changeUserEmail - needs an `account` code for the new address
pub async fn change_user_email(
    State(state): State<AppState>,
    auth: Authorized<ChangeUserEmailRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.accounts.change_email(request).await?;
    Ok(gate.acknowledge(None))
}

/// POST /changeUserImage - multipart `userID` and `image`; returns the hosted link
pub async fn change_user_image(
    State(state): State<AppState>,
    Session(user_id): Session,
    mut multipart: Multipart,
) -> ApiResult<MessagePayload> {
    let mut claimed_user = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(user_id = %user_id, error = %e, "unreadable multipart body");
        ApiError::bad_request(MISSING_FIELD_MESSAGE)
    })? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("userID") => {
                claimed_user = Some(field.text().await.map_err(|_| ApiError::bad_request(MISSING_FIELD_MESSAGE))?);
            }
            Some("image") => {
                let filename = field.file_name().unwrap_or("image").to_string();
                let bytes = field.bytes().await.map_err(|_| ApiError::bad_request(MISSING_FIELD_MESSAGE))?;
                image = Some((bytes.to_vec(), filename));
            }
            _ => {}
        }
    }

    let (claimed_user, (bytes, filename)) = match (claimed_user, image) {
        (Some(claimed), Some(image)) if !claimed.is_empty() && !image.0.is_empty() => (claimed, image),
        _ => return Err(ApiError::bad_request(MISSING_FIELD_MESSAGE)),
    };
    if claimed_user != user_id {
        warn!(user_id = %user_id, claimed_user = %claimed_user, "image upload for another user");
        return Err(ApiError::forbidden(NOT_SAME_USER_MESSAGE));
    }

    let link = state.services.accounts.change_image(&user_id, bytes, filename).await?;
    Ok(Gate::User.acknowledge(Some(link)))
}

/// POST /readMail
pub async fn read_mail(State(state): State<AppState>, auth: Authorized<ReadMailRequest>) -> ApiResult<MessagePayload> {
    state
        .services
        .activity
        .read_mail(&auth.user_id, &auth.request.mail_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /addRecentVisit
pub async fn add_recent_visit(
    State(state): State<AppState>,
    auth: Authorized<UserWordSetRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .activity
        .add_recent_visit(&auth.user_id, &auth.request.word_set_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /createFeedback
pub async fn create_feedback(
    State(state): State<AppState>,
    auth: Authorized<CreateFeedbackRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.activity.create_feedback(request).await?;
    Ok(gate.acknowledge(None))
}

/// POST /logError - client side error report
pub async fn log_error(State(state): State<AppState>, auth: Authorized<LogErrorRequest>) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.activity.log_error(request).await?;
    Ok(gate.acknowledge(None))
}
