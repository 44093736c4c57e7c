// handlers/public/account.rs - registration, log in and session cookie handling
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use tracing::info;

use crate::app::AppState;
use crate::auth::cookie::{cleared_cookie, session_cookie, set_cookie_header};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Body, Session};
use crate::types::{
    AccountPasswordLogInRequest, AccountPasswordRegisterRequest, CredentialRequest, FrontEndUser, UserLink,
};

pub const LOGGED_OUT_MESSAGE: &str = "登出成功";

/// Issues a session for `user` and answers with the client-side user record.
fn signed_in(state: &AppState, user: &User) -> Result<Response, ApiError> {
    let expiry = Utc::now() + Duration::days(state.config.session.expiry_days);
    let token = state.tokens.issue(&user.id, expiry).map_err(|e| {
        tracing::error!(user_id = %user.id, error = %e, "failed to sign session");
        ApiError::internal_server_error()
    })?;
    let cookie = session_cookie(&token, expiry, state.config.session.cookie_domain.as_deref());

    let mut response = ApiResponse::success(FrontEndUser::from(user)).into_response();
    if let Some((name, value)) = set_cookie_header(&cookie) {
        response.headers_mut().insert(name, value);
    }
    Ok(response)
}

/// GET /checkLogIn - the signed-in user behind the session cookie
pub async fn check_log_in(State(state): State<AppState>, Session(user_id): Session) -> ApiResult<FrontEndUser> {
    let user = state.services.accounts.session_user(&user_id).await?;
    Ok(ApiResponse::success(FrontEndUser::from(&user)))
}

/// POST /accountPasswordRegister - password account from an activated email
pub async fn account_password_register(
    State(state): State<AppState>,
    Body(request): Body<AccountPasswordRegisterRequest>,
) -> Result<Response, ApiError> {
    let user = state.services.accounts.register_with_password(request).await?;
    signed_in(&state, &user)
}

/// POST /OAuthRegister - federated account from an identity credential
pub async fn oauth_register(
    State(state): State<AppState>,
    Body(request): Body<CredentialRequest>,
) -> Result<Response, ApiError> {
    let user = state.services.accounts.register_with_credential(&request.credential).await?;
    signed_in(&state, &user)
}

/// POST /accountPasswordLogIn
pub async fn account_password_log_in(
    State(state): State<AppState>,
    Body(request): Body<AccountPasswordLogInRequest>,
) -> Result<Response, ApiError> {
    let user = state.services.accounts.log_in_with_password(request).await?;
    signed_in(&state, &user)
}

/// POST /OAuthLogIn
pub async fn oauth_log_in(
    State(state): State<AppState>,
    Body(request): Body<CredentialRequest>,
) -> Result<Response, ApiError> {
    let user = state.services.accounts.log_in_with_credential(&request.credential).await?;
    signed_in(&state, &user)
}

/// POST /logOut - overwrites the session cookie with an expired one
pub async fn log_out(State(state): State<AppState>) -> Response {
    let cookie = cleared_cookie(state.config.session.cookie_domain.as_deref());
    let mut response = ApiResponse::message(LOGGED_OUT_MESSAGE).into_response();
    if let Some((name, value)) = set_cookie_header(&cookie) {
        response.headers_mut().insert(name, value);
    }
    info!("session cleared");
    response
}

/// GET /getUserLink/:userID - public name card of a user
pub async fn get_user_link(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<UserLink> {
    let user = state.services.accounts.user(&user_id).await?;
    Ok(ApiResponse::success(UserLink::from(&user)))
}
