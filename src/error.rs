// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::services::error::DomainError;

pub const SERVER_ERROR_MESSAGE: &str = "伺服器錯誤 請重試";
pub const TIMEOUT_MESSAGE: &str = "超時錯誤 請重試";
pub const MAIL_TIMEOUT_MESSAGE: &str = "寄送郵件逾時，請稍後再試";
pub const LOG_IN_REQUIRED_MESSAGE: &str = "使用者未登入! 或憑證已過期!";

/// HTTP API error. Every variant renders the `{type, payload: {message}}` envelope.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized, rendered as "To Log In" so the client drops its session
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 422 Unprocessable Entity (well-formed request breaking a domain rule)
    UnprocessableEntity(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 504 Gateway Timeout (store or collaborator exceeded its deadline)
    GatewayTimeout(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::UnprocessableEntity(_) => 422,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::GatewayTimeout(_) => 504,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::UnprocessableEntity(msg)
            | ApiError::TooManyRequests(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::GatewayTimeout(msg) => msg,
        }
    }

    /// Envelope discriminator the web client switches on
    pub fn envelope_type(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "To Log In",
            _ => "Error",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "type": self.envelope_type(),
            "payload": { "message": self.message() }
        })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn log_in_required() -> Self {
        ApiError::Unauthorized(LOG_IN_REQUIRED_MESSAGE.to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn unprocessable_entity(message: impl Into<String>) -> Self {
        ApiError::UnprocessableEntity(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalServerError(SERVER_ERROR_MESSAGE.to_string())
    }

    pub fn gateway_timeout() -> Self {
        ApiError::GatewayTimeout(TIMEOUT_MESSAGE.to_string())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::MalformedRequest(msg) => ApiError::bad_request(msg),
            DomainError::ValidationFailed(msg) => ApiError::unprocessable_entity(msg),
            DomainError::Unauthenticated => ApiError::log_in_required(),
            DomainError::Forbidden(msg) => ApiError::forbidden(msg),
            DomainError::NotFound(msg) => ApiError::not_found(msg),
            DomainError::Conflict(msg) => ApiError::conflict(msg),
            DomainError::Timeout("mail") => {
                tracing::error!("mail delivery exceeded its deadline");
                ApiError::GatewayTimeout(MAIL_TIMEOUT_MESSAGE.to_string())
            }
            DomainError::Timeout(what) => {
                // Log the real cause but return generic message
                tracing::error!(operation = %what, "deadline exceeded");
                ApiError::gateway_timeout()
            }
            DomainError::Internal(detail) => {
                tracing::error!("internal failure: {}", detail);
                ApiError::internal_server_error()
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthenticated_renders_log_in_envelope() {
        let err = ApiError::from(DomainError::Unauthenticated);
        assert_eq!(err.status_code(), 401);
        assert_eq!(
            err.to_json(),
            json!({"type": "To Log In", "payload": {"message": LOG_IN_REQUIRED_MESSAGE}})
        );
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = ApiError::from(DomainError::Internal("relation \"users\" does not exist".into()));
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), SERVER_ERROR_MESSAGE);
        assert_eq!(err.envelope_type(), "Error");
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        let err = ApiError::from(DomainError::Timeout("store"));
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.message(), TIMEOUT_MESSAGE);

        let err = ApiError::from(DomainError::Timeout("mail"));
        assert_eq!(err.status_code(), 504);
        assert_eq!(err.message(), MAIL_TIMEOUT_MESSAGE);
    }

    #[test]
    fn test_business_rejections_keep_their_message() {
        let err = ApiError::from(DomainError::Conflict("請勿重複驗證".into()));
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), "請勿重複驗證");

        let err = ApiError::from(DomainError::ValidationFailed("密碼長度須為8至20".into()));
        assert_eq!(err.status_code(), 422);
    }
}
