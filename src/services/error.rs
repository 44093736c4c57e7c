// services/error.rs - failure taxonomy shared by every service operation
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::auth::TokenError;
use crate::database::StoreError;
use crate::external::ExternalError;
use crate::validation::InputError;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("{0}")]
    ValidationFailed(String),

    #[error("Session missing or expired")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Deadline exceeded: {0}")]
    Timeout(&'static str),

    #[error("Internal: {0}")]
    Internal(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

/// Reply for a unique-key clash the service did not anticipate.
pub const DUPLICATE_MESSAGE: &str = "資料已存在";

impl DomainError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        DomainError::MalformedRequest(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        DomainError::ValidationFailed(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        DomainError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        DomainError::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => DomainError::NotFound(what),
            StoreError::Duplicate(detail) => {
                warn!(detail = %detail, "unique key clash");
                DomainError::Conflict(DUPLICATE_MESSAGE.to_string())
            }
            other => DomainError::Internal(other.to_string()),
        }
    }
}

impl From<InputError> for DomainError {
    fn from(err: InputError) -> Self {
        DomainError::ValidationFailed(err.to_string())
    }
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken | TokenError::ExpiredToken => DomainError::Unauthenticated,
            TokenError::Signing(detail) => DomainError::Internal(detail),
        }
    }
}

impl From<ExternalError> for DomainError {
    fn from(err: ExternalError) -> Self {
        match err {
            ExternalError::Timeout(what) => DomainError::Timeout(what),
            other => DomainError::Internal(other.to_string()),
        }
    }
}

/// Runs `fut` under `deadline`.
///
/// On expiry the future is dropped, which drops any open unit of work with it
/// and so rolls it back.
pub async fn within<T, F>(deadline: Duration, fut: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::Timeout("store")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_by_kind() {
        assert_eq!(
            DomainError::from(StoreError::NotFound("user".into())),
            DomainError::NotFound("user".into())
        );
        assert_eq!(
            DomainError::from(StoreError::Duplicate("users_email_key (a@b.com)".into())),
            DomainError::Conflict(DUPLICATE_MESSAGE.into())
        );
        assert!(matches!(
            DomainError::from(StoreError::Unavailable("down".into())),
            DomainError::Internal(_)
        ));
    }

    #[test]
    fn test_token_errors_require_log_in() {
        assert_eq!(DomainError::from(TokenError::ExpiredToken), DomainError::Unauthenticated);
        assert_eq!(DomainError::from(TokenError::InvalidToken), DomainError::Unauthenticated);
    }

    #[test]
    fn test_input_error_keeps_message() {
        assert_eq!(
            DomainError::from(InputError::EmailFormat),
            DomainError::ValidationFailed("電子郵件格式錯誤".into())
        );
    }

    #[tokio::test]
    async fn test_within_times_out() {
        let result: DomainResult<()> = within(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;
        assert_eq!(result, Err(DomainError::Timeout("store")));
    }
}
