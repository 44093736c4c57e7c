// middleware/gate.rs - request gates: session, structural validation, ownership
//
// Every gated handler runs the same pipeline in the same order:
//   1. a valid session cookie
//   2. a body that decodes and carries every required field
//   3. the caller owns what the request touches
// so a request fails at the earliest stage that applies to it.
use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::auth::cookie::session_token;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, MessagePayload};
use crate::services::DomainError;

pub const MISSING_FIELD_MESSAGE: &str = "請求缺少必要欄位";
pub const BAD_FORMAT_MESSAGE: &str = "請求格式錯誤";
pub const NOT_SAME_USER_MESSAGE: &str = "使用者無權限變更";
pub const NOT_AUTHOR_MESSAGE: &str = "使用者無權限更改!";
pub const PATH_USER_MESSAGE: &str = "使用者無權限";
pub const USER_GATE_MESSAGE: &str = "使用者操作成功";
pub const WORD_SET_GATE_MESSAGE: &str = "使用者/單字集驗證成功";

/// Whose permission a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner<'a> {
    /// The acting user id embedded in the body
    User(&'a str),
    /// A word set id; its stored author must be the caller
    WordSet(&'a str),
}

/// A request body that can pass through [`Authorized`].
pub trait Gated: DeserializeOwned + Send + 'static {
    fn owner(&self) -> Owner<'_>;

    /// String fields that must be non-empty besides the owner id.
    fn required(&self) -> Vec<&str> {
        Vec::new()
    }

    fn has_content(&self) -> bool {
        true
    }
}

/// Which gate let the request through; decides the default acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    User,
    WordSet,
}

impl Gate {
    /// `{message: id}` when the operation produced an id, the gate's default message otherwise.
    pub fn acknowledge(self, id: Option<String>) -> ApiResponse<MessagePayload> {
        match id {
            Some(id) => ApiResponse::message(id),
            None => ApiResponse::message(match self {
                Gate::User => USER_GATE_MESSAGE,
                Gate::WordSet => WORD_SET_GATE_MESSAGE,
            }),
        }
    }
}

/// The caller's user id, taken from a valid session cookie.
#[derive(Debug, Clone)]
pub struct Session(pub String);

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or_else(ApiError::log_in_required)?;
        let user_id = state.tokens.validate(&token).map_err(|e| {
            debug!(error = %e, "session rejected");
            ApiError::from(DomainError::from(e))
        })?;
        Ok(Session(user_id))
    }
}

/// Session whose user is also the `{userID}` path segment.
#[derive(Debug, Clone)]
pub struct UserPath(pub String);

#[async_trait]
impl FromRequestParts<AppState> for UserPath {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Session(user_id) = Session::from_request_parts(parts, state).await?;
        let Path(path_id) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::bad_request(BAD_FORMAT_MESSAGE))?;
        if path_id != user_id {
            warn!(user_id = %user_id, path_id = %path_id, "path user does not match session");
            return Err(ApiError::forbidden(PATH_USER_MESSAGE));
        }
        Ok(UserPath(user_id))
    }
}

/// A decoded request body that passed all three gate stages.
#[derive(Debug)]
pub struct Authorized<R> {
    pub user_id: String,
    pub request: R,
    pub gate: Gate,
}

#[async_trait]
impl<R: Gated> FromRequest<AppState> for Authorized<R> {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (mut parts, body) = req.into_parts();
        let Session(user_id) = Session::from_request_parts(&mut parts, state).await?;

        let req = Request::from_parts(parts, body);
        let request: R = read_json(req, state).await?;
        check_structure(&request)?;

        let gate = match request.owner() {
            Owner::User(owner_id) => {
                if owner_id != user_id {
                    warn!(user_id = %user_id, owner_id, "acting user does not match session");
                    return Err(ApiError::forbidden(NOT_SAME_USER_MESSAGE));
                }
                Gate::User
            }
            Owner::WordSet(word_set_id) => {
                let author_id = state.services.word_sets.author_of(word_set_id).await?;
                if author_id != user_id {
                    warn!(user_id = %user_id, word_set_id, "caller is not the word set author");
                    return Err(ApiError::forbidden(NOT_AUTHOR_MESSAGE));
                }
                Gate::WordSet
            }
        };

        Ok(Authorized { user_id, request, gate })
    }
}

/// JSON body for ungated endpoints, rejected with the same envelope as gated ones.
#[derive(Debug)]
pub struct Body<T>(pub T);

#[async_trait]
impl<T: DeserializeOwned + Send> FromRequest<AppState> for Body<T> {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Body(read_json(req, state).await?))
    }
}

fn check_structure<R: Gated>(request: &R) -> Result<(), ApiError> {
    let owner_id = match request.owner() {
        Owner::User(id) | Owner::WordSet(id) => id,
    };
    if owner_id.is_empty() || request.required().iter().any(|field| field.is_empty()) || !request.has_content() {
        return Err(ApiError::bad_request(MISSING_FIELD_MESSAGE));
    }
    Ok(())
}

/// Bodies are decoded as JSON whatever `Content-Type` says.
async fn read_json<T: DeserializeOwned>(req: Request, state: &AppState) -> Result<T, ApiError> {
    let bytes = Bytes::from_request(req, state).await.map_err(|e| {
        debug!(error = %e, "request body unreadable");
        ApiError::bad_request(BAD_FORMAT_MESSAGE)
    })?;
    decode_json(&bytes)
}

/// Missing or mistyped fields are reported apart from bodies that are not JSON at all.
fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(bytes).map_err(|e| {
        debug!(error = %e, "request body rejected");
        match e.classify() {
            Category::Data => ApiError::bad_request(MISSING_FIELD_MESSAGE),
            Category::Io | Category::Syntax | Category::Eof => ApiError::bad_request(BAD_FORMAT_MESSAGE),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{UserWordSetRequest, WordSetRequest};

    #[test]
    fn test_structure_rejects_empty_owner_and_fields() {
        let empty_owner = WordSetRequest {
            word_set_id: String::new(),
        };
        assert!(matches!(check_structure(&empty_owner), Err(ApiError::BadRequest(_))));

        let empty_field = UserWordSetRequest {
            user_id: "u1".into(),
            word_set_id: String::new(),
        };
        assert_eq!(
            check_structure(&empty_field).unwrap_err().message(),
            MISSING_FIELD_MESSAGE
        );

        let complete = UserWordSetRequest {
            user_id: "u1".into(),
            word_set_id: "ws1".into(),
        };
        assert!(check_structure(&complete).is_ok());
    }

    #[test]
    fn test_decode_separates_missing_fields_from_bad_json() {
        let request: WordSetRequest = decode_json(br#"{"wordSetID":"ws1"}"#).unwrap();
        assert_eq!(request.word_set_id, "ws1");

        let missing = decode_json::<WordSetRequest>(br#"{"title":"x"}"#).unwrap_err();
        assert_eq!(missing.message(), MISSING_FIELD_MESSAGE);

        let garbled = decode_json::<WordSetRequest>(b"wordSetID=ws1").unwrap_err();
        assert_eq!(garbled.message(), BAD_FORMAT_MESSAGE);

        let empty = decode_json::<WordSetRequest>(b"").unwrap_err();
        assert_eq!(empty.message(), BAD_FORMAT_MESSAGE);
    }

    #[test]
    fn test_acknowledge_defaults_by_gate() {
        assert_eq!(Gate::User.acknowledge(None).data.message, USER_GATE_MESSAGE);
        assert_eq!(Gate::WordSet.acknowledge(None).data.message, WORD_SET_GATE_MESSAGE);
        assert_eq!(Gate::User.acknowledge(Some("ws9".into())).data.message, "ws9");
    }
}
