pub mod cookie;
pub mod password;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid session token")]
    InvalidToken,

    #[error("session token expired")]
    ExpiredToken,

    #[error("token signing failed: {0}")]
    Signing(String),
}

/// Issues and validates HS256 session tokens. Stateless apart from the key pair.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn issue(&self, user_id: &str, expiry: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: user_id.to_string(),
            exp: expiry.timestamp(),
            iat: Utc::now().timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Returns the user id bound to a token that is correctly signed and not yet expired.
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::ExpiredToken,
            _ => TokenError::InvalidToken,
        })?;

        if data.claims.user_id.is_empty() {
            return Err(TokenError::InvalidToken);
        }
        Ok(data.claims.user_id)
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_issue_then_validate() {
        let codec = TokenCodec::new("secret");
        let token = codec.issue("user-1", Utc::now() + Duration::days(7)).unwrap();
        assert_eq!(codec.validate(&token).unwrap(), "user-1");
    }

    #[test]
    fn test_expired_token_rejected_despite_valid_signature() {
        let codec = TokenCodec::new("secret");
        let token = codec.issue("user-1", Utc::now() - Duration::seconds(5)).unwrap();
        assert_eq!(codec.validate(&token), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let issuer = TokenCodec::new("one-secret");
        let verifier = TokenCodec::new("another-secret");
        let token = issuer.issue("user-1", Utc::now() + Duration::days(1)).unwrap();
        assert_eq!(verifier.validate(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_wrong_algorithm_rejected() {
        let claims = Claims {
            user_id: "user-1".into(),
            exp: (Utc::now() + Duration::days(1)).timestamp(),
            iat: Utc::now().timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(TokenCodec::new("secret").validate(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_missing_expiry_rejected() {
        #[derive(Serialize)]
        struct NoExpiry {
            #[serde(rename = "userID")]
            user_id: String,
        }
        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoExpiry { user_id: "user-1".into() },
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert_eq!(TokenCodec::new("secret").validate(&token), Err(TokenError::InvalidToken));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(TokenCodec::new("secret").validate("not.a.jwt"), Err(TokenError::InvalidToken));
    }
}
