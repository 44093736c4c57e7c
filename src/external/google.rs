// external/google.rs - federated identity credential verification
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::ExternalError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityClaims {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Claims of a valid credential; `Rejected` for anything the provider refuses.
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, ExternalError>;
}

pub struct GoogleIdentityVerifier {
    client: reqwest::Client,
    token_info_url: String,
    client_id: String,
}

#[derive(Deserialize)]
struct TokenInfo {
    aud: String,
    #[serde(flatten)]
    claims: IdentityClaims,
}

impl GoogleIdentityVerifier {
    pub fn new(token_info_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_info_url: token_info_url.into(),
            client_id: client_id.into(),
        }
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, ExternalError> {
        if credential.is_empty() {
            return Err(ExternalError::Rejected("empty credential".to_string()));
        }
        let response = self
            .client
            .get(&self.token_info_url)
            .query(&[("id_token", credential)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExternalError::Rejected(format!("token info answered {}", response.status())));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| ExternalError::Rejected(format!("unreadable token info: {}", e)))?;
        if info.aud != self.client_id {
            debug!(aud = %info.aud, "credential issued for another client");
            return Err(ExternalError::Rejected("audience mismatch".to_string()));
        }
        Ok(info.claims)
    }
}
