// external/imgur.rs - profile image hosting
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use super::ExternalError;

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Uploads the image and returns its public link.
    async fn upload(&self, bytes: Vec<u8>, filename: String) -> Result<String, ExternalError>;
}

pub struct ImgurHost {
    client: reqwest::Client,
    upload_url: String,
    access_token: String,
}

impl ImgurHost {
    pub fn new(upload_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.into(),
            access_token: access_token.into(),
        }
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    success: bool,
    #[serde(default)]
    data: Option<UploadData>,
}

#[derive(Deserialize)]
struct UploadData {
    #[serde(default)]
    link: String,
}

impl UploadResponse {
    fn into_link(self) -> Result<String, ExternalError> {
        match self.data {
            Some(data) if self.success && !data.link.is_empty() => Ok(data.link),
            _ => Err(ExternalError::Rejected("image host refused the upload".to_string())),
        }
    }
}

#[async_trait]
impl ImageHost for ImgurHost {
    async fn upload(&self, bytes: Vec<u8>, filename: String) -> Result<String, ExternalError> {
        let form = Form::new().part("image", Part::bytes(bytes).file_name(filename));
        let response = self
            .client
            .post(&self.upload_url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ExternalError::Transport(format!("unreadable upload response: {}", e)))?;
        body.into_link()
    }
}
