// external/mod.rs - ports for the collaborators the service calls over the network
pub mod google;
pub mod imgur;
pub mod mail;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use google::{GoogleIdentityVerifier, IdentityClaims, IdentityVerifier};
pub use imgur::{ImageHost, ImgurHost};
pub use mail::{send_with_timeout, HttpMailer, LogMailer, MailMessage, Mailer};

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{0} did not answer in time")]
    Timeout(&'static str),

    #[error("Rejected by collaborator: {0}")]
    Rejected(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

/// Bounds one collaborator call by `deadline`.
pub async fn bounded<T, F>(what: &'static str, deadline: Duration, call: F) -> Result<T, ExternalError>
where
    F: Future<Output = Result<T, ExternalError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .unwrap_or(Err(ExternalError::Timeout(what)))
}

impl From<reqwest::Error> for ExternalError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExternalError::Timeout("http")
        } else {
            ExternalError::Transport(err.to_string())
        }
    }
}
