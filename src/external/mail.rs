// external/mail.rs - outbound mail delivery and the two mail templates
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::ExternalError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), ExternalError>;
}

/// Posts each message as JSON to a mail relay using basic auth.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    username: String,
    password: String,
}

impl HttpMailer {
    pub fn new(api_url: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), ExternalError> {
        let response = self
            .client
            .post(&self.api_url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&RelayRequest {
                from: &self.username,
                to: &message.to,
                subject: &message.subject,
                html: &message.html,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalError::Rejected(format!("mail relay answered {}: {}", status, body)));
        }
        info!(to = %message.to, subject = %message.subject, "mail delivered");
        Ok(())
    }
}

/// Used when no relay is configured. The message only reaches the log.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), ExternalError> {
        info!(to = %message.to, subject = %message.subject, body = %message.html, "mail relay not configured, logging mail");
        Ok(())
    }
}

/// Races delivery against `deadline`.
///
/// The send runs as its own task, so a timeout here does not cancel it; the
/// caller just stops waiting and the attempt finishes or fails on its own.
pub async fn send_with_timeout(
    mailer: Arc<dyn Mailer>,
    message: MailMessage,
    deadline: Duration,
) -> Result<(), ExternalError> {
    let to = message.to.clone();
    info!(to = %to, "sending mail");
    let delivery = tokio::spawn(async move {
        let to = message.to.clone();
        let result = mailer.send(message).await;
        if let Err(err) = &result {
            warn!(to = %to, error = %err, "mail delivery failed");
        }
        result
    });

    match tokio::time::timeout(deadline, delivery).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ExternalError::Transport(join_err.to_string())),
        Err(_) => {
            warn!(to = %to, ?deadline, "mail delivery still pending after deadline");
            Err(ExternalError::Timeout("mail"))
        }
    }
}

const ACTIVATION_TEMPLATE: &str = r#"<div style="font-family: sans-serif">
<p>親愛的 {{email}} 您好</p>
<p>請點擊以下連結完成電子郵件開通驗證，連結將於5分鐘後失效</p>
<p><a href="{{data}}">{{data}}</a></p>
<p>若您沒有申請註冊，請忽略此信件</p>
</div>"#;

const CODE_TEMPLATE: &str = r#"<div style="font-family: sans-serif">
<p>親愛的 {{email}} 您好</p>
<p>您的驗證碼為 <b>{{data}}</b>，將於5分鐘後失效</p>
<p>若您沒有提出此申請，請忽略此信件</p>
</div>"#;

fn render(template: &str, email: &str, data: &str) -> String {
    template.replace("{{email}}", email).replace("{{data}}", data)
}

pub fn activation_mail(email: &str, link: &str) -> MailMessage {
    MailMessage {
        to: email.to_string(),
        subject: "電子郵件開通驗證".to_string(),
        html: render(ACTIVATION_TEMPLATE, email, link),
    }
}

pub fn code_mail(email: &str, subject: &str, code: u32) -> MailMessage {
    MailMessage {
        to: email.to_string(),
        subject: subject.to_string(),
        html: render(CODE_TEMPLATE, email, &code.to_string()),
    }
}
