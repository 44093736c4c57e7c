// services/verification_service.rs - six-digit codes, password reset and email activation
//
// Both flows follow the same record lifecycle: a request stores a record that
// expires after RECORD_TTL_SECS, a repeat request is refused while less than
// RESEND_BUFFER_SECS of that window has passed, and the record is deleted
// once it has been used.
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::error::{within, DomainError, DomainResult};
use crate::auth::password::{hash_secret, six_digit_code, verify_secret};
use crate::database::models::{now, ActivationRecord, CodePurpose, VerificationCode};
use crate::database::Store;
use crate::external::mail::{activation_mail, code_mail};
use crate::external::{send_with_timeout, Mailer};
use crate::types::ResetPasswordRequest;
use crate::validation::{validate_email, validate_new_password};

pub const RECORD_TTL_SECS: i64 = 300;
pub const RESEND_BUFFER_SECS: i64 = 180;
pub const ACTIVATION_TOKEN_LEN: usize = 36;

pub const CODE_SENT_MESSAGE: &str = "驗證碼已寄出!";
pub const PASSWORD_RESET_MESSAGE: &str = "更改密碼成功";
pub const ACTIVATION_SENT_MESSAGE: &str = "開通郵件已寄出";
pub const ACTIVATED_MESSAGE: &str = "郵件開通成功 請關閉頁面~";

pub const BAD_MODE_MESSAGE: &str = "請求格式錯誤";
pub const UNKNOWN_ACCOUNT_MESSAGE: &str = "此帳號不存在";
pub const FEDERATED_PASSWORD_MESSAGE: &str = "第三方登入帳戶不得更改密碼喔!";
pub const ACCOUNT_TAKEN_MESSAGE: &str = "此帳號已註冊";
pub const CODE_RESEND_MESSAGE: &str = "請勿在3分鐘內重複申請驗證碼";
pub const NO_CODE_MESSAGE: &str = "查無驗證碼";
pub const WRONG_CODE_MESSAGE: &str = "驗證碼錯誤";
pub const CODE_EXPIRED_MESSAGE: &str = "驗證碼失效";
pub const EMAIL_TAKEN_MESSAGE: &str = "該電子郵件已被註冊";
pub const ACTIVATION_RESEND_MESSAGE: &str = "請勿在3分鐘內重複請求";
pub const BAD_TOKEN_MESSAGE: &str = "權證錯誤";
pub const TOKEN_EXPIRED_MESSAGE: &str = "權證過期";
pub const ALREADY_ACTIVATED_MESSAGE: &str = "請勿重複驗證";

pub struct VerificationService {
    store: Arc<dyn Store>,
    deadline: Duration,
    frontend_origin: String,
    mailer: Arc<dyn Mailer>,
}

/// True while a stored record is too fresh to be replaced.
fn within_resend_buffer(expire: i64) -> bool {
    expire > now() + RESEND_BUFFER_SECS
}

impl VerificationService {
    pub fn new(store: Arc<dyn Store>, deadline: Duration, frontend_origin: String, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            store,
            deadline,
            frontend_origin,
            mailer,
        }
    }

    /// Mails a fresh code for an email change (`account`) or a password reset (`password`).
    pub async fn request_code(&self, mode: &str, email: &str) -> DomainResult<&'static str> {
        let purpose = CodePurpose::parse(mode).ok_or_else(|| DomainError::malformed(BAD_MODE_MESSAGE))?;
        let email = validate_email(email)?;

        within(self.deadline, self.check_code_request(purpose, &email)).await?;

        let code = six_digit_code();
        send_with_timeout(
            self.mailer.clone(),
            code_mail(&email, purpose.mail_subject(), code),
            self.deadline,
        )
        .await?;

        let code_hash =
            hash_secret(&code.to_string()).map_err(|e| DomainError::internal(format!("hash code: {}", e)))?;
        let record = VerificationCode {
            purpose,
            email: email.clone(),
            code_hash,
            expire: now() + RECORD_TTL_SECS,
        };
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.save_verification_code(&record).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!(email = %email, purpose = purpose.as_str(), "verification code issued");
        Ok(CODE_SENT_MESSAGE)
    }

    async fn check_code_request(&self, purpose: CodePurpose, email: &str) -> DomainResult<()> {
        let mut tx = self.store.begin().await?;
        let account = tx.user_by_email(email).await?;
        match purpose {
            CodePurpose::Password => {
                let user = account.ok_or_else(|| DomainError::not_found(UNKNOWN_ACCOUNT_MESSAGE))?;
                if user.is_google {
                    return Err(DomainError::invalid(FEDERATED_PASSWORD_MESSAGE));
                }
            }
            CodePurpose::Account => {
                if account.is_some() {
                    return Err(DomainError::conflict(ACCOUNT_TAKEN_MESSAGE));
                }
            }
        }

        if let Some(existing) = tx.verification_code(purpose, email).await? {
            if within_resend_buffer(existing.expire) {
                return Err(DomainError::invalid(CODE_RESEND_MESSAGE));
            }
        }
        Ok(())
    }

    /// Sets a new password from a `password` code and consumes the code.
    pub async fn reset_password(&self, request: ResetPasswordRequest) -> DomainResult<&'static str> {
        let email = validate_email(&request.email)?;
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let code = tx
                .verification_code(CodePurpose::Password, &email)
                .await?
                .ok_or_else(|| DomainError::not_found(NO_CODE_MESSAGE))?;
            if !verify_secret(request.validate_code.trim(), &code.code_hash) {
                return Err(DomainError::invalid(WRONG_CODE_MESSAGE));
            }
            if code.expire < now() {
                return Err(DomainError::invalid(CODE_EXPIRED_MESSAGE));
            }
            validate_new_password(&request.password, &request.re_password)?;

            let mut user = tx
                .user_by_email(&email)
                .await?
                .ok_or_else(|| DomainError::not_found(UNKNOWN_ACCOUNT_MESSAGE))?;
            let hash =
                hash_secret(&request.password).map_err(|e| DomainError::internal(format!("hash password: {}", e)))?;
            user.password = Some(hash);
            tx.save_user(&user).await?;
            tx.delete_verification_code(CodePurpose::Password, &email).await?;
            tx.commit().await?;

            info!(user_id = %user.id, "password reset");
            Ok(PASSWORD_RESET_MESSAGE)
        })
        .await
    }

    /// Mails an activation link for an address that is not registered yet.
    pub async fn send_activation(&self, email: &str) -> DomainResult<&'static str> {
        let email = validate_email(email)?;
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            if tx.user_by_email(&email).await?.is_some() {
                return Err(DomainError::conflict(EMAIL_TAKEN_MESSAGE));
            }
            if let Some(existing) = tx.activation(&email).await? {
                if within_resend_buffer(existing.expire) {
                    return Err(DomainError::invalid(ACTIVATION_RESEND_MESSAGE));
                }
            }
            Ok(())
        })
        .await?;

        let token = uuid::Uuid::new_v4().to_string();
        let link = format!("{}/activateEmail/{}", self.frontend_origin.trim_end_matches('/'), token);
        send_with_timeout(self.mailer.clone(), activation_mail(&email, &link), self.deadline).await?;

        let record = ActivationRecord {
            email: email.clone(),
            token,
            expire: now() + RECORD_TTL_SECS,
            activated: false,
        };
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.save_activation(&record).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;

        info!(email = %email, "activation mail sent");
        Ok(ACTIVATION_SENT_MESSAGE)
    }

    /// Marks the address behind `token` as activated and opens the registration window.
    pub async fn activate(&self, token: &str) -> DomainResult<&'static str> {
        let token = token.trim();
        if token.len() != ACTIVATION_TOKEN_LEN {
            return Err(DomainError::invalid(BAD_TOKEN_MESSAGE));
        }
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut record = tx
                .activation_by_token(token)
                .await?
                .ok_or_else(|| DomainError::invalid(BAD_TOKEN_MESSAGE))?;
            if record.expire < now() {
                return Err(DomainError::invalid(TOKEN_EXPIRED_MESSAGE));
            }
            if record.activated {
                return Err(DomainError::conflict(ALREADY_ACTIVATED_MESSAGE));
            }

            record.activated = true;
            record.expire = now() + RECORD_TTL_SECS;
            tx.save_activation(&record).await?;
            tx.commit().await?;

            info!(email = %record.email, "email activated");
            Ok(ACTIVATED_MESSAGE)
        })
        .await
    }
}
