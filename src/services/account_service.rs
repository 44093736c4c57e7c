// services/account_service.rs - registration, log in and profile changes
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::error::{within, DomainError, DomainResult};
use super::USER_NOT_FOUND;
use crate::auth::password::{hash_secret, verify_secret};
use crate::database::models::{new_id, now, CodePurpose, Mail, RecentVisit, User};
use crate::database::{Store, StoreError};
use crate::external::{bounded, ExternalError, IdentityClaims, IdentityVerifier, ImageHost};
use crate::types::{AccountPasswordLogInRequest, AccountPasswordRegisterRequest, ChangeUserEmailRequest};
use crate::validation::{validate_email, validate_name, validate_new_password};

pub const NOT_REQUESTED_MESSAGE: &str = "此電子郵件尚未申請驗證";
pub const NOT_ACTIVATED_MESSAGE: &str = "此電子郵件尚未通過開通驗證";
pub const REGISTRATION_EXPIRED_MESSAGE: &str = "電子郵件超過有效註冊時間";
pub const ALREADY_REGISTERED_MESSAGE: &str = "此帳號已註冊";
pub const BAD_CREDENTIAL_MESSAGE: &str = "憑證錯誤";
pub const UNKNOWN_ACCOUNT_MESSAGE: &str = "此帳號不存在";
pub const WRONG_SIGN_IN_METHOD_MESSAGE: &str = "帳號登入錯誤";
pub const WRONG_PASSWORD_MESSAGE: &str = "使用者密碼錯誤";
pub const EMAIL_NOT_VERIFIED_MESSAGE: &str = "該電子郵件尚未驗證";
pub const WRONG_CODE_MESSAGE: &str = "驗證碼錯誤";
pub const CODE_EXPIRED_MESSAGE: &str = "驗證碼過期 請重新申請";
pub const UPLOAD_REFUSED_MESSAGE: &str = "圖片上傳遭拒 請重試";

/// Everything a new account is created from, once the inputs are checked.
struct Registration {
    name: String,
    email: String,
    password_hash: Option<String>,
    img: String,
    /// Password accounts consume their activation record.
    consume_activation: bool,
}

pub struct AccountService {
    store: Arc<dyn Store>,
    deadline: Duration,
    admin_name: String,
    identity: Arc<dyn IdentityVerifier>,
    images: Arc<dyn ImageHost>,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn Store>,
        deadline: Duration,
        admin_name: String,
        identity: Arc<dyn IdentityVerifier>,
        images: Arc<dyn ImageHost>,
    ) -> Self {
        Self {
            store,
            deadline,
            admin_name,
            identity,
            images,
        }
    }

    /// Password registration. Needs a completed, unexpired email activation.
    pub async fn register_with_password(&self, request: AccountPasswordRegisterRequest) -> DomainResult<User> {
        let name = validate_name(&request.user_name, &self.admin_name)?;
        let email = validate_email(&request.user_email)?;
        validate_new_password(&request.user_password, &request.re_user_password)?;
        let password_hash =
            hash_secret(&request.user_password).map_err(|e| DomainError::internal(format!("hash password: {}", e)))?;

        within(
            self.deadline,
            self.insert_account(Registration {
                name,
                email,
                password_hash: Some(password_hash),
                img: String::new(),
                consume_activation: true,
            }),
        )
        .await
    }

    /// Federated registration from a verified identity credential.
    pub async fn register_with_credential(&self, credential: &str) -> DomainResult<User> {
        let claims = self.verify_credential(credential).await?;
        let name = federated_name(&claims.name, &self.admin_name);
        within(
            self.deadline,
            self.insert_account(Registration {
                name,
                email: claims.email,
                password_hash: None,
                img: claims.picture,
                consume_activation: false,
            }),
        )
        .await
    }

    /// Welcome mail, user and empty visit record are created together.
    async fn insert_account(&self, registration: Registration) -> DomainResult<User> {
        let mut tx = self.store.begin().await?;
        if tx.user_by_email(&registration.email).await?.is_some() {
            return Err(DomainError::conflict(ALREADY_REGISTERED_MESSAGE));
        }

        if registration.consume_activation {
            let record = tx
                .activation(&registration.email)
                .await?
                .ok_or_else(|| DomainError::conflict(NOT_REQUESTED_MESSAGE))?;
            if !record.activated {
                return Err(DomainError::conflict(NOT_ACTIVATED_MESSAGE));
            }
            if record.expire < now() {
                return Err(DomainError::conflict(REGISTRATION_EXPIRED_MESSAGE));
            }
        }

        let user_id = new_id();
        let welcome = Mail::welcome(new_id(), user_id.clone(), &registration.name);
        tx.insert_mail(&welcome).await?;

        let user = User::register(
            user_id.clone(),
            registration.name,
            registration.email,
            registration.password_hash,
            registration.img,
            welcome.id.clone(),
        );
        tx.insert_user(&user).await.map_err(|e| match e {
            StoreError::Duplicate(detail) => {
                warn!(email = %user.email, detail = %detail, "registration lost the email to a concurrent one");
                DomainError::conflict(ALREADY_REGISTERED_MESSAGE)
            }
            other => DomainError::from(other),
        })?;
        tx.insert_recent_visit(&RecentVisit::empty(user_id)).await?;

        if registration.consume_activation {
            tx.delete_activation(&user.email).await?;
        }
        tx.commit().await?;

        info!(user_id = %user.id, federated = user.is_google, "account registered");
        Ok(user)
    }

    pub async fn log_in_with_password(&self, request: AccountPasswordLogInRequest) -> DomainResult<User> {
        let email = request.user_email.trim().to_string();
        let user = within(self.deadline, async {
            Ok(self.store.find_user_by_email(&email).await?)
        })
        .await?
        .ok_or_else(|| DomainError::not_found(UNKNOWN_ACCOUNT_MESSAGE))?;

        let stored = match (&user.password, user.is_google) {
            (Some(hash), false) => hash,
            _ => return Err(DomainError::invalid(WRONG_SIGN_IN_METHOD_MESSAGE)),
        };
        if !verify_secret(&request.user_password, stored) {
            return Err(DomainError::invalid(WRONG_PASSWORD_MESSAGE));
        }
        info!(user_id = %user.id, "password log in");
        Ok(user)
    }

    pub async fn log_in_with_credential(&self, credential: &str) -> DomainResult<User> {
        let claims = self.verify_credential(credential).await?;
        let user = within(self.deadline, async {
            Ok(self.store.find_user_by_email(&claims.email).await?)
        })
        .await?
        .ok_or_else(|| DomainError::not_found(UNKNOWN_ACCOUNT_MESSAGE))?;

        if !user.is_google {
            return Err(DomainError::invalid(WRONG_SIGN_IN_METHOD_MESSAGE));
        }
        info!(user_id = %user.id, "federated log in");
        Ok(user)
    }

    async fn verify_credential(&self, credential: &str) -> DomainResult<IdentityClaims> {
        match bounded("identity", self.deadline, self.identity.verify(credential)).await {
            Ok(claims) => Ok(claims),
            Err(ExternalError::Timeout(what)) => Err(DomainError::Timeout(what)),
            Err(err) => {
                warn!(error = %err, "credential rejected");
                Err(DomainError::invalid(BAD_CREDENTIAL_MESSAGE))
            }
        }
    }

    /// The user behind a session; a vanished account must sign in again.
    pub async fn session_user(&self, user_id: &str) -> DomainResult<User> {
        within(self.deadline, async { Ok(self.store.find_user(user_id).await?) })
            .await?
            .ok_or(DomainError::Unauthenticated)
    }

    pub async fn user(&self, user_id: &str) -> DomainResult<User> {
        within(self.deadline, async { Ok(self.store.find_user(user_id).await?) })
            .await?
            .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))
    }

    pub async fn change_name(&self, user_id: &str, new_name: &str) -> DomainResult<()> {
        let name = validate_name(new_name, &self.admin_name)?;
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut user = tx
                .user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            user.name = name;
            tx.save_user(&user).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Moves the account to an address proven by an `account` code, consuming the code.
    pub async fn change_email(&self, request: ChangeUserEmailRequest) -> DomainResult<()> {
        let new_email = validate_email(&request.new_email)?;
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let code = tx
                .verification_code(CodePurpose::Account, &new_email)
                .await?
                .ok_or_else(|| DomainError::invalid(EMAIL_NOT_VERIFIED_MESSAGE))?;
            if !verify_secret(request.validate_code.trim(), &code.code_hash) {
                return Err(DomainError::invalid(WRONG_CODE_MESSAGE));
            }
            if code.expire < now() {
                return Err(DomainError::invalid(CODE_EXPIRED_MESSAGE));
            }
            if tx.user_by_email(&new_email).await?.is_some() {
                return Err(DomainError::conflict(ALREADY_REGISTERED_MESSAGE));
            }

            let mut user = tx
                .user(&request.user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            user.email = new_email.clone();
            tx.save_user(&user).await?;
            tx.delete_verification_code(CodePurpose::Account, &new_email).await?;
            tx.commit().await?;
            info!(user_id = %user.id, "account email changed");
            Ok(())
        })
        .await
    }

    /// Uploads a new profile image and stores its link.
    pub async fn change_image(&self, user_id: &str, bytes: Vec<u8>, filename: String) -> DomainResult<String> {
        let link = match bounded("image host", self.deadline, self.images.upload(bytes, filename)).await {
            Ok(link) => link,
            Err(ExternalError::Rejected(detail)) => {
                warn!(user_id, detail = %detail, "image upload refused");
                return Err(DomainError::invalid(UPLOAD_REFUSED_MESSAGE));
            }
            Err(err) => return Err(err.into()),
        };

        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut user = tx
                .user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            user.img = link.clone();
            tx.save_user(&user).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        Ok(link)
    }
}

/// Display name for a federated account: spaces become underscores and the
/// reserved admin name is wrapped.
pub fn federated_name(raw: &str, admin_name: &str) -> String {
    let name = raw.trim().replace(' ', "_");
    if name == admin_name {
        format!("_{}_", name)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ActivationRecord;
    use crate::database::{Fault, MemoryStore};
    use crate::testing::{seed_user, StubIdentityVerifier, StubImageHost, TEST_PASSWORD};

    struct Fixture {
        store: MemoryStore,
        identity: Arc<StubIdentityVerifier>,
        images: Arc<StubImageHost>,
        service: AccountService,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let identity = Arc::new(StubIdentityVerifier::new());
        let images = Arc::new(StubImageHost::new());
        let service = AccountService::new(
            Arc::new(store.clone()),
            Duration::from_secs(2),
            "admin".into(),
            identity.clone(),
            images.clone(),
        );
        Fixture {
            store,
            identity,
            images,
            service,
        }
    }

    fn registration(email: &str) -> AccountPasswordRegisterRequest {
        AccountPasswordRegisterRequest {
            user_name: "alice".into(),
            user_email: email.into(),
            user_password: TEST_PASSWORD.into(),
            re_user_password: TEST_PASSWORD.into(),
        }
    }

    async fn activate(store: &MemoryStore, email: &str, activated: bool, expire: i64) {
        let email = email.to_string();
        store
            .seed(move |data| {
                data.activations.insert(
                    email.clone(),
                    ActivationRecord {
                        email,
                        token: new_id(),
                        expire,
                        activated,
                    },
                );
            })
            .await;
    }

    #[tokio::test]
    async fn test_register_without_activation_creates_nothing() {
        let f = fixture();
        let err = f.service.register_with_password(registration("a@b.com")).await.unwrap_err();
        assert_eq!(err, DomainError::Conflict(NOT_REQUESTED_MESSAGE.into()));

        let data = f.store.snapshot().await;
        assert!(data.users.is_empty());
        assert!(data.mails.is_empty());
    }

    #[tokio::test]
    async fn test_register_requires_completed_unexpired_activation() {
        let f = fixture();
        activate(&f.store, "a@b.com", false, now() + 300).await;
        let err = f.service.register_with_password(registration("a@b.com")).await.unwrap_err();
        assert_eq!(err, DomainError::Conflict(NOT_ACTIVATED_MESSAGE.into()));

        activate(&f.store, "a@b.com", true, now() - 1).await;
        let err = f.service.register_with_password(registration("a@b.com")).await.unwrap_err();
        assert_eq!(err, DomainError::Conflict(REGISTRATION_EXPIRED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_register_creates_mail_user_and_visits_together() {
        let f = fixture();
        activate(&f.store, "a@b.com", true, now() + 300).await;

        let user = f.service.register_with_password(registration("a@b.com")).await.unwrap();

        let data = f.store.snapshot().await;
        let stored = &data.users[&user.id];
        assert_eq!(stored.mails.len(), 1);
        assert_eq!(data.mails[&stored.mails[0]].receiver_id, user.id);
        assert_eq!(data.recent_visits[&user.id].record, Vec::<String>::new());
        assert!(data.activations.is_empty());
        assert!(!stored.is_google);
        assert!(verify_secret(TEST_PASSWORD, stored.password.as_deref().unwrap()));
    }

    #[tokio::test]
    async fn test_register_fault_after_mail_leaves_no_mail() {
        let f = fixture();
        activate(&f.store, "a@b.com", true, now() + 300).await;
        f.store.fail_on(Fault::InsertUser);

        let err = f.service.register_with_password(registration("a@b.com")).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));

        let data = f.store.snapshot().await;
        assert!(data.mails.is_empty());
        assert!(data.users.is_empty());
        assert!(data.recent_visits.is_empty());
        assert_eq!(data.activations.len(), 1);
    }

    #[tokio::test]
    async fn test_register_validation_messages() {
        let f = fixture();
        let mut request = registration("a@b.com");
        request.re_user_password = "Other0rd!".into();
        let err = f.service.register_with_password(request).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed("兩次密碼輸入不一致".into()));

        let mut request = registration("not-an-email");
        request.user_name = "ok_name".into();
        let err = f.service.register_with_password(request).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed("電子郵件格式錯誤".into()));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let f = fixture();
        seed_user(&f.store, "u1", "alice").await;
        activate(&f.store, "alice@example.com", true, now() + 300).await;

        let err = f
            .service
            .register_with_password(registration("alice@example.com"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::Conflict(ALREADY_REGISTERED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_email_taken_at_insert_reports_registered() {
        let f = fixture();
        activate(&f.store, "a@b.com", true, now() + 300).await;
        f.store.fail_on(Fault::EmailTaken);

        let err = f.service.register_with_password(registration("a@b.com")).await.unwrap_err();
        assert_eq!(err, DomainError::Conflict(ALREADY_REGISTERED_MESSAGE.into()));

        let data = f.store.snapshot().await;
        assert!(data.mails.is_empty());
        assert!(data.users.is_empty());
        assert_eq!(data.activations.len(), 1);
    }

    #[tokio::test]
    async fn test_federated_register_and_log_in() {
        let f = fixture();
        f.identity.allow(
            "cred-1",
            IdentityClaims {
                email: "g@b.com".into(),
                name: " admin ".into(),
                picture: "https://img/p.png".into(),
            },
        );

        let user = f.service.register_with_credential("cred-1").await.unwrap();
        assert_eq!(user.name, "_admin_");
        assert!(user.is_google);
        assert!(user.password.is_none());
        assert_eq!(user.img, "https://img/p.png");

        let logged_in = f.service.log_in_with_credential("cred-1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let err = f.service.register_with_credential("bogus").await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(BAD_CREDENTIAL_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_password_log_in_outcomes() {
        let f = fixture();
        seed_user(&f.store, "u1", "alice").await;
        let login = |password: &str| AccountPasswordLogInRequest {
            user_email: "alice@example.com".into(),
            user_password: password.into(),
        };

        let user = f.service.log_in_with_password(login(TEST_PASSWORD)).await.unwrap();
        assert_eq!(user.id, "u1");

        let err = f.service.log_in_with_password(login("Wrong0ne!")).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(WRONG_PASSWORD_MESSAGE.into()));

        let err = f
            .service
            .log_in_with_password(AccountPasswordLogInRequest {
                user_email: "nobody@example.com".into(),
                user_password: TEST_PASSWORD.into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound(UNKNOWN_ACCOUNT_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_change_email_consumes_code() {
        let f = fixture();
        seed_user(&f.store, "u1", "alice").await;
        let hash = hash_secret("123456").unwrap();
        f.store
            .seed(move |data| {
                data.codes.insert(
                    (CodePurpose::Account, "new@b.com".into()),
                    crate::database::models::VerificationCode {
                        purpose: CodePurpose::Account,
                        email: "new@b.com".into(),
                        code_hash: hash,
                        expire: now() + 300,
                    },
                );
            })
            .await;
        let request = |code: &str| ChangeUserEmailRequest {
            user_id: "u1".into(),
            new_email: "new@b.com".into(),
            validate_code: code.into(),
        };

        let err = f.service.change_email(request("000000")).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(WRONG_CODE_MESSAGE.into()));

        f.service.change_email(request("123456")).await.unwrap();
        let data = f.store.snapshot().await;
        assert_eq!(data.users["u1"].email, "new@b.com");
        assert!(data.codes.is_empty());

        let err = f.service.change_email(request("123456")).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(EMAIL_NOT_VERIFIED_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_change_image_stores_link() {
        let f = fixture();
        seed_user(&f.store, "u1", "alice").await;

        let link = f.service.change_image("u1", vec![1, 2, 3], "me.png".into()).await.unwrap();
        assert_eq!(f.store.snapshot().await.users["u1"].img, link);

        f.images.refuse(true);
        let err = f.service.change_image("u1", vec![1], "x.png".into()).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(UPLOAD_REFUSED_MESSAGE.into()));
    }

    #[test]
    fn test_federated_name() {
        assert_eq!(federated_name("  Amy Lee ", "admin"), "Amy_Lee");
        assert_eq!(federated_name("admin", "admin"), "_admin_");
    }
}
