pub mod account_service;
pub mod activity_service;
pub mod catalog_service;
pub mod error;
pub mod social_service;
pub mod verification_service;
pub mod word_set_service;

use std::sync::Arc;

pub use account_service::AccountService;
pub use activity_service::ActivityService;
pub use catalog_service::CatalogService;
pub use error::{within, DomainError, DomainResult};
pub use social_service::SocialService;
pub use verification_service::VerificationService;
pub use word_set_service::WordSetService;

use crate::config::AppConfig;
use crate::database::Store;
use crate::external::{IdentityVerifier, ImageHost, Mailer};

/// Rows per page for search, preview and feedback lists.
pub const PAGE_SIZE: i64 = 6;

pub const USER_NOT_FOUND: &str = "查無使用者";
pub const WORD_SET_NOT_FOUND: &str = "查無單字集";
pub const GATED_WORD_SET_NOT_FOUND: &str = "查無此單字集";
pub const WORD_NOT_FOUND: &str = "查無此單字或單字集";
pub const NOT_WORD_SET_AUTHOR: &str = "使用者無權限更改!";

/// Network collaborators the services depend on.
#[derive(Clone)]
pub struct Collaborators {
    pub mailer: Arc<dyn Mailer>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub images: Arc<dyn ImageHost>,
}

/// Every domain service, wired to one store.
#[derive(Clone)]
pub struct Services {
    pub word_sets: Arc<WordSetService>,
    pub social: Arc<SocialService>,
    pub accounts: Arc<AccountService>,
    pub verification: Arc<VerificationService>,
    pub activity: Arc<ActivityService>,
    pub catalog: Arc<CatalogService>,
}

impl Services {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig, collaborators: Collaborators) -> Self {
        let deadline = config.operation_timeout();
        Self {
            word_sets: Arc::new(WordSetService::new(store.clone(), deadline)),
            social: Arc::new(SocialService::new(store.clone(), deadline)),
            accounts: Arc::new(AccountService::new(
                store.clone(),
                deadline,
                config.accounts.admin_name.clone(),
                collaborators.identity,
                collaborators.images,
            )),
            verification: Arc::new(VerificationService::new(
                store.clone(),
                deadline,
                config.frontend_origin().to_string(),
                collaborators.mailer,
            )),
            activity: Arc::new(ActivityService::new(store.clone(), deadline)),
            catalog: Arc::new(CatalogService::new(store, deadline)),
        }
    }
}

/// Parses the `curNumber` offset shared by the paged reads.
pub(crate) fn parse_offset(raw: &str) -> DomainResult<i64> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 0 => Ok(n),
        _ => Err(DomainError::malformed("搜尋值錯誤")),
    }
}
