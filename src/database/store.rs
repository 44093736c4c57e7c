// database/store.rs - persistence port shared by the Postgres and in-memory adapters
use async_trait::async_trait;
use thiserror::Error;

use super::models::{
    ActivationRecord, CodePurpose, ErrorLog, Feedback, Mail, RecentVisit, User, VerificationCode, WordSet,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Ordering for the public showcase lists on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowcaseOrder {
    /// `createdAt` descending, then `updatedAt` descending
    Newest,
    /// `likes` descending
    Popular,
}

/// Read side of the store plus the entry point for units of work.
///
/// Plain reads observe committed state only. Anything that must be consistent
/// with a later write belongs inside a [`StoreTx`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_word_set(&self, id: &str) -> StoreResult<Option<WordSet>>;
    async fn find_word_sets(&self, ids: &[String]) -> StoreResult<Vec<WordSet>>;

    /// Sets whose title starts with `prefix` literally, newest `updatedAt` first.
    async fn search_word_sets(&self, prefix: &str, skip: i64, limit: i64) -> StoreResult<Vec<WordSet>>;

    /// Public sets only.
    async fn list_public_word_sets(&self, order: ShowcaseOrder, limit: i64) -> StoreResult<Vec<WordSet>>;

    async fn find_mails(&self, ids: &[String]) -> StoreResult<Vec<Mail>>;
    async fn find_recent_visit(&self, user_id: &str) -> StoreResult<Option<RecentVisit>>;

    /// Newest first.
    async fn list_feedbacks(&self, skip: i64, limit: i64) -> StoreResult<Vec<Feedback>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// One atomic unit of work. Reads take row locks; dropping without `commit` rolls back.
#[async_trait]
pub trait StoreTx: Send {
    async fn user(&mut self, id: &str) -> StoreResult<Option<User>>;
    async fn users(&mut self, ids: &[String]) -> StoreResult<Vec<User>>;
    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
    async fn word_set(&mut self, id: &str) -> StoreResult<Option<WordSet>>;
    async fn recent_visit(&mut self, user_id: &str) -> StoreResult<Option<RecentVisit>>;
    async fn mail(&mut self, id: &str) -> StoreResult<Option<Mail>>;
    async fn activation(&mut self, email: &str) -> StoreResult<Option<ActivationRecord>>;
    async fn activation_by_token(&mut self, token: &str) -> StoreResult<Option<ActivationRecord>>;
    async fn verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<Option<VerificationCode>>;

    /// Fails with `Duplicate` when the id or email is taken.
    async fn insert_user(&mut self, user: &User) -> StoreResult<()>;
    /// Fails with `NotFound` when the user does not exist.
    async fn save_user(&mut self, user: &User) -> StoreResult<()>;

    async fn insert_word_set(&mut self, word_set: &WordSet) -> StoreResult<()>;
    async fn save_word_set(&mut self, word_set: &WordSet) -> StoreResult<()>;
    async fn delete_word_set(&mut self, id: &str) -> StoreResult<()>;

    async fn insert_mail(&mut self, mail: &Mail) -> StoreResult<()>;
    async fn save_mail(&mut self, mail: &Mail) -> StoreResult<()>;

    async fn insert_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()>;
    async fn save_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()>;

    async fn insert_feedback(&mut self, feedback: &Feedback) -> StoreResult<()>;
    async fn insert_error_log(&mut self, entry: &ErrorLog) -> StoreResult<()>;

    /// Insert or replace, keyed by email.
    async fn save_activation(&mut self, record: &ActivationRecord) -> StoreResult<()>;
    async fn delete_activation(&mut self, email: &str) -> StoreResult<()>;

    /// Insert or replace, keyed by purpose and email.
    async fn save_verification_code(&mut self, code: &VerificationCode) -> StoreResult<()>;
    async fn delete_verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
