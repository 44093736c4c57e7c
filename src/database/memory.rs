// database/memory.rs - in-process store used for local development and tests
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::models::{
    ActivationRecord, CodePurpose, ErrorLog, Feedback, Mail, RecentVisit, User, VerificationCode, WordSet,
};
use super::store::{ShowcaseOrder, Store, StoreError, StoreResult, StoreTx};

/// Every document the service persists.
#[derive(Debug, Clone, Default)]
pub struct Collections {
    pub users: HashMap<String, User>,
    pub word_sets: HashMap<String, WordSet>,
    pub mails: HashMap<String, Mail>,
    pub recent_visits: HashMap<String, RecentVisit>,
    pub feedbacks: Vec<Feedback>,
    pub error_logs: Vec<ErrorLog>,
    pub activations: HashMap<String, ActivationRecord>,
    pub codes: HashMap<(CodePurpose, String), VerificationCode>,
}

/// A write that can be made to fail inside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    InsertUser,
    SaveUser,
    InsertWordSet,
    SaveWordSet,
    DeleteWordSet,
    InsertMail,
    SaveMail,
    InsertRecentVisit,
    SaveRecentVisit,
    SaveActivation,
    DeleteActivation,
    SaveVerificationCode,
    DeleteVerificationCode,
    Commit,
    /// `insert_user` reports the email as taken, as a unique index would when
    /// another registration commits first.
    EmailTaken,
}

/// Units of work are serialised: `begin` takes the store lock and edits a
/// private copy that `commit` publishes.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
    faults: Arc<DashSet<Fault>>,
    stall_ms: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given write fail in every later unit of work.
    pub fn fail_on(&self, fault: Fault) {
        self.faults.insert(fault);
    }

    pub fn clear_faults(&self) {
        self.faults.clear();
    }

    /// Delays every transactional call by `delay`.
    pub fn stall(&self, delay: Duration) {
        self.stall_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Committed state, for assertions.
    pub async fn snapshot(&self) -> Collections {
        self.inner.lock().await.clone()
    }

    /// Seeds documents directly, bypassing the services.
    pub async fn seed<F: FnOnce(&mut Collections)>(&self, f: F) {
        f(&mut *self.inner.lock().await);
    }

    async fn pause(stall_ms: &AtomicU64) {
        let ms = stall_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        Self::pause(&self.stall_ms).await;
        let guard = self.inner.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryTx {
            guard,
            work,
            faults: self.faults.clone(),
            stall_ms: self.stall_ms.clone(),
        }))
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let data = self.inner.lock().await;
        Ok(data.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_word_set(&self, id: &str) -> StoreResult<Option<WordSet>> {
        Ok(self.inner.lock().await.word_sets.get(id).cloned())
    }

    async fn find_word_sets(&self, ids: &[String]) -> StoreResult<Vec<WordSet>> {
        let data = self.inner.lock().await;
        Ok(ids.iter().filter_map(|id| data.word_sets.get(id).cloned()).collect())
    }

    async fn search_word_sets(&self, prefix: &str, skip: i64, limit: i64) -> StoreResult<Vec<WordSet>> {
        let data = self.inner.lock().await;
        let mut hits: Vec<WordSet> = data
            .word_sets
            .values()
            .filter(|ws| ws.title.starts_with(prefix))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(page(hits, skip, limit))
    }

    async fn list_public_word_sets(&self, order: ShowcaseOrder, limit: i64) -> StoreResult<Vec<WordSet>> {
        let data = self.inner.lock().await;
        let mut sets: Vec<WordSet> = data.word_sets.values().filter(|ws| ws.is_public).cloned().collect();
        match order {
            ShowcaseOrder::Newest => sets.sort_by(|a, b| {
                b.created_at
                    .cmp(&a.created_at)
                    .then_with(|| b.updated_at.cmp(&a.updated_at))
            }),
            ShowcaseOrder::Popular => sets.sort_by(|a, b| {
                b.likes
                    .cmp(&a.likes)
                    .then_with(|| b.updated_at.cmp(&a.updated_at))
            }),
        }
        Ok(page(sets, 0, limit))
    }

    async fn find_mails(&self, ids: &[String]) -> StoreResult<Vec<Mail>> {
        let data = self.inner.lock().await;
        Ok(ids.iter().filter_map(|id| data.mails.get(id).cloned()).collect())
    }

    async fn find_recent_visit(&self, user_id: &str) -> StoreResult<Option<RecentVisit>> {
        Ok(self.inner.lock().await.recent_visits.get(user_id).cloned())
    }

    async fn list_feedbacks(&self, skip: i64, limit: i64) -> StoreResult<Vec<Feedback>> {
        let data = self.inner.lock().await;
        let mut all = data.feedbacks.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page(all, skip, limit))
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn page<T>(items: Vec<T>, skip: i64, limit: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(skip.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<Collections>,
    work: Collections,
    faults: Arc<DashSet<Fault>>,
    stall_ms: Arc<AtomicU64>,
}

impl MemoryTx {
    async fn step(&self, fault: Option<Fault>) -> StoreResult<()> {
        MemoryStore::pause(&self.stall_ms).await;
        match fault {
            Some(f) if self.faults.contains(&f) => Err(StoreError::Backend(format!("injected fault: {:?}", f))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn user(&mut self, id: &str) -> StoreResult<Option<User>> {
        self.step(None).await?;
        Ok(self.work.users.get(id).cloned())
    }

    async fn users(&mut self, ids: &[String]) -> StoreResult<Vec<User>> {
        self.step(None).await?;
        Ok(ids.iter().filter_map(|id| self.work.users.get(id).cloned()).collect())
    }

    async fn user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
        self.step(None).await?;
        Ok(self.work.users.values().find(|u| u.email == email).cloned())
    }

    async fn word_set(&mut self, id: &str) -> StoreResult<Option<WordSet>> {
        self.step(None).await?;
        Ok(self.work.word_sets.get(id).cloned())
    }

    async fn recent_visit(&mut self, user_id: &str) -> StoreResult<Option<RecentVisit>> {
        self.step(None).await?;
        Ok(self.work.recent_visits.get(user_id).cloned())
    }

    async fn mail(&mut self, id: &str) -> StoreResult<Option<Mail>> {
        self.step(None).await?;
        Ok(self.work.mails.get(id).cloned())
    }

    async fn activation(&mut self, email: &str) -> StoreResult<Option<ActivationRecord>> {
        self.step(None).await?;
        Ok(self.work.activations.get(email).cloned())
    }

    async fn activation_by_token(&mut self, token: &str) -> StoreResult<Option<ActivationRecord>> {
        self.step(None).await?;
        Ok(self.work.activations.values().find(|a| a.token == token).cloned())
    }

    async fn verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<Option<VerificationCode>> {
        self.step(None).await?;
        Ok(self.work.codes.get(&(purpose, email.to_string())).cloned())
    }

    async fn insert_user(&mut self, user: &User) -> StoreResult<()> {
        self.step(Some(Fault::InsertUser)).await?;
        if self.faults.contains(&Fault::EmailTaken) {
            return Err(StoreError::Duplicate(format!("users_email_key ({})", user.email)));
        }
        if self.work.users.contains_key(&user.id) || self.work.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(format!("user {}", user.email)));
        }
        self.work.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> StoreResult<()> {
        self.step(Some(Fault::SaveUser)).await?;
        if self.work.users.values().any(|u| u.email == user.email && u.id != user.id) {
            return Err(StoreError::Duplicate(format!("user {}", user.email)));
        }
        match self.work.users.get_mut(&user.id) {
            Some(slot) => {
                *slot = user.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("user {}", user.id))),
        }
    }

    async fn insert_word_set(&mut self, word_set: &WordSet) -> StoreResult<()> {
        self.step(Some(Fault::InsertWordSet)).await?;
        if self.work.word_sets.contains_key(&word_set.id) {
            return Err(StoreError::Duplicate(format!("word set {}", word_set.id)));
        }
        self.work.word_sets.insert(word_set.id.clone(), word_set.clone());
        Ok(())
    }

    async fn save_word_set(&mut self, word_set: &WordSet) -> StoreResult<()> {
        self.step(Some(Fault::SaveWordSet)).await?;
        match self.work.word_sets.get_mut(&word_set.id) {
            Some(slot) => {
                *slot = word_set.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("word set {}", word_set.id))),
        }
    }

    async fn delete_word_set(&mut self, id: &str) -> StoreResult<()> {
        self.step(Some(Fault::DeleteWordSet)).await?;
        self.work
            .word_sets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("word set {}", id)))
    }

    async fn insert_mail(&mut self, mail: &Mail) -> StoreResult<()> {
        self.step(Some(Fault::InsertMail)).await?;
        if self.work.mails.contains_key(&mail.id) {
            return Err(StoreError::Duplicate(format!("mail {}", mail.id)));
        }
        self.work.mails.insert(mail.id.clone(), mail.clone());
        Ok(())
    }

    async fn save_mail(&mut self, mail: &Mail) -> StoreResult<()> {
        self.step(Some(Fault::SaveMail)).await?;
        match self.work.mails.get_mut(&mail.id) {
            Some(slot) => {
                *slot = mail.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("mail {}", mail.id))),
        }
    }

    async fn insert_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()> {
        self.step(Some(Fault::InsertRecentVisit)).await?;
        if self.work.recent_visits.contains_key(&recent.id) {
            return Err(StoreError::Duplicate(format!("recent visit {}", recent.id)));
        }
        self.work.recent_visits.insert(recent.id.clone(), recent.clone());
        Ok(())
    }

    async fn save_recent_visit(&mut self, recent: &RecentVisit) -> StoreResult<()> {
        self.step(Some(Fault::SaveRecentVisit)).await?;
        self.work.recent_visits.insert(recent.id.clone(), recent.clone());
        Ok(())
    }

    async fn insert_feedback(&mut self, feedback: &Feedback) -> StoreResult<()> {
        self.step(None).await?;
        self.work.feedbacks.push(feedback.clone());
        Ok(())
    }

    async fn insert_error_log(&mut self, entry: &ErrorLog) -> StoreResult<()> {
        self.step(None).await?;
        self.work.error_logs.push(entry.clone());
        Ok(())
    }

    async fn save_activation(&mut self, record: &ActivationRecord) -> StoreResult<()> {
        self.step(Some(Fault::SaveActivation)).await?;
        self.work.activations.insert(record.email.clone(), record.clone());
        Ok(())
    }

    async fn delete_activation(&mut self, email: &str) -> StoreResult<()> {
        self.step(Some(Fault::DeleteActivation)).await?;
        self.work.activations.remove(email);
        Ok(())
    }

    async fn save_verification_code(&mut self, code: &VerificationCode) -> StoreResult<()> {
        self.step(Some(Fault::SaveVerificationCode)).await?;
        self.work
            .codes
            .insert((code.purpose, code.email.clone()), code.clone());
        Ok(())
    }

    async fn delete_verification_code(&mut self, purpose: CodePurpose, email: &str) -> StoreResult<()> {
        self.step(Some(Fault::DeleteVerificationCode)).await?;
        self.work.codes.remove(&(purpose, email.to_string()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.step(Some(Fault::Commit)).await?;
        let MemoryTx { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Mail;

    fn mail(id: &str) -> Mail {
        Mail::welcome(id.to_string(), "u1".to_string(), "alice")
    }

    #[tokio::test]
    async fn test_commit_publishes_changes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert_mail(&mail("m1")).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(store.find_mails(&["m1".to_string()]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_mail(&mail("m1")).await.unwrap();
        }
        assert!(store.snapshot().await.mails.is_empty());
    }

    #[tokio::test]
    async fn test_injected_fault_fails_the_write() {
        let store = MemoryStore::new();
        store.fail_on(Fault::InsertMail);
        let mut tx = store.begin().await.unwrap();
        assert!(matches!(tx.insert_mail(&mail("m1")).await, Err(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_failed_commit_keeps_old_state() {
        let store = MemoryStore::new();
        store.fail_on(Fault::Commit);
        let mut tx = store.begin().await.unwrap();
        tx.insert_mail(&mail("m1")).await.unwrap();
        assert!(tx.commit().await.is_err());
        assert!(store.snapshot().await.mails.is_empty());
    }

    #[tokio::test]
    async fn test_units_of_work_are_serialised() {
        let store = MemoryStore::new();
        let first = store.begin().await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), store.begin()).await;
        assert!(waiting.is_err());
        drop(first);
        assert!(store.begin().await.is_ok());
    }
}
