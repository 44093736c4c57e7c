// testing/mod.rs - fixtures shared by unit tests and the integration suite
//
// Not part of the public API. Fixtures build documents directly in a
// `MemoryStore` and stand in for the network collaborators.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::app::{build_router, AppState};
use crate::auth::cookie::SESSION_COOKIE;
use crate::auth::password::hash_secret;
use crate::config::AppConfig;
use crate::database::models::{now, today, RecentVisit, User, Word, WordSet};
use crate::database::MemoryStore;
use crate::external::{ExternalError, IdentityClaims, IdentityVerifier, ImageHost, MailMessage, Mailer};
use crate::services::Collaborators;

/// Password of every seeded account. Satisfies the password rules.
pub const TEST_PASSWORD: &str = "Passw0rd!";

/// Development settings with a short deadline.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.operation_timeout_secs = 2;
    config
}

/// Keeps every message instead of delivering it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().await.clone()
    }

    /// The six-digit code in the newest code mail.
    pub async fn last_code(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.iter().rev().find_map(|mail| between(&mail.html, "<b>", "</b>"))
    }

    /// The token at the end of the newest activation link.
    pub async fn last_activation_token(&self) -> Option<String> {
        let sent = self.sent.lock().await;
        sent.iter().rev().find_map(|mail| between(&mail.html, "/activateEmail/", "\""))
    }
}

fn between(haystack: &str, start: &str, end: &str) -> Option<String> {
    let from = haystack.find(start)? + start.len();
    let len = haystack[from..].find(end)?;
    Some(haystack[from..from + len].to_string())
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), ExternalError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

/// Accepts only the credentials registered with `allow`.
#[derive(Default)]
pub struct StubIdentityVerifier {
    known: DashMap<String, IdentityClaims>,
}

impl StubIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(&self, credential: &str, claims: IdentityClaims) {
        self.known.insert(credential.to_string(), claims);
    }
}

#[async_trait]
impl IdentityVerifier for StubIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<IdentityClaims, ExternalError> {
        self.known
            .get(credential)
            .map(|claims| claims.clone())
            .ok_or_else(|| ExternalError::Rejected("unknown credential".to_string()))
    }
}

/// Answers every upload with a link under `https://img.test/` unless told to refuse.
#[derive(Default)]
pub struct StubImageHost {
    refusing: AtomicBool,
}

impl StubImageHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self, refusing: bool) {
        self.refusing.store(refusing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ImageHost for StubImageHost {
    async fn upload(&self, bytes: Vec<u8>, filename: String) -> Result<String, ExternalError> {
        if self.refusing.load(Ordering::SeqCst) || bytes.is_empty() {
            return Err(ExternalError::Rejected("upload refused".to_string()));
        }
        Ok(format!("https://img.test/{}", filename))
    }
}

/// A wired application over a `MemoryStore`, with every collaborator stubbed.
pub struct TestApp {
    pub store: MemoryStore,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub identity: Arc<StubIdentityVerifier>,
    pub images: Arc<StubImageHost>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        let mailer = Arc::new(RecordingMailer::new());
        let identity = Arc::new(StubIdentityVerifier::new());
        let images = Arc::new(StubImageHost::new());
        let collaborators = Collaborators {
            mailer: mailer.clone(),
            identity: identity.clone(),
            images: images.clone(),
        };
        let state = AppState::new(config, Arc::new(store.clone()), collaborators);
        Self {
            store,
            state,
            mailer,
            identity,
            images,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// `Cookie` header value carrying a day-long session for `user_id`.
    pub fn session_cookie(&self, user_id: &str) -> String {
        let token = self
            .state
            .tokens
            .issue(user_id, Utc::now() + Duration::days(1))
            .expect("sign test session");
        format!("{}={}", SESSION_COOKIE, token)
    }

    /// The first allowed origin, accepted by the origin check.
    pub fn origin(&self) -> String {
        self.state.config.frontend_origin().to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts a password account `{name}@example.com` with an empty visit record.
pub async fn seed_user(store: &MemoryStore, id: &str, name: &str) -> User {
    let hash = hash_secret(TEST_PASSWORD).expect("hash test password");
    let mut user = User::register(
        id.to_string(),
        name.to_string(),
        format!("{}@example.com", name),
        Some(hash),
        String::new(),
        String::new(),
    );
    user.mails.clear();

    let seeded = user.clone();
    store
        .seed(move |data| {
            data.recent_visits
                .insert(user.id.clone(), RecentVisit::empty(user.id.clone()));
            data.users.insert(user.id.clone(), user);
        })
        .await;
    seeded
}

/// Inserts a public, copyable set titled `Set {id}` with one word per vocabulary.
///
/// Word ids are `{id}-w{n}` and orders start at 1. The set is added to the
/// author's created list when the author exists.
pub async fn seed_word_set(store: &MemoryStore, id: &str, author_id: &str, vocabulary: &[&str]) -> WordSet {
    let words: Vec<Word> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, v)| Word {
            id: format!("{}-w{}", id, i + 1),
            order: i as i64 + 1,
            ..word(v)
        })
        .collect();

    let word_set = WordSet {
        id: id.to_string(),
        title: format!("Set {}", id),
        description: String::new(),
        author_id: author_id.to_string(),
        created_at: today(),
        updated_at: now(),
        word_cnt: words.len() as i64,
        words,
        should_swap: false,
        liked_users: Vec::new(),
        likes: 0,
        allow_copy: true,
        is_public: true,
    };

    let seeded = word_set.clone();
    store
        .seed(move |data| {
            if let Some(author) = data.users.get_mut(&word_set.author_id) {
                author.add_created(&word_set.id);
            }
            data.word_sets.insert(word_set.id.clone(), word_set);
        })
        .await;
    seeded
}

/// A word draft as the client sends it: no id, English and Taiwanese sounds.
pub fn word(vocabulary: &str) -> Word {
    Word {
        id: String::new(),
        order: 1,
        vocabulary: vocabulary.to_string(),
        definition: format!("{} definition", vocabulary),
        vocabulary_sound: "en-US".to_string(),
        definition_sound: "zh-TW".to_string(),
        star: false,
    }
}
