// services/word_set_service.rs - author-side word set mutations
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::error::{within, DomainError, DomainResult};
use super::{GATED_WORD_SET_NOT_FOUND, NOT_WORD_SET_AUTHOR, USER_NOT_FOUND, WORD_NOT_FOUND, WORD_SET_NOT_FOUND};
use crate::database::models::{new_id, now, today, Word, WordSet};
use crate::database::Store;
use crate::types::{EditWord, EditWordSetRequest, NewWordSet, UpdateWordRequest};
use crate::validation::{
    validate_definition, validate_description, validate_sound, validate_title, validate_vocabulary, InputError,
    MAX_DEFINITION_LEN, MAX_VOCABULARY_LEN,
};

const VOCABULARY_UPDATE_MESSAGE: &str = "單字長度不得為空且不得超過100字元";
const DEFINITION_UPDATE_MESSAGE: &str = "註釋長度不得為空且不得超過300字元";

/// Trims the texts, checks every rule and assigns a fresh id.
pub fn prepare_word(mut word: Word) -> Result<Word, InputError> {
    word.vocabulary = word.vocabulary.trim().to_string();
    word.definition = word.definition.trim().to_string();
    validate_vocabulary(&word.vocabulary)?;
    validate_definition(&word.definition)?;
    word.vocabulary_sound = validate_sound(&word.vocabulary_sound)?.to_string();
    word.definition_sound = validate_sound(&word.definition_sound)?.to_string();
    word.id = new_id();
    Ok(word)
}

/// Field-level patch checked before any write happens.
struct WordPatch {
    id: String,
    order: Option<i64>,
    vocabulary: Option<String>,
    definition: Option<String>,
    vocabulary_sound: Option<&'static str>,
    definition_sound: Option<&'static str>,
}

impl WordPatch {
    fn parse(edit: EditWord) -> Result<Self, InputError> {
        let vocabulary = non_empty(edit.vocabulary);
        if let Some(v) = &vocabulary {
            validate_vocabulary(v)?;
        }
        let definition = non_empty(edit.definition);
        if let Some(d) = &definition {
            validate_definition(d)?;
        }
        let vocabulary_sound = non_empty(edit.vocabulary_sound).map(|s| validate_sound(&s)).transpose()?;
        let definition_sound = non_empty(edit.definition_sound).map(|s| validate_sound(&s)).transpose()?;

        Ok(Self {
            id: edit.id,
            order: (edit.order != 0).then_some(edit.order),
            vocabulary,
            definition,
            vocabulary_sound,
            definition_sound,
        })
    }

    fn apply(self, word: &mut Word) {
        if let Some(order) = self.order {
            word.order = order;
        }
        if let Some(v) = self.vocabulary {
            word.vocabulary = v;
        }
        if let Some(d) = self.definition {
            word.definition = d;
        }
        if let Some(s) = self.vocabulary_sound {
            word.vocabulary_sound = s.to_string();
        }
        if let Some(s) = self.definition_sound {
            word.definition_sound = s.to_string();
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Validated form of an edit request.
struct WordSetEdit {
    word_set_id: String,
    added: Vec<Word>,
    title: Option<String>,
    description: Option<String>,
    should_swap: bool,
    patches: Vec<WordPatch>,
    removed: HashSet<String>,
}

pub struct WordSetService {
    store: Arc<dyn Store>,
    deadline: Duration,
}

impl WordSetService {
    pub fn new(store: Arc<dyn Store>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Author of the word set, for the resource ownership gate.
    pub async fn author_of(&self, word_set_id: &str) -> DomainResult<String> {
        within(self.deadline, async {
            self.store
                .find_word_set(word_set_id)
                .await?
                .map(|ws| ws.author_id)
                .ok_or_else(|| DomainError::not_found(GATED_WORD_SET_NOT_FOUND))
        })
        .await
    }

    /// Inserts the set and links it to its author in one unit of work.
    pub async fn create(&self, author_id: &str, draft: NewWordSet) -> DomainResult<String> {
        let title = draft.title.trim().to_string();
        validate_title(&title)?;
        validate_description(&draft.description)?;
        let words = draft
            .words
            .into_iter()
            .map(prepare_word)
            .collect::<Result<Vec<_>, _>>()?;

        let word_set = WordSet {
            id: new_id(),
            title,
            description: draft.description,
            author_id: author_id.to_string(),
            created_at: today(),
            updated_at: now(),
            word_cnt: words.len() as i64,
            words,
            should_swap: draft.should_swap,
            liked_users: Vec::new(),
            likes: 0,
            allow_copy: draft.allow_copy,
            is_public: draft.is_public,
        };
        within(self.deadline, self.insert_for_author(word_set)).await
    }

    async fn insert_for_author(&self, word_set: WordSet) -> DomainResult<String> {
        let mut tx = self.store.begin().await?;
        tx.insert_word_set(&word_set).await?;
        let mut author = tx
            .user(&word_set.author_id)
            .await?
            .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
        author.add_created(&word_set.id);
        tx.save_user(&author).await?;
        tx.commit().await?;

        info!(word_set_id = %word_set.id, author_id = %author.id, words = word_set.word_cnt, "word set created");
        Ok(word_set.id)
    }

    /// Applies additions, field patches and removals, then recounts.
    ///
    /// Every input is checked before the unit of work starts, so one bad word
    /// rejects the whole edit. Empty strings and a zero order leave the stored
    /// value untouched. `wordCnt` is recounted from the resulting list rather
    /// than derived from the request's tallies.
    pub async fn edit(&self, request: EditWordSetRequest) -> DomainResult<()> {
        let added = request
            .add_words
            .into_iter()
            .map(prepare_word)
            .collect::<Result<Vec<_>, _>>()?;

        let title = match request.word_set.title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => {
                validate_title(&t)?;
                Some(t)
            }
            _ => None,
        };
        if let Some(description) = &request.word_set.description {
            validate_description(description)?;
        }
        let patches = request
            .word_set
            .words
            .into_iter()
            .map(WordPatch::parse)
            .collect::<Result<Vec<_>, _>>()?;

        let edit = WordSetEdit {
            word_set_id: request.word_set.id,
            added,
            title,
            description: request.word_set.description,
            should_swap: request.word_set.should_swap,
            patches,
            removed: request.remove_words.into_iter().collect(),
        };
        within(self.deadline, self.apply_edit(edit)).await
    }

    async fn apply_edit(&self, edit: WordSetEdit) -> DomainResult<()> {
        let mut tx = self.store.begin().await?;
        let mut word_set = tx
            .word_set(&edit.word_set_id)
            .await?
            .ok_or_else(|| DomainError::not_found(GATED_WORD_SET_NOT_FOUND))?;

        let added = edit.added.len();
        word_set.words.extend(edit.added);

        if let Some(title) = edit.title {
            word_set.title = title;
        }
        if let Some(description) = edit.description {
            word_set.description = description;
        }
        word_set.should_swap = edit.should_swap;
        word_set.touch();
        for patch in edit.patches {
            match word_set.word_mut(&patch.id) {
                Some(word) => patch.apply(word),
                None => debug!(word_id = %patch.id, "patch for unknown word ignored"),
            }
        }

        let before = word_set.words.len();
        word_set.words.retain(|w| !edit.removed.contains(&w.id));
        let removed = before - word_set.words.len();
        word_set.recount();

        tx.save_word_set(&word_set).await?;
        tx.commit().await?;
        info!(word_set_id = %word_set.id, added, removed, word_cnt = word_set.word_cnt, "word set edited");
        Ok(())
    }

    /// Deletes the set and drops it from the author's owned list.
    pub async fn delete(&self, word_set_id: &str) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(GATED_WORD_SET_NOT_FOUND))?;
            if let Some(mut author) = tx.user(&word_set.author_id).await? {
                author.remove_created(word_set_id);
                tx.save_user(&author).await?;
            }
            tx.delete_word_set(word_set_id).await?;
            tx.commit().await?;
            info!(word_set_id, "word set deleted");
            Ok(())
        })
        .await
    }

    /// Appends one validated word and returns its new id.
    pub async fn add_word(&self, word_set_id: &str, word: Word) -> DomainResult<String> {
        let word = prepare_word(word)?;
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(GATED_WORD_SET_NOT_FOUND))?;
            let word_id = word.id.clone();
            word_set.words.push(word);
            word_set.recount();
            word_set.touch();
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(word_id)
        })
        .await
    }

    pub async fn delete_word(&self, word_set_id: &str, word_id: &str) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(GATED_WORD_SET_NOT_FOUND))?;
            let before = word_set.words.len();
            word_set.words.retain(|w| w.id != word_id);
            if word_set.words.len() == before {
                return Err(DomainError::not_found(WORD_NOT_FOUND));
            }
            word_set.recount();
            word_set.touch();
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    pub async fn toggle_word_star(&self, word_set_id: &str, word_id: &str) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_NOT_FOUND))?;
            let word = word_set
                .word_mut(word_id)
                .ok_or_else(|| DomainError::not_found(WORD_NOT_FOUND))?;
            word.star = !word.star;
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    pub async fn toggle_all_word_star(&self, word_set_id: &str, new_star: bool) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_NOT_FOUND))?;
            for word in &mut word_set.words {
                word.star = new_star;
            }
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Replaces vocabulary and definition, and both sounds when `with_sounds`.
    pub async fn update_word(&self, request: UpdateWordRequest, with_sounds: bool) -> DomainResult<()> {
        if request.new_vocabulary.is_empty() || request.new_vocabulary.chars().count() > MAX_VOCABULARY_LEN {
            return Err(DomainError::invalid(VOCABULARY_UPDATE_MESSAGE));
        }
        if request.new_definition.is_empty() || request.new_definition.chars().count() > MAX_DEFINITION_LEN {
            return Err(DomainError::invalid(DEFINITION_UPDATE_MESSAGE));
        }
        let sounds = if with_sounds {
            match (&request.new_vocabulary_sound, &request.new_definition_sound) {
                (Some(v), Some(d)) => Some((validate_sound(v)?, validate_sound(d)?)),
                _ => return Err(DomainError::malformed("請求缺少必要欄位")),
            }
        } else {
            None
        };

        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(&request.word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_NOT_FOUND))?;
            let word = word_set
                .word_mut(&request.word_id)
                .ok_or_else(|| DomainError::not_found(WORD_NOT_FOUND))?;
            word.vocabulary = request.new_vocabulary.clone();
            word.definition = request.new_definition.clone();
            if let Some((vocabulary_sound, definition_sound)) = sounds {
                word.vocabulary_sound = vocabulary_sound.to_string();
                word.definition_sound = definition_sound.to_string();
            }
            word_set.touch();
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    pub async fn toggle_allow_copy(&self, user_id: &str, word_set_id: &str) -> DomainResult<()> {
        self.toggle_flag(user_id, word_set_id, |ws| {
            ws.allow_copy = !ws.allow_copy;
        })
        .await
    }

    pub async fn toggle_is_public(&self, user_id: &str, word_set_id: &str) -> DomainResult<()> {
        self.toggle_flag(user_id, word_set_id, |ws| {
            ws.is_public = !ws.is_public;
        })
        .await
    }

    async fn toggle_flag<F>(&self, user_id: &str, word_set_id: &str, flip: F) -> DomainResult<()>
    where
        F: FnOnce(&mut WordSet) + Send,
    {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_SET_NOT_FOUND))?;
            if word_set.author_id != user_id {
                return Err(DomainError::forbidden(NOT_WORD_SET_AUTHOR));
            }
            flip(&mut word_set);
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{Fault, MemoryStore};
    use crate::testing::{seed_user, seed_word_set, word};

    fn service(store: &MemoryStore) -> WordSetService {
        WordSetService::new(Arc::new(store.clone()), Duration::from_secs(2))
    }

    fn draft(words: Vec<Word>) -> NewWordSet {
        NewWordSet {
            title: "Animals".into(),
            description: "zoo".into(),
            words,
            should_swap: false,
            allow_copy: true,
            is_public: true,
        }
    }

    fn edit_request(id: &str) -> EditWordSetRequest {
        EditWordSetRequest {
            add_words: Vec::new(),
            word_set: crate::types::EditWordSet {
                id: id.into(),
                title: None,
                description: None,
                words: Vec::new(),
                should_swap: false,
            },
            remove_words: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_links_author() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;

        let id = service(&store)
            .create("u1", draft(vec![word("cat"), word("dog")]))
            .await
            .unwrap();

        let data = store.snapshot().await;
        let ws = &data.word_sets[&id];
        assert_eq!(ws.author_id, "u1");
        assert_eq!(ws.word_cnt, 2);
        assert!(ws.words.iter().all(|w| !w.id.is_empty()));
        assert!(data.users["u1"].created_word_sets.contains(&id));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_vocabulary_without_writes() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;

        let err = service(&store)
            .create("u1", draft(vec![word("cat"), word("")]))
            .await
            .unwrap_err();

        assert_eq!(err, DomainError::ValidationFailed(InputError::VocabularyLength.to_string()));
        let data = store.snapshot().await;
        assert!(data.word_sets.is_empty());
        assert!(data.users["u1"].created_word_sets.is_empty());
    }

    #[tokio::test]
    async fn test_create_for_unknown_author_rolls_back() {
        let store = MemoryStore::new();
        let err = service(&store).create("ghost", draft(vec![word("cat")])).await.unwrap_err();
        assert_eq!(err, DomainError::NotFound(USER_NOT_FOUND.into()));
        assert!(store.snapshot().await.word_sets.is_empty());
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_author_save_fails() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        store.fail_on(Fault::SaveUser);

        let err = service(&store).create("u1", draft(vec![word("cat")])).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert!(store.snapshot().await.word_sets.is_empty());
    }

    #[tokio::test]
    async fn test_edit_recounts_from_resulting_words() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        let ws = seed_word_set(&store, "ws1", "u1", &["a", "b", "c", "d"]).await;

        // Only one existing word is listed; a tally-based count would give 1 + 1 - 1.
        let mut request = edit_request("ws1");
        request.add_words = vec![word("e")];
        request.word_set.words = vec![EditWord {
            id: ws.words[0].id.clone(),
            order: 0,
            vocabulary: "alpha".into(),
            definition: String::new(),
            vocabulary_sound: String::new(),
            definition_sound: String::new(),
        }];
        request.remove_words = vec![ws.words[1].id.clone()];

        service(&store).edit(request).await.unwrap();

        let stored = &store.snapshot().await.word_sets["ws1"];
        assert_eq!(stored.words.len(), 4);
        assert_eq!(stored.word_cnt, 4);
        assert!(stored.is_consistent());
        assert_eq!(stored.words[0].vocabulary, "alpha");
        assert_eq!(stored.words[0].definition, ws.words[0].definition);
        assert_eq!(stored.words[0].order, ws.words[0].order);
    }

    #[tokio::test]
    async fn test_edit_keeps_title_on_empty_and_sets_description() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        seed_word_set(&store, "ws1", "u1", &["a"]).await;

        let mut request = edit_request("ws1");
        request.word_set.title = Some(String::new());
        request.word_set.description = Some(String::new());
        request.word_set.should_swap = true;
        service(&store).edit(request).await.unwrap();

        let stored = &store.snapshot().await.word_sets["ws1"];
        assert_eq!(stored.title, "Set ws1");
        assert_eq!(stored.description, "");
        assert!(stored.should_swap);
    }

    #[tokio::test]
    async fn test_edit_with_one_bad_addition_changes_nothing() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        let before = seed_word_set(&store, "ws1", "u1", &["a"]).await;

        let mut request = edit_request("ws1");
        let mut bad = word("x");
        bad.vocabulary_sound = "fr-FR".into();
        request.add_words = vec![word("ok"), word("fine"), bad];
        request.word_set.title = Some("Renamed".into());

        let err = service(&store).edit(request).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(InputError::InvalidAudioLocale.to_string()));
        assert_eq!(store.snapshot().await.word_sets["ws1"], before);
    }

    #[tokio::test]
    async fn test_add_and_delete_word_recount() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        seed_word_set(&store, "ws1", "u1", &["a", "b"]).await;
        let svc = service(&store);

        let new_id = svc.add_word("ws1", word("c")).await.unwrap();
        assert_eq!(store.snapshot().await.word_sets["ws1"].word_cnt, 3);

        svc.delete_word("ws1", &new_id).await.unwrap();
        let stored = &store.snapshot().await.word_sets["ws1"];
        assert_eq!(stored.word_cnt, 2);
        assert!(stored.is_consistent());

        let err = svc.delete_word("ws1", &new_id).await.unwrap_err();
        assert_eq!(err, DomainError::NotFound(WORD_NOT_FOUND.into()));
    }

    #[tokio::test]
    async fn test_delete_word_set_unlinks_author() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        seed_word_set(&store, "ws1", "u1", &["a"]).await;

        service(&store).delete("ws1").await.unwrap();
        let data = store.snapshot().await;
        assert!(data.word_sets.is_empty());
        assert!(data.users["u1"].created_word_sets.is_empty());
    }

    #[tokio::test]
    async fn test_stars() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        let ws = seed_word_set(&store, "ws1", "u1", &["a", "b"]).await;
        let svc = service(&store);

        svc.toggle_word_star("ws1", &ws.words[0].id).await.unwrap();
        let stored = &store.snapshot().await.word_sets["ws1"];
        assert!(stored.words[0].star);
        assert!(!stored.words[1].star);

        svc.toggle_all_word_star("ws1", true).await.unwrap();
        assert!(store.snapshot().await.word_sets["ws1"].words.iter().all(|w| w.star));

        let err = svc.toggle_word_star("ws1", "nope").await.unwrap_err();
        assert_eq!(err, DomainError::NotFound(WORD_NOT_FOUND.into()));
    }

    #[tokio::test]
    async fn test_update_word_with_sounds() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        let ws = seed_word_set(&store, "ws1", "u1", &["a"]).await;
        let request = UpdateWordRequest {
            word_set_id: "ws1".into(),
            word_id: ws.words[0].id.clone(),
            new_vocabulary: "colour".into(),
            new_definition: "顏色".into(),
            new_vocabulary_sound: Some(" en-GB ".into()),
            new_definition_sound: Some("zh-CN".into()),
        };

        service(&store).update_word(request.clone(), true).await.unwrap();
        let stored = &store.snapshot().await.word_sets["ws1"].words[0];
        assert_eq!(stored.vocabulary, "colour");
        assert_eq!(stored.vocabulary_sound, "en-GB");

        let mut empty = request;
        empty.new_vocabulary = String::new();
        let err = service(&store).update_word(empty, false).await.unwrap_err();
        assert_eq!(err, DomainError::ValidationFailed(VOCABULARY_UPDATE_MESSAGE.into()));
    }

    #[tokio::test]
    async fn test_flags_require_author() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        seed_user(&store, "u2", "bob").await;
        seed_word_set(&store, "ws1", "u1", &["a"]).await;
        let svc = service(&store);

        let err = svc.toggle_allow_copy("u2", "ws1").await.unwrap_err();
        assert_eq!(err, DomainError::Forbidden(NOT_WORD_SET_AUTHOR.into()));

        svc.toggle_allow_copy("u1", "ws1").await.unwrap();
        svc.toggle_is_public("u1", "ws1").await.unwrap();
        let stored = &store.snapshot().await.word_sets["ws1"];
        assert!(!stored.allow_copy);
        assert!(!stored.is_public);
    }

    #[tokio::test]
    async fn test_stalled_store_times_out_and_rolls_back() {
        let store = MemoryStore::new();
        seed_user(&store, "u1", "alice").await;
        seed_word_set(&store, "ws1", "u1", &["a"]).await;
        store.stall(Duration::from_millis(300));

        let svc = WordSetService::new(Arc::new(store.clone()), Duration::from_millis(100));
        let err = svc.add_word("ws1", word("late")).await.unwrap_err();
        assert_eq!(err, DomainError::Timeout("store"));

        store.stall(Duration::ZERO);
        assert_eq!(store.snapshot().await.word_sets["ws1"].word_cnt, 1);
    }
}
