use serde::{Deserialize, Serialize};

use super::user::push_unique;

/// One vocabulary/definition pair. Ids are assigned server side and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub vocabulary: String,
    #[serde(default)]
    pub definition: String,
    #[serde(default)]
    pub vocabulary_sound: String,
    #[serde(default)]
    pub definition_sound: String,
    #[serde(default)]
    pub star: bool,
}

/// Word set document.
///
/// `likes == liked_users.len()` and `word_cnt == words.len()` hold after every
/// mutation performed through the services. The store does not enforce them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSet {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub created_at: String,
    pub updated_at: i64,
    pub words: Vec<Word>,
    pub should_swap: bool,
    pub liked_users: Vec<String>,
    pub likes: i64,
    pub word_cnt: i64,
    pub allow_copy: bool,
    pub is_public: bool,
}

impl WordSet {
    pub fn word_mut(&mut self, word_id: &str) -> Option<&mut Word> {
        self.words.iter_mut().find(|w| w.id == word_id)
    }

    /// Recomputes `word_cnt` from the word list.
    pub fn recount(&mut self) {
        self.word_cnt = self.words.len() as i64;
    }

    pub fn touch(&mut self) {
        self.updated_at = super::now();
    }

    pub fn add_liker(&mut self, user_id: &str) {
        push_unique(&mut self.liked_users, user_id);
        self.likes = self.liked_users.len() as i64;
    }

    pub fn remove_liker(&mut self, user_id: &str) {
        self.liked_users.retain(|id| id != user_id);
        self.likes = self.liked_users.len() as i64;
    }

    /// Both counters agree with the collections they summarise.
    pub fn is_consistent(&self) -> bool {
        self.word_cnt == self.words.len() as i64 && self.likes == self.liked_users.len() as i64
    }

    /// Copy of this set owned by `author_id`: new id, fresh timestamps, no likes,
    /// and copying and publishing both allowed.
    pub fn fork_for(&self, new_id: String, author_id: &str) -> WordSet {
        WordSet {
            id: new_id,
            author_id: author_id.to_string(),
            created_at: super::today(),
            updated_at: super::now(),
            liked_users: Vec::new(),
            likes: 0,
            word_cnt: self.words.len() as i64,
            allow_copy: true,
            is_public: true,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::word;

    fn set_with_likes() -> WordSet {
        WordSet {
            id: "w1".into(),
            title: "Animals".into(),
            description: String::new(),
            author_id: "author".into(),
            created_at: "2024/01/01".into(),
            updated_at: 1,
            words: vec![word("cat"), word("dog")],
            should_swap: false,
            liked_users: vec!["u2".into()],
            likes: 1,
            word_cnt: 2,
            allow_copy: false,
            is_public: false,
        }
    }

    #[test]
    fn test_fork_resets_social_state() {
        let source = set_with_likes();
        let fork = source.fork_for("w2".into(), "u9");
        assert_eq!(fork.id, "w2");
        assert_eq!(fork.author_id, "u9");
        assert!(fork.liked_users.is_empty());
        assert_eq!(fork.likes, 0);
        assert!(fork.allow_copy && fork.is_public);
        assert_eq!(fork.words, source.words);
        assert!(fork.is_consistent());
    }

    #[test]
    fn test_likers_keep_counter_in_step() {
        let mut set = set_with_likes();
        set.add_liker("u3");
        set.add_liker("u3");
        assert_eq!(set.likes, 2);
        set.remove_liker("u2");
        assert_eq!(set.likes, 1);
        assert!(set.is_consistent());
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(set_with_likes()).unwrap();
        assert_eq!(json["authorID"], "author");
        assert_eq!(json["wordCnt"], 2);
        assert_eq!(json["words"][0]["vocabularySound"], "en-US");
    }
}
