use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ROLE: &str = "user";

/// Account document. Exactly one of `password` and `is_google` identifies how it signs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub mails: Vec<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub img: String,
    pub is_google: bool,
    pub created_word_sets: Vec<String>,
    pub liked_word_sets: Vec<String>,
    pub created_at: String,
    pub liked_cnt: i64,
    pub forked_cnt: i64,
}

impl User {
    /// A fresh account whose only mail is the welcome letter.
    pub fn register(
        id: String,
        name: String,
        email: String,
        password: Option<String>,
        img: String,
        welcome_mail_id: String,
    ) -> Self {
        Self {
            id,
            role: DEFAULT_ROLE.to_string(),
            name,
            email,
            mails: vec![welcome_mail_id],
            is_google: password.is_none(),
            password,
            img,
            created_word_sets: Vec::new(),
            liked_word_sets: Vec::new(),
            created_at: super::today(),
            liked_cnt: 0,
            forked_cnt: 0,
        }
    }

    pub fn has_liked(&self, word_set_id: &str) -> bool {
        self.liked_word_sets.iter().any(|id| id == word_set_id)
    }

    pub fn owns_mail(&self, mail_id: &str) -> bool {
        self.mails.iter().any(|id| id == mail_id)
    }

    /// Appends to the owned list unless the id is already present.
    pub fn add_created(&mut self, word_set_id: &str) {
        push_unique(&mut self.created_word_sets, word_set_id);
    }

    pub fn remove_created(&mut self, word_set_id: &str) {
        self.created_word_sets.retain(|id| id != word_set_id);
    }

    pub fn add_liked(&mut self, word_set_id: &str) {
        push_unique(&mut self.liked_word_sets, word_set_id);
    }

    pub fn remove_liked(&mut self, word_set_id: &str) {
        self.liked_word_sets.retain(|id| id != word_set_id);
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}
