/// Request and response shapes exchanged with the web client
use serde::{Deserialize, Serialize};

use crate::database::models::{Feedback, User, Word, WordSet};
use crate::middleware::gate::{Gated, Owner};

fn yes() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Public account requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPasswordRegisterRequest {
    pub user_name: String,
    pub user_email: String,
    pub user_password: String,
    pub re_user_password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPasswordLogInRequest {
    pub user_email: String,
    pub user_password: String,
}

/// Federated identity credential, used for both registration and log in.
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialRequest {
    pub credential: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub validate_code: String,
    pub password: String,
    pub re_password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivateEmailRequest {
    pub token: String,
}

// ---------------------------------------------------------------------------
// User-owned mutations
// ---------------------------------------------------------------------------

/// Word set as submitted by its author. Ids, counters and timestamps are
/// assigned by the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWordSet {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub words: Vec<Word>,
    #[serde(default)]
    pub should_swap: bool,
    #[serde(default = "yes")]
    pub allow_copy: bool,
    #[serde(default = "yes")]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWordSetRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "wordSet")]
    pub word_set: NewWordSet,
}

impl Gated for CreateWordSetRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.word_set.title.as_str()]
    }

    fn has_content(&self) -> bool {
        !self.word_set.words.is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserNameRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub new_name: String,
}

impl Gated for ChangeUserNameRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.new_name.as_str()]
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserEmailRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub new_email: String,
    pub validate_code: String,
}

impl Gated for ChangeUserEmailRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.new_email.as_str(), self.validate_code.as_str()]
    }
}

/// A user acting on one word set: like, fork, visit or the author toggles.
#[derive(Debug, Clone, Deserialize)]
pub struct UserWordSetRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
}

impl Gated for UserWordSetRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.word_set_id.as_str()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadMailRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "mailID")]
    pub mail_id: String,
}

impl Gated for ReadMailRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.mail_id.as_str()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFeedbackRequest {
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub title: String,
    pub content: String,
}

impl Gated for CreateFeedbackRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.author_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogErrorRequest {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "errorID", default)]
    pub error_id: String,
    #[serde(default)]
    pub error: String,
    #[serde(rename = "errorInfo", default)]
    pub error_info: String,
    #[serde(default)]
    pub time: String,
}

impl Gated for LogErrorRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::User(&self.user_id)
    }
}

// ---------------------------------------------------------------------------
// Word-set-owned mutations
// ---------------------------------------------------------------------------

/// Partial edit of one existing word. Empty strings and a zero order mean
/// "leave unchanged".
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWord {
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
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWordSet {
    pub id: String,
    /// Replaces the title only when present and non-empty.
    #[serde(default)]
    pub title: Option<String>,
    /// Replaces the description whenever present, empty included.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub words: Vec<EditWord>,
    #[serde(default)]
    pub should_swap: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWordSetRequest {
    #[serde(default)]
    pub add_words: Vec<Word>,
    pub word_set: EditWordSet,
    #[serde(default)]
    pub remove_words: Vec<String>,
}

impl Gated for EditWordSetRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set.id)
    }

    fn required(&self) -> Vec<&str> {
        self.word_set.words.iter().map(|w| w.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordSetRequest {
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
}

impl Gated for WordSetRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WordRequest {
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
    #[serde(rename = "wordID")]
    pub word_id: String,
}

impl Gated for WordRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.word_id.as_str()]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddWordRequest {
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
    pub word: Word,
}

impl Gated for AddWordRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAllWordStarRequest {
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
    #[serde(default)]
    pub new_star: bool,
}

impl Gated for ToggleAllWordStarRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set_id)
    }
}

/// Inline edit sends the two texts; the big card also sends both sounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWordRequest {
    #[serde(rename = "wordSetID")]
    pub word_set_id: String,
    #[serde(rename = "wordID")]
    pub word_id: String,
    pub new_vocabulary: String,
    pub new_definition: String,
    #[serde(default)]
    pub new_vocabulary_sound: Option<String>,
    #[serde(default)]
    pub new_definition_sound: Option<String>,
}

impl Gated for UpdateWordRequest {
    fn owner(&self) -> Owner<'_> {
        Owner::WordSet(&self.word_set_id)
    }

    fn required(&self) -> Vec<&str> {
        vec![self.word_id.as_str()]
    }
}

// ---------------------------------------------------------------------------
// Query strings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub cur_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewQuery {
    #[serde(rename = "wordSetID", default)]
    pub word_set_id: String,
    #[serde(default)]
    pub cur_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default)]
    pub cur_number: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeModeQuery {
    #[serde(default)]
    pub change_mode: String,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// The signed-in user as the web client keeps it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontEndUser {
    pub id: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub img: String,
    pub liked_word_sets: Vec<String>,
}

impl From<&User> for FrontEndUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            img: user.img.clone(),
            liked_word_sets: user.liked_word_sets.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLink {
    pub id: String,
    pub role: String,
    pub name: String,
    pub img: String,
}

impl From<&User> for UserLink {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            role: user.role.clone(),
            name: user.name.clone(),
            img: user.img.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibUser {
    pub id: String,
    pub role: String,
    pub name: String,
    pub img: String,
    pub created_at: String,
    pub like_cnt: i64,
    pub fork_cnt: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibWordSet {
    pub id: String,
    pub title: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub word_cnt: i64,
    pub created_at: String,
    pub updated_at: i64,
}

impl From<&WordSet> for LibWordSet {
    fn from(ws: &WordSet) -> Self {
        Self {
            id: ws.id.clone(),
            title: ws.title.clone(),
            author_id: ws.author_id.clone(),
            word_cnt: ws.word_cnt,
            created_at: ws.created_at.clone(),
            updated_at: ws.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibPage {
    pub user: LibUser,
    pub created_word_sets: Vec<LibWordSet>,
    pub liked_word_sets: Vec<LibWordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullWordCard {
    pub id: String,
    pub title: String,
    pub words: Vec<Word>,
    pub should_swap: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSetCard {
    pub id: String,
    pub title: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub updated_at: i64,
    pub should_swap: bool,
    pub word_cnt: i64,
    pub likes: i64,
}

impl From<&WordSet> for WordSetCard {
    fn from(ws: &WordSet) -> Self {
        Self {
            id: ws.id.clone(),
            title: ws.title.clone(),
            author_id: ws.author_id.clone(),
            updated_at: ws.updated_at,
            should_swap: ws.should_swap,
            word_cnt: ws.word_cnt,
            likes: ws.likes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchWordSetResponse {
    pub word_set_cards: Vec<WordSetCard>,
    pub have_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewWordsResponse {
    pub words: Vec<Word>,
    pub have_more: bool,
}

/// Compact card on the home page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePageWordSet {
    pub id: String,
    pub title: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub word_cnt: i64,
}

impl From<&WordSet> for HomePageWordSet {
    fn from(ws: &WordSet) -> Self {
        Self {
            id: ws.id.clone(),
            title: ws.title.clone(),
            author_id: ws.author_id.clone(),
            word_cnt: ws.word_cnt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentVisitResponse {
    pub record: Vec<HomePageWordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWordSetResponse {
    pub new_word_set: Vec<HomePageWordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularWordSetResponse {
    pub popular_word_set: Vec<HomePageWordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub feedbacks: Vec<Feedback>,
    pub have_more: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub store: String,
}
