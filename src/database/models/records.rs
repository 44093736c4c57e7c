use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const RECENT_VISIT_CAP: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Mail {
    pub id: String,
    pub title: String,
    pub content: String,
    pub date: i64,
    #[serde(rename = "receiverID")]
    pub receiver_id: String,
    pub read: bool,
}

impl Mail {
    pub fn welcome(id: String, receiver_id: String, user_name: &str) -> Self {
        Self {
            id,
            title: "歡迎信件".to_string(),
            content: format!(
                "哈囉! <b>{}</b>，誠摯地歡迎您加入Quiz\n這裡多了您一定會變得更好! 也期待在這裡您能有所收穫!<br>讓我們一起努力 一起在學習的路上並肩同行<br>期待您的成長與蛻變，祝福您喔~~~",
                user_name
            ),
            date: super::now(),
            receiver_id,
            read: false,
        }
    }
}

/// Most recently visited word sets of one user, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RecentVisit {
    pub id: String,
    pub record: Vec<String>,
}

impl RecentVisit {
    pub fn empty(user_id: String) -> Self {
        Self {
            id: user_id,
            record: Vec::new(),
        }
    }

    /// Moves `word_set_id` to the front, dropping an older copy and anything past the cap.
    pub fn visit(&mut self, word_set_id: &str) {
        self.record.retain(|id| id != word_set_id);
        self.record.insert(0, word_set_id.to_string());
        self.record.truncate(RECENT_VISIT_CAP);
    }

    /// Position of each id in the record, for ordering fetched documents.
    pub fn rank(&self, word_set_id: &str) -> usize {
        self.record
            .iter()
            .position(|id| id == word_set_id)
            .unwrap_or(usize::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: String,
    #[serde(rename = "authorID")]
    pub author_id: String,
    pub title: String,
    pub content: String,
    pub created_at: i64,
    pub formatted_created_at: String,
}

/// Client side error report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ErrorLog {
    pub id: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "errorID")]
    pub error_id: String,
    pub error: String,
    #[serde(rename = "errorInfo")]
    pub error_info: String,
    pub time: String,
}

/// Email activation state, keyed by address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ActivationRecord {
    pub email: String,
    pub token: String,
    pub expire: i64,
    pub activated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodePurpose {
    /// Changing the account email to a new address
    Account,
    Password,
}

impl CodePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodePurpose::Account => "account",
            CodePurpose::Password => "password",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "account" => Some(CodePurpose::Account),
            "password" => Some(CodePurpose::Password),
            _ => None,
        }
    }

    pub fn mail_subject(&self) -> &'static str {
        match self {
            CodePurpose::Account => "更改帳號-驗證碼",
            CodePurpose::Password => "更改密碼-驗證碼",
        }
    }
}

/// Hashed six-digit code for an account or password change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationCode {
    pub purpose: CodePurpose,
    pub email: String,
    pub code_hash: String,
    pub expire: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_moves_to_front_without_duplicates() {
        let mut rv = RecentVisit::empty("u1".into());
        for id in ["a", "b", "c"] {
            rv.visit(id);
        }
        rv.visit("a");
        assert_eq!(rv.record, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_visit_caps_at_four() {
        let mut rv = RecentVisit::empty("u1".into());
        for id in ["a", "b", "c", "d", "e"] {
            rv.visit(id);
        }
        assert_eq!(rv.record, vec!["e", "d", "c", "b"]);
        rv.visit("c");
        assert_eq!(rv.record, vec!["c", "e", "d", "b"]);
    }

    #[test]
    fn test_code_purpose_round_trip() {
        assert_eq!(CodePurpose::parse("account"), Some(CodePurpose::Account));
        assert_eq!(CodePurpose::parse("Password"), None);
        assert_eq!(CodePurpose::Password.as_str(), "password");
    }
}
