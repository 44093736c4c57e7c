pub mod records;
pub mod user;
pub mod word_set;

pub use records::{ActivationRecord, CodePurpose, ErrorLog, Feedback, Mail, RecentVisit, VerificationCode};
pub use user::User;
pub use word_set::{Word, WordSet};

use chrono::Utc;

/// Seconds since the epoch; every expiry and `updatedAt` uses this clock.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Calendar date shown on cards, `YYYY/MM/DD`.
pub fn today() -> String {
    Utc::now().format("%Y/%m/%d").to_string()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
