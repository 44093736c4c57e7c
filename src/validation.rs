// validation.rs - user input rules shared by registration, profile edits and word sets
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const MAX_NAME_LEN: usize = 12;
pub const MAX_TITLE_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 150;
pub const MAX_CONTENT_LEN: usize = 300;
pub const MAX_VOCABULARY_LEN: usize = 100;
pub const MAX_DEFINITION_LEN: usize = 300;
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";
pub const AUDIO_LOCALES: [&str; 5] = ["en-US", "en-GB", "en-AU", "zh-TW", "zh-CN"];

static NAME_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("name pattern"));

static ADDR_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("addr-spec pattern")
});

/// A rejected input, carrying the message shown to the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("使用者名稱不得為空")]
    NameEmpty,
    #[error("使用者名稱不得超過12字元")]
    NameTooLong,
    #[error("使用者名稱不得為{0}")]
    NameReserved(String),
    #[error("使用者名稱只能包含英文、數字、底線")]
    NameCharset,

    #[error("電子郵件格式錯誤")]
    EmailFormat,

    #[error("密碼長度須為8至20")]
    PasswordLength,
    #[error("密碼至少包含一個小寫英文字母")]
    PasswordLowercase,
    #[error("密碼至少包含一個大寫英文字母")]
    PasswordUppercase,
    #[error("密碼至少包含一個數字")]
    PasswordDigit,
    #[error("密碼至少包含一個特殊字元(@$!%*?&)")]
    PasswordSpecial,
    #[error("密碼含有未知字元 合法特殊字元為(@$!%*?&)")]
    PasswordUnknownChar,
    #[error("兩次密碼輸入不一致")]
    PasswordMismatch,

    #[error("聲音格式錯誤(en-US, en-GB, en-AU, zh-TW, zh-CN)")]
    InvalidAudioLocale,

    #[error("單字字數不得為0或超過100字元")]
    VocabularyLength,
    #[error("註釋字數不得為0或超過300字元")]
    DefinitionLength,
    #[error("標題字數不得為0或超過50字元")]
    TitleLength,
    #[error("敘述字數不得超過150字元")]
    DescriptionLength,

    #[error("回饋建議的標題不得為空")]
    FeedbackTitleEmpty,
    #[error("回饋建議的標題不得超過50個字")]
    FeedbackTitleTooLong,
    #[error("回饋建議的內容不得為空")]
    FeedbackContentEmpty,
    #[error("回饋建議的內容不得超過300個字")]
    FeedbackContentTooLong,
}

/// Returns the trimmed display name when it is acceptable.
pub fn validate_name(raw: &str, admin_name: &str) -> Result<String, InputError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(InputError::NameEmpty);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(InputError::NameTooLong);
    }
    if name == admin_name {
        return Err(InputError::NameReserved(admin_name.to_string()));
    }
    if !NAME_CHARSET.is_match(name) {
        return Err(InputError::NameCharset);
    }
    Ok(name.to_string())
}

/// Mailbox syntax only; deliverability is never checked.
pub fn validate_email(raw: &str) -> Result<String, InputError> {
    let email = raw.trim();
    let (local, domain) = email.split_once('@').ok_or(InputError::EmailFormat)?;
    if local.len() > 64 || domain.len() > 255 || !ADDR_SPEC.is_match(email) {
        return Err(InputError::EmailFormat);
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<(), InputError> {
    let len = password.chars().count();
    if !(8..=20).contains(&len) {
        return Err(InputError::PasswordLength);
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(InputError::PasswordLowercase);
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(InputError::PasswordUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(InputError::PasswordDigit);
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err(InputError::PasswordSpecial);
    }
    if password
        .chars()
        .any(|c| !c.is_ascii_alphanumeric() && !PASSWORD_SPECIALS.contains(c))
    {
        return Err(InputError::PasswordUnknownChar);
    }
    Ok(())
}

/// Checks a new password and its confirmation.
pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), InputError> {
    validate_password(password)?;
    if password != confirmation {
        return Err(InputError::PasswordMismatch);
    }
    Ok(())
}

/// Returns the canonical locale tag for trimmed input.
pub fn validate_sound(raw: &str) -> Result<&'static str, InputError> {
    let tag = raw.trim();
    AUDIO_LOCALES
        .iter()
        .copied()
        .find(|known| *known == tag)
        .ok_or(InputError::InvalidAudioLocale)
}

pub fn validate_vocabulary(text: &str) -> Result<(), InputError> {
    bounded(text, 1, MAX_VOCABULARY_LEN).ok_or(InputError::VocabularyLength)
}

pub fn validate_definition(text: &str) -> Result<(), InputError> {
    bounded(text, 1, MAX_DEFINITION_LEN).ok_or(InputError::DefinitionLength)
}

pub fn validate_title(text: &str) -> Result<(), InputError> {
    bounded(text, 1, MAX_TITLE_LEN).ok_or(InputError::TitleLength)
}

pub fn validate_description(text: &str) -> Result<(), InputError> {
    bounded(text, 0, MAX_DESCRIPTION_LEN).ok_or(InputError::DescriptionLength)
}

pub fn validate_feedback(title: &str, content: &str) -> Result<(), InputError> {
    if title.is_empty() {
        return Err(InputError::FeedbackTitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(InputError::FeedbackTitleTooLong);
    }
    if content.is_empty() {
        return Err(InputError::FeedbackContentEmpty);
    }
    if content.chars().count() > MAX_CONTENT_LEN {
        return Err(InputError::FeedbackContentTooLong);
    }
    Ok(())
}

fn bounded(text: &str, min: usize, max: usize) -> Option<()> {
    let len = text.chars().count();
    (min..=max).contains(&len).then_some(())
}
