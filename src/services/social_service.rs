// services/social_service.rs - likes and forks, the mutations other users make on a word set
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::error::{within, DomainError, DomainResult};
use super::{USER_NOT_FOUND, WORD_SET_NOT_FOUND};
use crate::database::models::{new_id, User};
use crate::database::Store;

pub const SELF_LIKE_MESSAGE: &str = "操作錯誤 你為此單字集作者";
pub const USERS_MISSING_MESSAGE: &str = "未找到所有用戶";
pub const COPY_REFUSED_MESSAGE: &str = "此單字集拒絕複製";
pub const AUTHOR_MISSING_MESSAGE: &str = "找不到使用者 請重試";

pub struct SocialService {
    store: Arc<dyn Store>,
    deadline: Duration,
}

impl SocialService {
    pub fn new(store: Arc<dyn Store>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Likes the set, or takes the like back when it is already there.
    ///
    /// The liker's list, the author's counter and the set's liker list and
    /// counter change together or not at all. Returns the new liked state.
    pub async fn toggle_like(&self, user_id: &str, word_set_id: &str) -> DomainResult<bool> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let mut word_set = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_SET_NOT_FOUND))?;
            if word_set.author_id == user_id {
                return Err(DomainError::conflict(SELF_LIKE_MESSAGE));
            }

            let ids = [user_id.to_string(), word_set.author_id.clone()];
            let (mut liker, mut author) = split_pair(tx.users(&ids).await?, user_id, &word_set.author_id)?;

            let liked = if liker.has_liked(word_set_id) {
                liker.remove_liked(word_set_id);
                author.liked_cnt -= 1;
                word_set.remove_liker(user_id);
                false
            } else {
                liker.add_liked(word_set_id);
                author.liked_cnt += 1;
                word_set.add_liker(user_id);
                true
            };

            tx.save_user(&liker).await?;
            tx.save_user(&author).await?;
            tx.save_word_set(&word_set).await?;
            tx.commit().await?;

            info!(user_id, word_set_id, liked, likes = word_set.likes, "like toggled");
            Ok(liked)
        })
        .await
    }

    /// Copies the set into the caller's library and returns the copy's id.
    ///
    /// The source is never modified. Its author gains one fork unless the
    /// caller forks their own set.
    pub async fn fork(&self, user_id: &str, word_set_id: &str) -> DomainResult<String> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let source = tx
                .word_set(word_set_id)
                .await?
                .ok_or_else(|| DomainError::not_found(WORD_SET_NOT_FOUND))?;
            if !source.allow_copy {
                return Err(DomainError::conflict(COPY_REFUSED_MESSAGE));
            }

            let mut forker = tx
                .user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;

            if source.author_id != user_id {
                let mut author = tx
                    .user(&source.author_id)
                    .await?
                    .ok_or_else(|| DomainError::not_found(AUTHOR_MISSING_MESSAGE))?;
                author.forked_cnt += 1;
                tx.save_user(&author).await?;
            }

            let mut copy = source.fork_for(new_id(), user_id);
            for word in &mut copy.words {
                word.id = new_id();
            }
            tx.insert_word_set(&copy).await?;
            forker.add_created(&copy.id);
            tx.save_user(&forker).await?;
            tx.commit().await?;

            info!(user_id, source_id = word_set_id, copy_id = %copy.id, "word set forked");
            Ok(copy.id)
        })
        .await
    }
}

fn split_pair(users: Vec<User>, first: &str, second: &str) -> DomainResult<(User, User)> {
    let mut a = None;
    let mut b = None;
    for user in users {
        if user.id == first {
            a = Some(user);
        } else if user.id == second {
            b = Some(user);
        }
    }
    match (a, b) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(DomainError::not_found(USERS_MISSING_MESSAGE)),
    }
}
