// services/activity_service.rs - mail box, recent visits, feedback and client error reports
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::error::{within, DomainError, DomainResult};
use super::{parse_offset, PAGE_SIZE, USER_NOT_FOUND};
use crate::database::models::{new_id, now, today, ErrorLog, Feedback, Mail, RecentVisit};
use crate::database::Store;
use crate::types::{CreateFeedbackRequest, FeedbackResponse, HomePageWordSet, LogErrorRequest, RecentVisitResponse};
use crate::validation::validate_feedback;

pub const MAIL_NOT_FOUND_MESSAGE: &str = "查無該信件";
pub const EMPTY_QUERY_MESSAGE: &str = "搜尋值為空";

pub struct ActivityService {
    store: Arc<dyn Store>,
    deadline: Duration,
}

impl ActivityService {
    pub fn new(store: Arc<dyn Store>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// The user's mails, newest first.
    pub async fn mails(&self, user_id: &str) -> DomainResult<Vec<Mail>> {
        within(self.deadline, async {
            let user = self
                .store
                .find_user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            let mut mails = self.store.find_mails(&user.mails).await?;
            mails.sort_by(|a, b| b.date.cmp(&a.date));
            Ok(mails)
        })
        .await
    }

    pub async fn unread_count(&self, user_id: &str) -> DomainResult<usize> {
        let mails = self.mails(user_id).await?;
        Ok(mails.iter().filter(|mail| !mail.read).count())
    }

    pub async fn read_mail(&self, user_id: &str, mail_id: &str) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            let user = tx
                .user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            if !user.owns_mail(mail_id) {
                return Err(DomainError::not_found(MAIL_NOT_FOUND_MESSAGE));
            }
            let mut mail = tx
                .mail(mail_id)
                .await?
                .ok_or_else(|| DomainError::not_found(MAIL_NOT_FOUND_MESSAGE))?;
            if mail.read {
                return Ok(());
            }
            mail.read = true;
            tx.save_mail(&mail).await?;
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Puts the set at the front of the user's recent visits.
    pub async fn add_recent_visit(&self, user_id: &str, word_set_id: &str) -> DomainResult<()> {
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            match tx.recent_visit(user_id).await? {
                Some(mut recent) => {
                    recent.visit(word_set_id);
                    tx.save_recent_visit(&recent).await?;
                }
                None => {
                    warn!(user_id, "recent visit record missing, creating it");
                    let mut recent = RecentVisit::empty(user_id.to_string());
                    recent.visit(word_set_id);
                    tx.insert_recent_visit(&recent).await?;
                }
            }
            tx.commit().await?;
            Ok(())
        })
        .await
    }

    /// Recently visited sets in visit order. Sets deleted since are skipped.
    pub async fn recent_visits(&self, user_id: &str) -> DomainResult<RecentVisitResponse> {
        within(self.deadline, async {
            let recent = self
                .store
                .find_recent_visit(user_id)
                .await?
                .unwrap_or_else(|| RecentVisit::empty(user_id.to_string()));
            let mut word_sets = self.store.find_word_sets(&recent.record).await?;
            word_sets.sort_by_key(|ws| recent.rank(&ws.id));
            Ok(RecentVisitResponse {
                record: word_sets.iter().map(HomePageWordSet::from).collect(),
            })
        })
        .await
    }

    pub async fn create_feedback(&self, request: CreateFeedbackRequest) -> DomainResult<()> {
        let title = request.title.trim();
        let content = request.content.trim();
        validate_feedback(title, content)?;

        let feedback = Feedback {
            id: new_id(),
            author_id: request.author_id.clone(),
            title: title.to_string(),
            content: content.to_string(),
            created_at: now(),
            formatted_created_at: today(),
        };
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.insert_feedback(&feedback).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        info!(author_id = %feedback.author_id, feedback_id = %feedback.id, "feedback received");
        Ok(())
    }

    pub async fn feedbacks(&self, cur_number: &str) -> DomainResult<FeedbackResponse> {
        if cur_number.trim().is_empty() {
            return Err(DomainError::malformed(EMPTY_QUERY_MESSAGE));
        }
        let skip = parse_offset(cur_number)?;
        let mut feedbacks = within(self.deadline, async {
            Ok(self.store.list_feedbacks(skip, PAGE_SIZE + 1).await?)
        })
        .await?;

        let have_more = feedbacks.len() as i64 > PAGE_SIZE;
        feedbacks.truncate(PAGE_SIZE as usize);
        Ok(FeedbackResponse { feedbacks, have_more })
    }

    pub async fn log_error(&self, request: LogErrorRequest) -> DomainResult<()> {
        let entry = ErrorLog {
            id: new_id(),
            user_id: request.user_id,
            error_id: request.error_id,
            error: request.error,
            error_info: request.error_info,
            time: request.time,
        };
        within(self.deadline, async {
            let mut tx = self.store.begin().await?;
            tx.insert_error_log(&entry).await?;
            tx.commit().await?;
            Ok(())
        })
        .await?;
        warn!(user_id = %entry.user_id, error_id = %entry.error_id, error = %entry.error, "client error reported");
        Ok(())
    }
}
