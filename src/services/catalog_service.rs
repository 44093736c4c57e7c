// services/catalog_service.rs - read side: word set pages, search, library and home page lists
use std::sync::Arc;
use std::time::Duration;

use super::activity_service::EMPTY_QUERY_MESSAGE;
use super::error::{within, DomainError, DomainResult};
use super::{parse_offset, PAGE_SIZE, USER_NOT_FOUND, WORD_SET_NOT_FOUND};
use crate::database::models::WordSet;
use crate::database::{ShowcaseOrder, Store};
use crate::types::{
    FullWordCard, HomePageWordSet, LibPage, LibUser, LibWordSet, PreviewWordsResponse, SearchWordSetResponse,
    WordSetCard,
};

pub struct CatalogService {
    store: Arc<dyn Store>,
    deadline: Duration,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    pub async fn word_set(&self, word_set_id: &str) -> DomainResult<WordSet> {
        within(self.deadline, async { Ok(self.store.find_word_set(word_set_id).await?) })
            .await?
            .ok_or_else(|| DomainError::not_found(WORD_SET_NOT_FOUND))
    }

    pub async fn full_word_card(&self, word_set_id: &str) -> DomainResult<FullWordCard> {
        let ws = self.word_set(word_set_id).await?;
        Ok(FullWordCard {
            id: ws.id,
            title: ws.title,
            words: ws.words,
            should_swap: ws.should_swap,
        })
    }

    /// Title prefix search. One extra row is read to learn whether another page exists.
    pub async fn search(&self, query: &str, cur_number: &str) -> DomainResult<SearchWordSetResponse> {
        if query.is_empty() || cur_number.trim().is_empty() {
            return Err(DomainError::malformed(EMPTY_QUERY_MESSAGE));
        }
        let skip = parse_offset(cur_number)?;
        let hits = within(self.deadline, async {
            Ok(self.store.search_word_sets(query, skip, PAGE_SIZE + 1).await?)
        })
        .await?;

        let have_more = hits.len() as i64 > PAGE_SIZE;
        Ok(SearchWordSetResponse {
            word_set_cards: hits.iter().take(PAGE_SIZE as usize).map(WordSetCard::from).collect(),
            have_more,
        })
    }

    pub async fn preview(&self, word_set_id: &str, cur_number: &str) -> DomainResult<PreviewWordsResponse> {
        if word_set_id.is_empty() || cur_number.trim().is_empty() {
            return Err(DomainError::malformed(EMPTY_QUERY_MESSAGE));
        }
        let start = parse_offset(cur_number)? as usize;
        let ws = self.word_set(word_set_id).await?;

        let len = ws.words.len();
        let end = start.saturating_add(PAGE_SIZE as usize);
        Ok(PreviewWordsResponse {
            words: ws.words[start.min(len)..end.min(len)].to_vec(),
            have_more: end < len,
        })
    }

    /// Owner summary plus the sets they created and liked, in list order.
    pub async fn lib_page(&self, user_id: &str) -> DomainResult<LibPage> {
        within(self.deadline, async {
            let user = self
                .store
                .find_user(user_id)
                .await?
                .ok_or_else(|| DomainError::not_found(USER_NOT_FOUND))?;
            let created = self.store.find_word_sets(&user.created_word_sets).await?;
            let liked = self.store.find_word_sets(&user.liked_word_sets).await?;

            Ok(LibPage {
                user: LibUser {
                    id: user.id.clone(),
                    role: user.role.clone(),
                    name: user.name.clone(),
                    img: user.img.clone(),
                    created_at: user.created_at.clone(),
                    like_cnt: user.liked_cnt,
                    fork_cnt: user.forked_cnt,
                },
                created_word_sets: created.iter().map(LibWordSet::from).collect(),
                liked_word_sets: liked.iter().map(LibWordSet::from).collect(),
            })
        })
        .await
    }

    pub async fn newest(&self) -> DomainResult<Vec<HomePageWordSet>> {
        self.showcase(ShowcaseOrder::Newest).await
    }

    pub async fn popular(&self) -> DomainResult<Vec<HomePageWordSet>> {
        self.showcase(ShowcaseOrder::Popular).await
    }

    async fn showcase(&self, order: ShowcaseOrder) -> DomainResult<Vec<HomePageWordSet>> {
        let sets = within(self.deadline, async {
            Ok(self.store.list_public_word_sets(order, PAGE_SIZE).await?)
        })
        .await?;
        Ok(sets.iter().map(HomePageWordSet::from).collect())
    }

    pub async fn ping(&self) -> DomainResult<()> {
        within(self.deadline, async { Ok(self.store.ping().await?) }).await
    }
}
