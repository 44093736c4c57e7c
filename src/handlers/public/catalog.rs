// handlers/public/catalog.rs - anonymous read endpoints
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use tracing::error;

use crate::app::AppState;
use crate::database::models::WordSet;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{
    FeedbackResponse, FullWordCard, HealthResponse, LibPage, NewWordSetResponse, PageQuery, PopularWordSetResponse,
    PreviewQuery, PreviewWordsResponse, SearchQuery, SearchWordSetResponse,
};

/// GET /health - liveness plus a store ping
pub async fn health(State(state): State<AppState>) -> ApiResponse<HealthResponse> {
    match state.services.catalog.ping().await {
        Ok(()) => ApiResponse::success(HealthResponse {
            status: "ok".to_string(),
            store: "ok".to_string(),
        }),
        Err(e) => {
            error!(error = %e, "store ping failed");
            ApiResponse::with_status(
                HealthResponse {
                    status: "degraded".to_string(),
                    store: "unreachable".to_string(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}

/// GET /getWordSet/:wordSetID
pub async fn get_word_set(State(state): State<AppState>, Path(word_set_id): Path<String>) -> ApiResult<WordSet> {
    Ok(ApiResponse::success(state.services.catalog.word_set(&word_set_id).await?))
}

/// GET /getWords/:wordSetID - every word of a set, for the study view
pub async fn get_words(State(state): State<AppState>, Path(word_set_id): Path<String>) -> ApiResult<FullWordCard> {
    Ok(ApiResponse::success(state.services.catalog.full_word_card(&word_set_id).await?))
}

/// GET /getWordSetCard?query&curNumber - title prefix search
pub async fn get_word_set_card(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchWordSetResponse> {
    let page = state.services.catalog.search(&query.query, &query.cur_number).await?;
    Ok(ApiResponse::success(page))
}

/// GET /getPreviewWords?wordSetID&curNumber
pub async fn get_preview_words(
    State(state): State<AppState>,
    Query(query): Query<PreviewQuery>,
) -> ApiResult<PreviewWordsResponse> {
    let page = state.services.catalog.preview(&query.word_set_id, &query.cur_number).await?;
    Ok(ApiResponse::success(page))
}

/// GET /getWordSetsInLib/:userID
pub async fn get_word_sets_in_lib(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<LibPage> {
    Ok(ApiResponse::success(state.services.catalog.lib_page(&user_id).await?))
}

/// GET /getNewWordSet
pub async fn get_new_word_set(State(state): State<AppState>) -> ApiResult<NewWordSetResponse> {
    let new_word_set = state.services.catalog.newest().await?;
    Ok(ApiResponse::success(NewWordSetResponse { new_word_set }))
}

/// GET /getPopularWordSet
pub async fn get_popular_word_set(State(state): State<AppState>) -> ApiResult<PopularWordSetResponse> {
    let popular_word_set = state.services.catalog.popular().await?;
    Ok(ApiResponse::success(PopularWordSetResponse { popular_word_set }))
}

/// GET /getFeedback?curNumber
pub async fn get_feedback(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<FeedbackResponse> {
    Ok(ApiResponse::success(state.services.activity.feedbacks(&query.cur_number).await?))
}
