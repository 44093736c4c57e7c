// handlers/protected/word_set.rs - gated word set mutations
use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResult, Authorized, MessagePayload};
use crate::types::{
    AddWordRequest, CreateWordSetRequest, EditWordSetRequest, ToggleAllWordStarRequest, UpdateWordRequest,
    UserWordSetRequest, WordRequest, WordSetRequest,
};

/// POST /createWordSet - returns the new set's id
pub async fn create_word_set(
    State(state): State<AppState>,
    auth: Authorized<CreateWordSetRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { user_id, request, gate } = auth;
    let id = state.services.word_sets.create(&user_id, request.word_set).await?;
    Ok(gate.acknowledge(Some(id)))
}

/// POST /toggleLikeWordSet
pub async fn toggle_like_word_set(
    State(state): State<AppState>,
    auth: Authorized<UserWordSetRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .social
        .toggle_like(&auth.user_id, &auth.request.word_set_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /forkWordSet - returns the copy's id
pub async fn fork_word_set(
    State(state): State<AppState>,
    auth: Authorized<UserWordSetRequest>,
) -> ApiResult<MessagePayload> {
    let id = state.services.social.fork(&auth.user_id, &auth.request.word_set_id).await?;
    Ok(auth.gate.acknowledge(Some(id)))
}

/// POST /toggleAllowCopy
pub async fn toggle_allow_copy(
    State(state): State<AppState>,
    auth: Authorized<UserWordSetRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .word_sets
        .toggle_allow_copy(&auth.user_id, &auth.request.word_set_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /toggleIsPublic
pub async fn toggle_is_public(
    State(state): State<AppState>,
    auth: Authorized<UserWordSetRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .word_sets
        .toggle_is_public(&auth.user_id, &auth.request.word_set_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /updateWordSet - add, patch and remove words in one unit of work
pub async fn update_word_set(
    State(state): State<AppState>,
    auth: Authorized<EditWordSetRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.word_sets.edit(request).await?;
    Ok(gate.acknowledge(None))
}

/// POST /deleteWordSet
pub async fn delete_word_set(
    State(state): State<AppState>,
    auth: Authorized<WordSetRequest>,
) -> ApiResult<MessagePayload> {
    state.services.word_sets.delete(&auth.request.word_set_id).await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /addWord - returns the new word's id
pub async fn add_word(State(state): State<AppState>, auth: Authorized<AddWordRequest>) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    let id = state.services.word_sets.add_word(&request.word_set_id, request.word).await?;
    Ok(gate.acknowledge(Some(id)))
}

/// POST /deleteWord
pub async fn delete_word(State(state): State<AppState>, auth: Authorized<WordRequest>) -> ApiResult<MessagePayload> {
    state
        .services
        .word_sets
        .delete_word(&auth.request.word_set_id, &auth.request.word_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /toggleWordStar
pub async fn toggle_word_star(
    State(state): State<AppState>,
    auth: Authorized<WordRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .word_sets
        .toggle_word_star(&auth.request.word_set_id, &auth.request.word_id)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /toggleAllWordStar
pub async fn toggle_all_word_star(
    State(state): State<AppState>,
    auth: Authorized<ToggleAllWordStarRequest>,
) -> ApiResult<MessagePayload> {
    state
        .services
        .word_sets
        .toggle_all_word_star(&auth.request.word_set_id, auth.request.new_star)
        .await?;
    Ok(auth.gate.acknowledge(None))
}

/// POST /inlineUpdateWord - vocabulary and definition only
pub async fn inline_update_word(
    State(state): State<AppState>,
    auth: Authorized<UpdateWordRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.word_sets.update_word(request, false).await?;
    Ok(gate.acknowledge(None))
}

/// POST /bigWordCardUpdateWord - texts and both sounds
pub async fn big_word_card_update_word(
    State(state): State<AppState>,
    auth: Authorized<UpdateWordRequest>,
) -> ApiResult<MessagePayload> {
    let Authorized { request, gate, .. } = auth;
    state.services.word_sets.update_word(request, true).await?;
    Ok(gate.acknowledge(None))
}
