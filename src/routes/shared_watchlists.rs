//! Shared watchlist handlers
//!
//! Everything addressed by `:watchlist_id` sits behind the membership gate
//! mounted in `routes::api_routes`; handlers here assume it has passed.

use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::Caller,
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::RequestId,
    models::{SharedWatchlist, SharedWatchlistDraft, SharedWatchlistPatch},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SharedRatingRequest {
    pub rating: f64,
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub title_id: String,
    pub fully_rated: bool,
}

pub async fn list_watchlists(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<SharedWatchlist>>> {
    Ok(Json(
        state.shared_watchlists.list_for_user(caller.user_id).await?,
    ))
}

pub async fn create_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Extension(request_id): Extension<RequestId>,
    AppJson(draft): AppJson<SharedWatchlistDraft>,
) -> AppResult<(StatusCode, Json<SharedWatchlist>)> {
    tracing::info!(
        request_id = %request_id,
        owner = %caller.username,
        name = %draft.name,
        "Creating shared watchlist"
    );

    let watchlist = state
        .shared_watchlists
        .create(draft, caller.user_id, &caller.username)
        .await?;
    Ok((StatusCode::CREATED, Json(watchlist)))
}

pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    AppPath(watchlist_id): AppPath<Uuid>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(state.shared_watchlists.get(watchlist_id).await?))
}

pub async fn update_watchlist(
    State(state): State<Arc<AppState>>,
    AppPath(watchlist_id): AppPath<Uuid>,
    AppJson(patch): AppJson<SharedWatchlistPatch>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state.shared_watchlists.update(watchlist_id, patch).await?,
    ))
}

pub async fn delete_watchlist(
    State(state): State<Arc<AppState>>,
    AppPath(watchlist_id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.shared_watchlists.delete(watchlist_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    AppPath((watchlist_id, username)): AppPath<(Uuid, String)>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state
            .shared_watchlists
            .add_member(watchlist_id, &username)
            .await?,
    ))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    AppPath((watchlist_id, username)): AppPath<(Uuid, String)>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state
            .shared_watchlists
            .remove_member(watchlist_id, &username)
            .await?,
    ))
}

pub async fn add_title(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppPath((watchlist_id, title_id)): AppPath<(Uuid, String)>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state
            .shared_watchlists
            .add_title(watchlist_id, &title_id, &caller.username)
            .await?,
    ))
}

pub async fn remove_title(
    State(state): State<Arc<AppState>>,
    AppPath((watchlist_id, title_id)): AppPath<(Uuid, String)>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state
            .shared_watchlists
            .remove_title(watchlist_id, &title_id)
            .await?,
    ))
}

pub async fn rate_title(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppPath((watchlist_id, title_id)): AppPath<(Uuid, String)>,
    AppJson(request): AppJson<SharedRatingRequest>,
) -> AppResult<Json<SharedWatchlist>> {
    Ok(Json(
        state
            .shared_watchlists
            .rate(watchlist_id, &title_id, caller.user_id, request.rating)
            .await?,
    ))
}

pub async fn is_fully_rated(
    State(state): State<Arc<AppState>>,
    AppPath((watchlist_id, title_id)): AppPath<(Uuid, String)>,
) -> AppResult<Json<CompletionResponse>> {
    let fully_rated = state
        .shared_watchlists
        .is_fully_rated(watchlist_id, &title_id)
        .await?;
    Ok(Json(CompletionResponse {
        title_id,
        fully_rated,
    }))
}
