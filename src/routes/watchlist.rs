use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};

use crate::{
    auth::Caller,
    error::AppResult,
    extract::{AppPath, AppQuery},
    models::{PersonalWatchlist, WatchlistEntry},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub title_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub title_id: String,
    pub present: bool,
}

pub async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<HashMap<String, WatchlistEntry>>> {
    Ok(Json(state.watchlists.get(caller.user_id).await?))
}

/// `null` until the user's first watchlist mutation
pub async fn get_full_watchlist(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Option<PersonalWatchlist>>> {
    Ok(Json(state.watchlists.get_full(caller.user_id).await?))
}

pub async fn toggle(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppPath(title_id): AppPath<String>,
) -> AppResult<(StatusCode, Json<ToggleResponse>)> {
    let present = state.watchlists.toggle(&title_id, caller.user_id).await?;
    Ok((StatusCode::ACCEPTED, Json(ToggleResponse { title_id, present })))
}

pub async fn is_present(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppQuery(query): AppQuery<TitleQuery>,
) -> AppResult<Json<bool>> {
    Ok(Json(
        state
            .watchlists
            .is_present(caller.user_id, &query.title_id)
            .await?,
    ))
}
