use axum::{extract::State, Extension, Json};
use std::sync::Arc;

use crate::{
    auth::Caller,
    error::AppResult,
    extract::{AppJson, AppQuery},
    middleware::RequestId,
    models::{Rating, RatingInput},
    state::AppState,
};

use super::watchlist::TitleQuery;

/// Handler for rating submission
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Extension(request_id): Extension<RequestId>,
    AppJson(input): AppJson<RatingInput>,
) -> AppResult<Json<Rating>> {
    tracing::info!(
        request_id = %request_id,
        user_id = %caller.user_id,
        title_id = %input.title_id,
        "Processing rating submission"
    );

    let rating = state.ratings.submit_rating(input, caller.user_id).await?;
    Ok(Json(rating))
}

/// `null` when the caller has not rated the title
pub async fn get_rating(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppQuery(query): AppQuery<TitleQuery>,
) -> AppResult<Json<Option<Rating>>> {
    Ok(Json(
        state
            .ratings
            .get_rating(&query.title_id, caller.user_id)
            .await?,
    ))
}

pub async fn list_ratings(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<Vec<Rating>>> {
    Ok(Json(state.ratings.list_ratings(caller.user_id).await?))
}
