use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::{error::AppResult, extract::AppJson, services::AuthToken, state::AppState};

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Handler for account registration
pub async fn register(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<CredentialsRequest>,
) -> AppResult<(StatusCode, Json<AuthToken>)> {
    let token = state
        .accounts
        .register(&request.username, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// Handler for login
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<CredentialsRequest>,
) -> AppResult<Json<AuthToken>> {
    let token = state
        .accounts
        .authenticate(&request.username, &request.password)
        .await?;
    Ok(Json(token))
}
