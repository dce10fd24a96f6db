use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    auth::Caller,
    error::AppResult,
    extract::{AppJson, AppPath, AppQuery},
    models::UserView,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.get_by_id(caller.user_id).await?))
}

pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    state
        .accounts
        .change_password(
            caller.user_id,
            &request.current_password,
            &request.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.get_by_id(id).await?))
}

pub async fn get_user_by_username(
    State(state): State<Arc<AppState>>,
    AppPath(username): AppPath<String>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.get_by_username(&username).await?))
}

/// Admin only
pub async fn list_users(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<UserView>>> {
    Ok(Json(state.accounts.list_all().await?))
}

/// Admin only
pub async fn update_role(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<RoleQuery>,
) -> AppResult<Json<UserView>> {
    Ok(Json(state.accounts.update_role(id, &query.role).await?))
}

/// Admin only
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    state.accounts.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
