use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension,
};
use uuid::Uuid;

use crate::{
    auth::{Caller, Gate},
    error::{AppError, AppResult},
    state::AppState,
};

/// Path parameter naming the shared watchlist a route operates on
pub const WATCHLIST_ID_PARAM: &str = "watchlist_id";

/// Verifies the bearer token and stores the `Caller` in request extensions
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.tokens.verify(token.trim())?;
    request.extensions_mut().insert(Caller::from(claims));

    Ok(next.run(request).await)
}

/// Lets the request through only for callers whose stored role is ADMIN
pub async fn admin_gate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    state
        .access
        .guarded(&caller, Gate::Admin, || async move { Ok(next.run(request).await) })
        .await
}

/// Lets the request through only for members of the watchlist in the path
pub async fn watchlist_gate(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    let watchlist_id = params
        .get(WATCHLIST_ID_PARAM)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| AppError::InvalidInput("Invalid watchlist id".to_string()))?;

    state
        .access
        .guarded(&caller, Gate::WatchlistMember(watchlist_id), || async move {
            Ok(next.run(request).await)
        })
        .await
}
