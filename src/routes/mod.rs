use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{
        admin_gate, make_span_with_request_id, request_id_middleware, require_auth,
        watchlist_gate,
    },
    state::AppState,
};

pub mod auth;
pub mod ratings;
pub mod shared_watchlists;
pub mod users;
pub mod watchlist;

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/authenticate", post(auth::authenticate));

    let admin = Router::new()
        .route("/users", get(users::list_users))
        .route("/users/:id/role", put(users::update_role))
        .route("/users/:id", axum::routing::delete(users::delete_user))
        .route_layer(from_fn_with_state(state.clone(), admin_gate));

    let members_only = Router::new()
        .route(
            "/shared-watchlists/:watchlist_id",
            get(shared_watchlists::get_watchlist)
                .put(shared_watchlists::update_watchlist)
                .delete(shared_watchlists::delete_watchlist),
        )
        .route(
            "/shared-watchlists/:watchlist_id/members/:username",
            post(shared_watchlists::add_member).delete(shared_watchlists::remove_member),
        )
        .route(
            "/shared-watchlists/:watchlist_id/titles/:title_id",
            post(shared_watchlists::add_title).delete(shared_watchlists::remove_title),
        )
        .route(
            "/shared-watchlists/:watchlist_id/titles/:title_id/rating",
            post(shared_watchlists::rate_title),
        )
        .route(
            "/shared-watchlists/:watchlist_id/titles/:title_id/complete",
            get(shared_watchlists::is_fully_rated),
        )
        .route_layer(from_fn_with_state(state.clone(), watchlist_gate));

    let authenticated = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me/password", put(users::change_password))
        .route("/users/:id", get(users::get_user))
        .route("/users/username/:username", get(users::get_user_by_username))
        .route("/watchlist", get(watchlist::get_watchlist))
        .route("/watchlist/full", get(watchlist::get_full_watchlist))
        .route("/watchlist/present", get(watchlist::is_present))
        .route("/watchlist/:title_id", post(watchlist::toggle))
        .route("/ratings", post(ratings::submit).get(ratings::get_rating))
        .route("/ratings/all", get(ratings::list_ratings))
        .route(
            "/shared-watchlists",
            get(shared_watchlists::list_watchlists).post(shared_watchlists::create_watchlist),
        )
        .merge(admin)
        .merge(members_only)
        .route_layer(from_fn_with_state(state, require_auth));

    public.merge(authenticated)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
