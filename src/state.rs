use std::sync::Arc;

use crate::{
    auth::{AccessControl, SaltedSha256, TokenService},
    db::Stores,
    services::{AccountService, RatingService, SharedWatchlistService, WatchlistService},
};

/// Shared application state
pub struct AppState {
    pub tokens: TokenService,
    pub access: AccessControl,
    pub accounts: AccountService,
    pub watchlists: WatchlistService,
    pub shared_watchlists: SharedWatchlistService,
    pub ratings: RatingService,
}

impl AppState {
    /// Wires every service onto the given stores
    pub fn new(stores: Stores, tokens: TokenService) -> Self {
        let watchlists = WatchlistService::new(stores.watchlists.clone(), stores.ratings.clone());

        Self {
            access: AccessControl::new(stores.users.clone()),
            accounts: AccountService::new(
                stores.users.clone(),
                Arc::new(SaltedSha256),
                tokens.clone(),
            ),
            shared_watchlists: SharedWatchlistService::new(
                stores.shared_watchlists.clone(),
                stores.users.clone(),
            ),
            ratings: RatingService::new(
                stores.ratings.clone(),
                watchlists.clone(),
                stores.shared_watchlists.clone(),
            ),
            watchlists,
            tokens,
        }
    }

    /// State on a fresh in-memory store
    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(Stores::in_memory(), TokenService::new(jwt_secret))
    }
}
