use std::{collections::HashMap, sync::Arc};

use uuid::Uuid;

use crate::{
    db::{RatingStore, WatchlistStore},
    error::{AppError, AppResult},
    models::{PersonalWatchlist, WatchlistEntry},
};

/// Owns each user's personal watchlist
#[derive(Clone)]
pub struct WatchlistService {
    watchlists: Arc<dyn WatchlistStore>,
    ratings: Arc<dyn RatingStore>,
}

impl WatchlistService {
    pub fn new(watchlists: Arc<dyn WatchlistStore>, ratings: Arc<dyn RatingStore>) -> Self {
        Self {
            watchlists,
            ratings,
        }
    }

    /// Title map of the user's watchlist; empty if none exists yet
    pub async fn get(&self, user_id: Uuid) -> AppResult<HashMap<String, WatchlistEntry>> {
        Ok(self
            .watchlists
            .find_by_user(user_id)
            .await?
            .map(|watchlist| watchlist.movies)
            .unwrap_or_default())
    }

    pub async fn get_full(&self, user_id: Uuid) -> AppResult<Option<PersonalWatchlist>> {
        self.watchlists.find_by_user(user_id).await
    }

    /// Returns the user's watchlist, persisting an empty one first if needed
    pub async fn get_or_create(&self, user_id: Uuid) -> AppResult<PersonalWatchlist> {
        if let Some(watchlist) = self.watchlists.find_by_user(user_id).await? {
            return Ok(watchlist);
        }

        let watchlist = PersonalWatchlist::new(user_id);
        self.watchlists.save(&watchlist).await?;
        tracing::info!(user_id = %user_id, watchlist_id = %watchlist.id, "Created personal watchlist");
        Ok(watchlist)
    }

    /// Adds the title if absent, removes it if present
    ///
    /// A newly added entry carries the user's existing overall score, if any.
    /// Returns whether the title is on the watchlist afterwards.
    pub async fn toggle(&self, title_id: &str, user_id: Uuid) -> AppResult<bool> {
        validate_title_id(title_id)?;

        let mut watchlist = self.get_or_create(user_id).await?;

        let existing_rating = if watchlist.contains(title_id) {
            None
        } else {
            self.ratings
                .find_by_user_and_title(user_id, title_id)
                .await?
                .map(|rating| rating.overall)
        };

        let added = watchlist.toggle(title_id, existing_rating);
        self.watchlists.save(&watchlist).await?;

        tracing::info!(user_id = %user_id, title_id = %title_id, added, "Toggled watchlist entry");
        Ok(added)
    }

    pub async fn is_present(&self, user_id: Uuid, title_id: &str) -> AppResult<bool> {
        Ok(self
            .watchlists
            .find_by_user(user_id)
            .await?
            .map(|watchlist| watchlist.contains(title_id))
            .unwrap_or(false))
    }

    /// Marks a listed title watched with the given score
    ///
    /// Creates the watchlist if needed; returns false when the title is not listed.
    pub async fn record_rating(&self, user_id: Uuid, title_id: &str, overall: f64) -> AppResult<bool> {
        let mut watchlist = self.get_or_create(user_id).await?;
        if !watchlist.record_rating(title_id, overall) {
            return Ok(false);
        }
        self.watchlists.save(&watchlist).await?;
        Ok(true)
    }
}

pub(crate) fn validate_title_id(title_id: &str) -> AppResult<()> {
    if title_id.trim().is_empty() {
        return Err(AppError::InvalidInput("Title id must not be empty".to_string()));
    }
    Ok(())
}
