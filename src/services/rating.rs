use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{RatingStore, SharedWatchlistStore},
    error::AppResult,
    models::{Rating, RatingInput},
};

use super::{watchlist::validate_title_id, WatchlistService};

/// Accepts ratings and fans them out to dependent watchlists
///
/// A submission touches up to three kinds of documents, in this order:
/// 1. the user's personal watchlist entry for the title,
/// 2. every shared watchlist the user belongs to that lists the title,
/// 3. the rating record itself.
///
/// There is no cross-document transaction. A failure in step 2 for one shared
/// watchlist is logged and the remaining ones are still updated; a failure in
/// step 1 or 3 aborts the call, leaving earlier steps applied.
#[derive(Clone)]
pub struct RatingService {
    ratings: Arc<dyn RatingStore>,
    watchlists: WatchlistService,
    shared: Arc<dyn SharedWatchlistStore>,
}

impl RatingService {
    pub fn new(
        ratings: Arc<dyn RatingStore>,
        watchlists: WatchlistService,
        shared: Arc<dyn SharedWatchlistStore>,
    ) -> Self {
        Self {
            ratings,
            watchlists,
            shared,
        }
    }

    pub async fn submit_rating(&self, input: RatingInput, user_id: Uuid) -> AppResult<Rating> {
        validate_title_id(&input.title_id)?;
        input.dimensions.validate()?;
        let overall = input.dimensions.overall();
        let title_id = input.title_id.as_str();

        let on_personal = self
            .watchlists
            .record_rating(user_id, title_id, overall)
            .await?;

        let shared_updated = self.fan_out_to_shared(user_id, title_id, overall).await;

        let rating = match self
            .ratings
            .find_by_user_and_title(user_id, title_id)
            .await?
        {
            Some(mut existing) => {
                existing.apply(input.dimensions);
                existing
            }
            None => Rating::new(user_id, input.title_id.clone(), input.dimensions),
        };
        self.ratings.save(&rating).await?;

        tracing::info!(
            user_id = %user_id,
            title_id = %title_id,
            overall,
            on_personal,
            shared_updated,
            "Rating submitted"
        );
        Ok(rating)
    }

    /// Returns `None` when the user has not rated the title
    pub async fn get_rating(&self, title_id: &str, user_id: Uuid) -> AppResult<Option<Rating>> {
        self.ratings.find_by_user_and_title(user_id, title_id).await
    }

    /// Every rating the user has submitted, most recent first
    pub async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        self.ratings.find_by_user(user_id).await
    }

    /// Best-effort update of shared entries; returns how many watchlists were written
    async fn fan_out_to_shared(&self, user_id: Uuid, title_id: &str, overall: f64) -> usize {
        let memberships = match self.shared.find_by_member(user_id).await {
            Ok(memberships) => memberships,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %user_id, "Failed to load shared watchlists for rating fan-out");
                return 0;
            }
        };

        let mut updated = 0;
        for mut watchlist in memberships {
            if !watchlist.movies.contains_key(title_id) {
                continue;
            }

            let result = match watchlist.rate(title_id, user_id, overall) {
                Ok(()) => self.shared.save(&watchlist).await,
                Err(e) => Err(e),
            };

            match result {
                Ok(()) => updated += 1,
                Err(e) => tracing::warn!(
                    error = %e,
                    watchlist_id = %watchlist.id,
                    title_id = %title_id,
                    "Failed to propagate rating to shared watchlist"
                ),
            }
        }
        updated
    }
}
