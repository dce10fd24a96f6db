use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A title on a user's personal watchlist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub watched: bool,
    pub added_date: DateTime<Utc>,
    pub rating: Option<f64>,
}

impl WatchlistEntry {
    pub fn new(rating: Option<f64>) -> Self {
        Self {
            watched: false,
            added_date: Utc::now(),
            rating,
        }
    }
}

/// A user's private watchlist, keyed by title id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalWatchlist {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub movies: HashMap<String, WatchlistEntry>,
}

impl PersonalWatchlist {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            movies: HashMap::new(),
        }
    }

    pub fn contains(&self, title_id: &str) -> bool {
        self.movies.contains_key(title_id)
    }

    /// Removes the title if present, otherwise adds an unwatched entry
    ///
    /// Returns true when the title was added.
    pub fn toggle(&mut self, title_id: &str, existing_rating: Option<f64>) -> bool {
        if self.movies.remove(title_id).is_some() {
            return false;
        }
        self.movies
            .insert(title_id.to_string(), WatchlistEntry::new(existing_rating));
        true
    }

    /// Marks a listed title as watched with the given score
    ///
    /// Returns false when the title is not on the watchlist.
    pub fn record_rating(&mut self, title_id: &str, overall: f64) -> bool {
        match self.movies.get_mut(title_id) {
            Some(entry) => {
                entry.rating = Some(overall);
                entry.watched = true;
                true
            }
            None => false,
        }
    }
}
