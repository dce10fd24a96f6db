use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

use super::advance_timestamp;

/// Whether every member has rated an entry
///
/// This is the only producer of `SharedWatchlistEntry::watched`.
pub fn recompute_watched(members: &BTreeSet<Uuid>, ratings: &HashMap<Uuid, f64>) -> bool {
    members.iter().all(|member| ratings.contains_key(member))
}

/// A title on a shared watchlist with the members' scores
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedWatchlistEntry {
    pub watched: bool,
    pub added_date: DateTime<Utc>,
    pub added_by_username: String,
    #[serde(default)]
    pub ratings: HashMap<Uuid, f64>,
}

/// Group watchlist; the owner is always a member
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharedWatchlist {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub member_ids: BTreeSet<Uuid>,
    #[serde(default)]
    pub movies: HashMap<String, SharedWatchlistEntry>,
    pub last_updated: DateTime<Utc>,
}

/// Fields a client supplies when creating a shared watchlist
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SharedWatchlistDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Additional initial members besides the owner
    #[serde(default)]
    pub member_ids: Vec<Uuid>,
}

/// Mutable metadata of a shared watchlist
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SharedWatchlistPatch {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl SharedWatchlist {
    pub fn new(name: String, description: Option<String>, owner_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            description,
            owner_id,
            member_ids: BTreeSet::from([owner_id]),
            movies: HashMap::new(),
            last_updated: Utc::now(),
        }
    }

    pub fn is_member(&self, user_id: &Uuid) -> bool {
        self.member_ids.contains(user_id)
    }

    pub fn touch(&mut self) {
        self.last_updated = advance_timestamp(self.last_updated);
    }

    /// Re-derives `watched` on every entry from the current member set
    pub fn refresh_watched(&mut self) {
        for entry in self.movies.values_mut() {
            entry.watched = recompute_watched(&self.member_ids, &entry.ratings);
        }
    }

    pub fn apply_patch(&mut self, patch: SharedWatchlistPatch) {
        self.name = patch.name;
        self.description = patch.description;
        self.touch();
    }

    /// Returns false if the user was already a member
    pub fn add_member(&mut self, user_id: Uuid) -> bool {
        if !self.member_ids.insert(user_id) {
            return false;
        }
        self.refresh_watched();
        self.touch();
        true
    }

    /// Rejects removing the owner; returns false if the user was not a member
    pub fn remove_member(&mut self, user_id: &Uuid) -> AppResult<bool> {
        if *user_id == self.owner_id {
            return Err(AppError::InvalidInput(
                "Cannot remove the owner from the watchlist".to_string(),
            ));
        }
        if !self.member_ids.remove(user_id) {
            return Ok(false);
        }
        self.refresh_watched();
        self.touch();
        Ok(true)
    }

    /// Returns false if the title already has an entry
    pub fn add_title(&mut self, title_id: &str, added_by_username: &str) -> bool {
        if self.movies.contains_key(title_id) {
            return false;
        }
        let entry = SharedWatchlistEntry {
            watched: false,
            added_date: Utc::now(),
            added_by_username: added_by_username.to_string(),
            ratings: HashMap::new(),
        };
        self.movies.insert(title_id.to_string(), entry);
        self.touch();
        true
    }

    /// Returns false if the title had no entry
    pub fn remove_title(&mut self, title_id: &str) -> bool {
        if self.movies.remove(title_id).is_none() {
            return false;
        }
        self.touch();
        true
    }

    /// Records a member's score and re-derives the entry's `watched`
    ///
    /// Fails with `NotFound` before touching anything if the title was never added.
    pub fn rate(&mut self, title_id: &str, user_id: Uuid, score: f64) -> AppResult<()> {
        let entry = self.movies.get_mut(title_id).ok_or_else(|| {
            AppError::NotFound(format!("Title {} not found in watchlist", title_id))
        })?;
        entry.ratings.insert(user_id, score);
        entry.watched = recompute_watched(&self.member_ids, &entry.ratings);
        self.touch();
        Ok(())
    }

    /// False for titles without an entry
    pub fn is_fully_rated(&self, title_id: &str) -> bool {
        self.movies
            .get(title_id)
            .map(|entry| recompute_watched(&self.member_ids, &entry.ratings))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_watched_invariant(watchlist: &SharedWatchlist) {
        for entry in watchlist.movies.values() {
            let expected = watchlist
                .member_ids
                .iter()
                .all(|m| entry.ratings.contains_key(m));
            assert_eq!(entry.watched, expected);
        }
    }

    #[test]
    fn test_new_includes_owner() {
        let owner = Uuid::new_v4();
        let watchlist = SharedWatchlist::new("Friday".to_string(), None, owner);
        assert!(watchlist.is_member(&owner));
        assert_eq!(watchlist.member_ids.len(), 1);
        assert!(watchlist.movies.is_empty());
    }

    #[test]
    fn test_recompute_watched() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let members = BTreeSet::from([a, b]);
        let mut ratings = HashMap::new();
        assert!(!recompute_watched(&members, &ratings));
        ratings.insert(a, 7.0);
        assert!(!recompute_watched(&members, &ratings));
        ratings.insert(b, 3.0);
        assert!(recompute_watched(&members, &ratings));
        // Ratings from former members do not matter
        ratings.insert(Uuid::new_v4(), 1.0);
        assert!(recompute_watched(&members, &ratings));
    }

    #[test]
    fn test_member_join_flips_watched() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, a);

        watchlist.add_title("tt001", "alice");
        watchlist.rate("tt001", a, 8.0).unwrap();
        assert!(watchlist.movies["tt001"].watched);

        assert!(watchlist.add_member(b));
        assert!(!watchlist.movies["tt001"].watched);
        assert_watched_invariant(&watchlist);

        watchlist.rate("tt001", b, 6.0).unwrap();
        assert!(watchlist.movies["tt001"].watched);

        watchlist.add_title("tt002", "bob");
        watchlist.rate("tt002", a, 4.0).unwrap();
        assert!(!watchlist.movies["tt002"].watched);

        // Dropping the member who has not rated completes the entry
        assert!(watchlist.remove_member(&b).unwrap());
        assert!(watchlist.movies["tt002"].watched);
        assert_watched_invariant(&watchlist);
    }

    #[test]
    fn test_remove_owner_rejected() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);
        watchlist.add_member(other);

        let err = watchlist.remove_member(&owner).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(watchlist.member_ids, BTreeSet::from([owner, other]));
    }

    #[test]
    fn test_rate_absent_title_fails_without_side_effect() {
        let owner = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);
        let before = watchlist.clone();

        let err = watchlist.rate("tt999", owner, 5.0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(watchlist, before);
    }

    #[test]
    fn test_add_and_remove_title_idempotent() {
        let owner = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);

        assert!(watchlist.add_title("tt001", "alice"));
        watchlist.rate("tt001", owner, 9.0).unwrap();
        assert!(!watchlist.add_title("tt001", "bob"));
        assert_eq!(watchlist.movies["tt001"].added_by_username, "alice");
        assert_eq!(watchlist.movies["tt001"].ratings.len(), 1);

        assert!(watchlist.remove_title("tt001"));
        assert!(!watchlist.remove_title("tt001"));
    }

    #[test]
    fn test_mutations_advance_last_updated() {
        let owner = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);

        let t0 = watchlist.last_updated;
        watchlist.add_title("tt001", "alice");
        let t1 = watchlist.last_updated;
        watchlist.rate("tt001", owner, 5.0).unwrap();
        let t2 = watchlist.last_updated;
        watchlist.apply_patch(SharedWatchlistPatch {
            name: "Renamed".to_string(),
            description: Some("Weekly picks".to_string()),
        });
        let t3 = watchlist.last_updated;

        assert!(t0 < t1 && t1 < t2 && t2 < t3);
        assert_eq!(watchlist.name, "Renamed");
    }

    #[test]
    fn test_is_fully_rated() {
        let owner = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);
        assert!(!watchlist.is_fully_rated("tt001"));
        watchlist.add_title("tt001", "alice");
        assert!(!watchlist.is_fully_rated("tt001"));
        watchlist.rate("tt001", owner, 2.5).unwrap();
        assert!(watchlist.is_fully_rated("tt001"));
    }

    #[test]
    fn test_serde_roundtrip_keeps_member_ratings() {
        let owner = Uuid::new_v4();
        let mut watchlist = SharedWatchlist::new("Club".to_string(), None, owner);
        watchlist.add_title("tt001", "alice");
        watchlist.rate("tt001", owner, 7.0).unwrap();

        let json = serde_json::to_value(&watchlist).unwrap();
        let restored: SharedWatchlist = serde_json::from_value(json).unwrap();
        assert_eq!(restored, watchlist);
    }
}
