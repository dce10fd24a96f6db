use chrono::{DateTime, Duration, Utc};

pub mod rating;
pub mod shared_watchlist;
pub mod user;
pub mod watchlist;

pub use rating::{Rating, RatingDimensions, RatingInput, MAX_SCORE, MIN_SCORE};
pub use shared_watchlist::{
    recompute_watched, SharedWatchlist, SharedWatchlistDraft, SharedWatchlistEntry,
    SharedWatchlistPatch,
};
pub use user::{normalize_username, Role, User, UserView};
pub use watchlist::{PersonalWatchlist, WatchlistEntry};

/// Returns a timestamp strictly later than `previous`
///
/// Normally the wall clock; when the clock has not moved past `previous`
/// (coarse clocks, back-to-back writes) the previous stamp plus one microsecond.
pub fn advance_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_timestamp_from_past() {
        let past = Utc::now() - Duration::hours(1);
        assert!(advance_timestamp(past) > past);
    }

    #[test]
    fn test_advance_timestamp_from_future() {
        let future = Utc::now() + Duration::hours(1);
        assert_eq!(advance_timestamp(future), future + Duration::microseconds(1));
    }
}
