pub mod accounts;
pub mod rating;
pub mod shared_watchlist;
pub mod watchlist;

pub use accounts::{AccountService, AuthToken};
pub use rating::RatingService;
pub use shared_watchlist::SharedWatchlistService;
pub use watchlist::WatchlistService;
