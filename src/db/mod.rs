//! Repository traits and their backends
//!
//! Every aggregate is stored as a whole document and saved with upsert
//! semantics. No operation spans more than one document atomically.

use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{PersonalWatchlist, Rating, SharedWatchlist, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{create_pool, run_migrations, PgStore};

/// Identity store
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_all(&self) -> AppResult<Vec<User>>;

    async fn save(&self, user: &User) -> AppResult<()>;

    async fn exists_by_id(&self, id: Uuid) -> AppResult<bool>;

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()>;
}

#[async_trait::async_trait]
pub trait RatingStore: Send + Sync {
    async fn find_by_user_and_title(
        &self,
        user_id: Uuid,
        title_id: &str,
    ) -> AppResult<Option<Rating>>;

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>>;

    async fn save(&self, rating: &Rating) -> AppResult<()>;
}

/// Personal watchlists, one per user
#[async_trait::async_trait]
pub trait WatchlistStore: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PersonalWatchlist>>;

    async fn save(&self, watchlist: &PersonalWatchlist) -> AppResult<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SharedWatchlistStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SharedWatchlist>>;

    /// Shared watchlists whose member set contains `user_id`
    async fn find_by_member(&self, user_id: Uuid) -> AppResult<Vec<SharedWatchlist>>;

    async fn save(&self, watchlist: &SharedWatchlist) -> AppResult<()>;

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// The four stores a running service needs
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub ratings: Arc<dyn RatingStore>,
    pub watchlists: Arc<dyn WatchlistStore>,
    pub shared_watchlists: Arc<dyn SharedWatchlistStore>,
}

impl Stores {
    /// All four stores backed by one in-memory instance
    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    /// All four stores backed by PostgreSQL
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self::from_backend(Arc::new(PgStore::new(pool)))
    }

    fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: UserStore + RatingStore + WatchlistStore + SharedWatchlistStore + 'static,
    {
        Self {
            users: backend.clone(),
            ratings: backend.clone(),
            watchlists: backend.clone(),
            shared_watchlists: backend,
        }
    }
}
