use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{PersonalWatchlist, Rating, SharedWatchlist, User},
};

use super::{RatingStore, SharedWatchlistStore, UserStore, WatchlistStore};

/// Process-local store used in tests and for running without a database
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    ratings: HashMap<Uuid, Rating>,
    /// Keyed by owning user id
    watchlists: HashMap<Uuid, PersonalWatchlist>,
    shared_watchlists: HashMap<Uuid, SharedWatchlist>,
}

impl MemoryStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn exists_by_id(&self, id: Uuid) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.users.contains_key(&id))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.users.remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl RatingStore for MemoryStore {
    async fn find_by_user_and_title(
        &self,
        user_id: Uuid,
        title_id: &str,
    ) -> AppResult<Option<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner
            .ratings
            .values()
            .find(|rating| rating.user_id == user_id && rating.title_id == title_id)
            .cloned())
    }

    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        let mut ratings: Vec<Rating> = inner
            .ratings
            .values()
            .filter(|rating| rating.user_id == user_id)
            .cloned()
            .collect();
        ratings.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        Ok(ratings)
    }

    async fn save(&self, rating: &Rating) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.ratings.insert(rating.id, rating.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl WatchlistStore for MemoryStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<PersonalWatchlist>> {
        let inner = self.inner.read().await;
        Ok(inner.watchlists.get(&user_id).cloned())
    }

    async fn save(&self, watchlist: &PersonalWatchlist) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.watchlists.insert(watchlist.user_id, watchlist.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl SharedWatchlistStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<SharedWatchlist>> {
        let inner = self.inner.read().await;
        Ok(inner.shared_watchlists.get(&id).cloned())
    }

    async fn find_by_member(&self, user_id: Uuid) -> AppResult<Vec<SharedWatchlist>> {
        let inner = self.inner.read().await;
        Ok(inner
            .shared_watchlists
            .values()
            .filter(|watchlist| watchlist.is_member(&user_id))
            .cloned()
            .collect())
    }

    async fn save(&self, watchlist: &SharedWatchlist) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .shared_watchlists
            .insert(watchlist.id, watchlist.clone());
        Ok(())
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.shared_watchlists.remove(&id);
        Ok(())
    }
}
